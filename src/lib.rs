//! bucketmap: a single-threaded, insertion-ordered hash map with a fixed
//! bucket table and stable entry handles.
//!
//! Internal design:
//!
//! Summary
//! - Goal: keep two structures mutually consistent in safe, separately
//!   verifiable layers.
//! - Layers:
//!   - OrderedSlots<K, V>: the entry store. A slot arena (generational keys,
//!     free-list slot reuse) with an intrusive doubly linked list threaded
//!     through the nodes. Prepend and unlink are O(1); removing one entry
//!     never relocates or invalidates another.
//!   - BucketTable: the routing layer. A construction-time number of buckets,
//!     each a list of arena keys; an entry lives in bucket `hash % capacity`.
//!     Probing takes the hash plus an equality closure, so the table itself
//!     never touches keys.
//!   - BucketMap<K, V, S>: the public façade coordinating both, plus `Handle`
//!     (stable reference) and `KeyNotFound` (the one recoverable error).
//!
//! Contract highlights
//! - Iteration order is most-recently-inserted first and is observable API,
//!   not an implementation detail.
//! - `insert` is first-write-wins: duplicate keys never overwrite the stored
//!   value.
//! - Handles are generational: a stale handle resolves to `None` forever and
//!   cannot alias a later entry in a reused slot.
//! - The bucket table never resizes. Performance degrades gracefully toward
//!   O(n) per operation as the entry count approaches the bucket count; choose
//!   the capacity at construction.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` by design (no atomics, no locks).
//! - Each entry caches its `u64` hash at insertion; `K: Hash` is never
//!   invoked again for a stored entry, including during clone.
//! - The map runs user code only via `K: Eq`/`K: Hash` while probing and via
//!   the `get_or_insert_with` closure; a debug-only reentry check panics on
//!   nested entry from that code while internals may be inconsistent.
//!
//! Error model
//! - Exactly one recoverable error: `KeyNotFound`, from `at`. Erase, find,
//!   and contains treat absent keys as defined non-error outcomes, and
//!   `get_or_insert_*` resolves absence by insertion.

mod buckets;
mod map;
mod map_proptest;
mod order;
mod reentrancy;

// Public surface
pub use map::{BucketMap, Handle, IntoIter, Iter, IterMut, KeyNotFound, DEFAULT_CAPACITY};
