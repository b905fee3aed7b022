//! BucketMap: the public container coordinating the entry store and the
//! fixed bucket table.

use crate::buckets::BucketTable;
use crate::order::{self, OrderedSlots};
use crate::reentrancy::ReentryFlag;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use slotmap::DefaultKey;
use std::collections::hash_map::RandomState;

/// Bucket count used by the capacity-less constructors. Large enough that
/// bucket scans stay short until the map holds hundreds of thousands of
/// entries.
pub const DEFAULT_CAPACITY: usize = 500_000;

/// Stable reference to one entry.
///
/// A handle stays valid until its entry is removed or the map is cleared or
/// dropped; mutations targeting other entries never disturb it. Handles are
/// generational: once the entry is gone the handle resolves to `None` forever,
/// even if its storage slot is reused for a later insert.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }

    pub(crate) fn raw(&self) -> DefaultKey {
        self.0
    }

    pub fn key<'a, K, V, S>(&self, map: &'a BucketMap<K, V, S>) -> Option<&'a K> {
        map.handle_key(*self)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a BucketMap<K, V, S>) -> Option<&'a V> {
        map.handle_value(*self)
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut BucketMap<K, V, S>) -> Option<&'a mut V> {
        map.handle_value_mut(*self)
    }
}

/// The key was absent. Returned only by [`BucketMap::at`]; every other
/// operation treats an absent key as a defined non-error outcome.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct KeyNotFound;

impl fmt::Display for KeyNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key not found")
    }
}

impl std::error::Error for KeyNotFound {}

/// An insertion-ordered hash map with a fixed bucket table.
///
/// Keys are unique and values mutable. Iteration walks entries most recently
/// inserted first; that order is part of the contract. [`insert`] is
/// first-write-wins: a value already stored for a key is never overwritten.
/// Lookups hand out [`Handle`]s that remain valid across unrelated mutations.
///
/// The bucket count is fixed at construction and the table never rehashes.
/// While the entry count stays well below the bucket count, operations average
/// O(1); past that, bucket scans degrade toward O(n). That is an accepted
/// property of the design, not a defect; pick the capacity accordingly.
///
/// Single-threaded by design: the map is `!Send` and `!Sync`, and there is no
/// internal locking.
///
/// [`insert`]: BucketMap::insert
pub struct BucketMap<K, V, S = RandomState> {
    hasher: S,
    order: OrderedSlots<K, V>,
    table: BucketTable,
    reentry: ReentryFlag,
}

impl<K, V> BucketMap<K, V> {
    /// Empty map with [`DEFAULT_CAPACITY`] buckets and a random default
    /// hasher.
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, RandomState::new())
    }

    /// Empty map with `capacity` buckets. Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, V> Default for BucketMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> BucketMap<K, V, S>
where
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    /// Empty map with `capacity` buckets and the given hash adapter. The
    /// capacity never changes afterwards. Panics if `capacity` is zero.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            order: OrderedSlots::new(),
            table: BucketTable::new(capacity),
            reentry: ReentryFlag::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }
}

impl<K, V, S> BucketMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    // One bucket scan; collisions between distinct keys are resolved by `Eq`.
    fn lookup<Q>(&self, hash: u64, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.table.find(hash, |k| {
            self.order
                .get(k)
                .map(|n| n.key.borrow() == q)
                .unwrap_or(false)
        })
    }

    /// Insert `(key, value)` and return the entry's handle.
    ///
    /// First write wins: if the key is already present, the stored value is
    /// left untouched, `value` is dropped, and the existing entry's handle is
    /// returned. A fresh entry becomes the front of the iteration order.
    pub fn insert(&mut self, key: K, value: V) -> Handle {
        let _g = self.reentry.arm();
        let hash = self.make_hash(&key);
        if let Some(k) = self.lookup(hash, &key) {
            return Handle::new(k);
        }
        let k = self.order.push_front(key, value, hash);
        self.table.add(hash, k);
        Handle::new(k)
    }

    /// Remove the entry for `q`, returning its pair. `None` if the key is
    /// absent; removing an absent key is a no-op, not an error. Handles to
    /// other entries are unaffected.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentry.arm();
        let hash = self.make_hash(q);
        let k = self.lookup(hash, q)?;
        self.table.remove(hash, k);
        self.order.remove(k).map(|n| (n.key, n.value))
    }

    /// Handle of the entry for `q`, or `None` if absent.
    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentry.arm();
        let hash = self.make_hash(q);
        self.lookup(hash, q).map(Handle::new)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentry.arm();
        let hash = self.make_hash(q);
        self.lookup(hash, q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentry.arm();
        let hash = self.make_hash(q);
        let k = self.lookup(hash, q)?;
        self.order.get(k).map(|n| &n.value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentry.arm();
        let hash = self.make_hash(q);
        let k = self.lookup(hash, q)?;
        self.order.get_mut(k).map(|n| &mut n.value)
    }

    /// Read the value for `q`, or fail with [`KeyNotFound`]. The one fallible
    /// accessor in the crate.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(KeyNotFound)
    }

    /// Mutable access to the value for `key`, inserting `default()` first if
    /// the key is absent. The closure runs only on actual insertion.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentry.arm();
        let hash = self.make_hash(&key);
        let k = match self.lookup(hash, &key) {
            Some(k) => k,
            None => {
                let value = default();
                let k = self.order.push_front(key, value, hash);
                self.table.add(hash, k);
                k
            }
        };
        match self.order.get_mut(k) {
            Some(n) => &mut n.value,
            None => unreachable!("just-resolved entry must be live"),
        }
    }

    /// Operator-index semantics: absence is resolved by inserting
    /// `V::default()`, never by an error.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }
}

impl<K, V, S> BucketMap<K, V, S> {
    /// Live entry count. O(1), backed by the entry store's counter.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of buckets, fixed since construction.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// The hash adapter this map was constructed with.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Remove every entry. The hash adapter, the capacity, and the bucket
    /// allocations are all retained; outstanding handles are invalidated.
    pub fn clear(&mut self) {
        let _g = self.reentry.arm();
        self.table.clear();
        self.order.clear();
    }

    /// Remove the entry a handle points at, returning its pair. `None` for
    /// stale handles.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<(K, V)> {
        let _g = self.reentry.arm();
        let k = handle.raw();
        let hash = self.order.get(k)?.hash;
        self.table.remove(hash, k);
        self.order.remove(k).map(|n| (n.key, n.value))
    }

    /// Entries most recently inserted first, with their handles.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.order.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.order.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(_, k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, _, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.iter_mut().map(|(_, _, v)| v)
    }

    pub(crate) fn handle_key(&self, h: Handle) -> Option<&K> {
        let _g = self.reentry.arm();
        self.order.get(h.raw()).map(|n| &n.key)
    }

    pub(crate) fn handle_value(&self, h: Handle) -> Option<&V> {
        let _g = self.reentry.arm();
        self.order.get(h.raw()).map(|n| &n.value)
    }

    pub(crate) fn handle_value_mut(&mut self, h: Handle) -> Option<&mut V> {
        let _g = self.reentry.arm();
        self.order.get_mut(h.raw()).map(|n| &mut n.value)
    }

    /// Structural consistency: store length == bucket reference count, every
    /// bucket reference resolves to a live entry sitting in the bucket for its
    /// hash, exactly one reference per entry, and the order list threads every
    /// entry.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        use std::collections::HashSet;

        assert_eq!(
            self.order.len(),
            self.table.total_refs(),
            "store length and bucket reference count must agree"
        );
        let mut seen = HashSet::new();
        for (b, k) in self.table.refs() {
            let node = self
                .order
                .get(k)
                .expect("bucket reference must resolve to a live entry");
            assert_eq!(
                self.table.bucket_of(node.hash),
                b,
                "entry must sit in the bucket for its hash"
            );
            assert!(seen.insert(k), "exactly one bucket reference per entry");
        }
        assert_eq!(
            self.iter().count(),
            self.order.len(),
            "order list must thread every entry"
        );
    }
}

impl<K: Clone, V: Clone, S> BucketMap<K, V, S> {
    // Walk the source oldest-first so repeated push_front reproduces its
    // order. Cached hashes are reused: the clone shares the source's hasher
    // and capacity, so bucket routing is identical and `K: Hash` is never
    // re-invoked.
    fn copy_entries_from(&mut self, source: &Self) {
        for node in source.order.iter_from_back() {
            let k = self
                .order
                .push_front(node.key.clone(), node.value.clone(), node.hash);
            self.table.add(node.hash, k);
        }
    }
}

/// Deep copy: an independent map with the same entries in the same order, the
/// same capacity, and a copy of the hash adapter. Mutating either side never
/// affects the other. `clone_from` additionally reuses the destination's
/// bucket allocations when capacities match.
impl<K: Clone, V: Clone, S: Clone> Clone for BucketMap<K, V, S> {
    fn clone(&self) -> Self {
        let mut dst = Self {
            hasher: self.hasher.clone(),
            order: OrderedSlots::new(),
            table: BucketTable::new(self.table.capacity()),
            reentry: ReentryFlag::new(),
        };
        dst.copy_entries_from(self);
        dst
    }

    fn clone_from(&mut self, source: &Self) {
        self.hasher = source.hasher.clone();
        if self.table.capacity() == source.table.capacity() {
            self.table.clear();
        } else {
            self.table = BucketTable::new(source.table.capacity());
        }
        self.order.clear();
        self.copy_entries_from(source);
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for BucketMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(_, k, v)| (k, v)))
            .finish()
    }
}

/// Read-only index sugar. Panics if the key is absent; use [`BucketMap::at`]
/// or [`BucketMap::get`] for fallible access.
impl<K, V, S, Q> Index<&Q> for BucketMap<K, V, S>
where
    K: Borrow<Q> + Eq + Hash,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    fn index(&self, q: &Q) -> &V {
        match self.get(q) {
            Some(v) => v,
            None => panic!("bucketmap: no entry found for key"),
        }
    }
}

/// Builds from an ordered sequence of pairs, inserting each in sequence order
/// under the first-write-wins policy: for duplicate keys the earliest pair in
/// the sequence is the one kept.
impl<K, V, S> FromIterator<(K, V)> for BucketMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default());
        map.extend(iter);
        map
    }
}

/// Literal-list construction; delegates to the sequence path.
impl<K, V, const N: usize> From<[(K, V); N]> for BucketMap<K, V>
where
    K: Eq + Hash,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_iter(pairs)
    }
}

/// Inserts each pair in order; existing keys keep their stored value.
impl<K, V, S> Extend<(K, V)> for BucketMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// Iterator over `(Handle, &K, &V)`, most recently inserted first.
pub struct Iter<'a, K, V> {
    inner: order::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Handle, &'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, key, value)| (Handle::new(k), key, value))
    }
}

/// Iterator over `(Handle, &K, &mut V)`, most recently inserted first.
pub struct IterMut<'a, K, V> {
    inner: order::IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (Handle, &'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, key, value)| (Handle::new(k), key, value))
    }
}

/// Owning iterator over `(K, V)`, most recently inserted first.
pub struct IntoIter<K, V> {
    inner: order::IntoPairs<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for BucketMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.order.into_pairs(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a BucketMap<K, V, S> {
    type Item = (Handle, &'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut BucketMap<K, V, S> {
    type Item = (Handle, &'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
