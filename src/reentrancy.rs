//! Debug-only reentry check.
//!
//! The map runs user code (`K: Eq`, `K: Hash`) while probing buckets, at which
//! point its two internal structures may be mid-update. Calling back into the
//! same map from that user code would observe an inconsistent view, so in
//! debug builds each public operation arms a flag and panics on nested entry.
//! Release builds compile the whole check to nothing.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-map reentry flag. Guard each public entry point with
/// `let _g = self.reentry.arm();`.
pub(crate) struct ReentryFlag {
    #[cfg(debug_assertions)]
    entered: Cell<bool>,
    // The raw-pointer marker keeps the owning map !Send + !Sync, matching the
    // single-threaded contract.
    _not_send: PhantomData<*mut ()>,
}

impl ReentryFlag {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            entered: Cell::new(false),
            _not_send: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn arm(&self) -> ReentryToken<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.entered.replace(true),
                "reentrant call into the map from key Eq/Hash code"
            );
            ReentryToken { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ReentryToken { _life: PhantomData }
        }
    }
}

/// RAII token disarming the flag on drop.
pub(crate) struct ReentryToken<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ReentryFlag,
    #[cfg(not(debug_assertions))]
    _life: PhantomData<&'a ()>,
}

impl Drop for ReentryToken<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.entered.set(false);
    }
}
