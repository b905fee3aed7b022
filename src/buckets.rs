//! Fixed bucket table: the routing and collision-resolution layer.
//!
//! A construction-time number of buckets, each a vec of entry-store keys for
//! the entries whose hash lands there. The table never resizes; once the live
//! entry count approaches the bucket count, bucket scans degrade toward O(n).
//! That trade is deliberate and documented on the public type.
//!
//! The table never looks at map keys itself. Probing takes the hash plus an
//! equality closure, so hash collisions between distinct keys are always
//! disambiguated by the caller's `Eq`.

use slotmap::DefaultKey;

pub(crate) struct BucketTable {
    buckets: Box<[Vec<DefaultKey>]>,
}

impl BucketTable {
    /// Panics if `capacity` is zero; the mod-index needs at least one bucket.
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "bucket capacity must be non-zero");
        Self {
            buckets: (0..capacity).map(|_| Vec::new()).collect(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn bucket_of(&self, hash: u64) -> usize {
        // capacity <= usize::MAX, so the remainder always fits.
        (hash % self.buckets.len() as u64) as usize
    }

    /// Scan the one bucket for `hash`, returning the first key the equality
    /// probe accepts.
    pub(crate) fn find(&self, hash: u64, mut eq: impl FnMut(DefaultKey) -> bool) -> Option<DefaultKey> {
        self.buckets[self.bucket_of(hash)]
            .iter()
            .copied()
            .find(|&k| eq(k))
    }

    /// Append `k` to the bucket for `hash`. The caller has already ruled out a
    /// duplicate key via `find`.
    pub(crate) fn add(&mut self, hash: u64, k: DefaultKey) {
        let b = self.bucket_of(hash);
        self.buckets[b].push(k);
    }

    /// Drop `k` from the bucket for `hash`. Returns whether it was present.
    pub(crate) fn remove(&mut self, hash: u64, k: DefaultKey) -> bool {
        let b = self.bucket_of(hash);
        let bucket = &mut self.buckets[b];
        match bucket.iter().position(|&c| c == k) {
            Some(pos) => {
                bucket.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Empty every bucket, keeping the allocations for reuse.
    pub(crate) fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            bucket.clear();
        }
    }

    /// Every (bucket index, key) pair in the table; invariant checks only.
    #[cfg(test)]
    pub(crate) fn refs(&self) -> impl Iterator<Item = (usize, DefaultKey)> + '_ {
        self.buckets
            .iter()
            .enumerate()
            .flat_map(|(b, bucket)| bucket.iter().map(move |&k| (b, k)))
    }

    #[cfg(test)]
    pub(crate) fn total_refs(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::BucketTable;
    use slotmap::{DefaultKey, SlotMap};

    fn keys(n: usize) -> Vec<DefaultKey> {
        let mut sm: SlotMap<DefaultKey, ()> = SlotMap::new();
        (0..n).map(|_| sm.insert(())).collect()
    }

    #[test]
    fn routes_by_hash_mod_capacity() {
        let t = BucketTable::new(8);
        assert_eq!(t.bucket_of(0), 0);
        assert_eq!(t.bucket_of(13), 5);
        assert_eq!(t.bucket_of(u64::MAX), (u64::MAX % 8) as usize);
    }

    #[test]
    fn add_find_remove_in_one_bucket() {
        let ks = keys(3);
        let mut t = BucketTable::new(4);
        // All three land in bucket 1.
        for &k in &ks {
            t.add(9, k);
        }
        assert_eq!(t.total_refs(), 3);

        // Probe resolves by the caller's equality, not position.
        assert_eq!(t.find(9, |k| k == ks[1]), Some(ks[1]));
        assert_eq!(t.find(9, |_| false), None);
        // Different residue routes to a different, empty bucket.
        assert_eq!(t.find(8, |_| true), None);

        assert!(t.remove(9, ks[1]));
        assert!(!t.remove(9, ks[1]));
        assert_eq!(t.find(9, |k| k == ks[1]), None);
        assert_eq!(t.total_refs(), 2);
    }

    #[test]
    fn clear_empties_every_bucket() {
        let ks = keys(5);
        let mut t = BucketTable::new(2);
        for (i, &k) in ks.iter().enumerate() {
            t.add(i as u64, k);
        }
        assert_eq!(t.total_refs(), 5);
        t.clear();
        assert_eq!(t.total_refs(), 0);
        assert_eq!(t.capacity(), 2);
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn zero_capacity_rejected() {
        let _ = BucketTable::new(0);
    }
}
