// Public-API property tests: construction, copy, and ordering contracts,
// checked against plain std collections as the model.

use bucketmap::BucketMap;
use proptest::prelude::*;
use std::collections::HashMap;

fn arb_pairs() -> impl Strategy<Value = Vec<(String, i32)>> {
    proptest::collection::vec(("[a-d]{0,3}", any::<i32>()), 0..40)
}

proptest! {
    // Property: FromIterator applies first-write-wins in sequence order, and
    // traversal order is the reverse of first-occurrence order.
    #[test]
    fn prop_from_iter_first_write_wins(pairs in arb_pairs()) {
        let m: BucketMap<String, i32> = pairs.clone().into_iter().collect();

        let mut first: HashMap<String, i32> = HashMap::new();
        let mut order: Vec<String> = Vec::new(); // first occurrence, oldest first
        for (k, v) in &pairs {
            if !first.contains_key(k) {
                first.insert(k.clone(), *v);
                order.push(k.clone());
            }
        }

        prop_assert_eq!(m.len(), first.len());
        for (k, v) in &first {
            prop_assert_eq!(m.at(k.as_str()), Ok(v));
        }

        let traversed: Vec<String> = m.keys().cloned().collect();
        let expected: Vec<String> = order.iter().rev().cloned().collect();
        prop_assert_eq!(traversed, expected);
    }

    // Property: a clone equals its source pair-for-pair (same order) and the
    // two evolve independently afterwards.
    #[test]
    fn prop_clone_snapshot_and_independence(
        pairs in arb_pairs(),
        removals in proptest::collection::vec("[a-d]{0,3}", 0..10),
    ) {
        let src: BucketMap<String, i32> = pairs.into_iter().collect();
        let snapshot: Vec<(String, i32)> =
            src.iter().map(|(_, k, v)| (k.clone(), *v)).collect();

        let mut dst = src.clone();
        let dst_pairs: Vec<(String, i32)> =
            dst.iter().map(|(_, k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(&dst_pairs, &snapshot);

        for k in &removals {
            dst.remove(k.as_str());
        }
        for (_, _, v) in dst.iter_mut() {
            *v = v.wrapping_add(1);
        }

        // Source still matches the snapshot taken at clone time.
        let src_pairs: Vec<(String, i32)> =
            src.iter().map(|(_, k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(src_pairs, snapshot);
    }

    // Property: erase is idempotent; erasing twice equals erasing once.
    #[test]
    fn prop_erase_idempotent(pairs in arb_pairs(), victim in "[a-d]{0,3}") {
        let mut m: BucketMap<String, i32> = pairs.into_iter().collect();

        let first = m.remove(victim.as_str());
        let after_once: Vec<(String, i32)> =
            m.iter().map(|(_, k, v)| (k.clone(), *v)).collect();

        let second = m.remove(victim.as_str());
        prop_assert!(second.is_none());
        if first.is_none() {
            prop_assert!(!after_once.iter().any(|(k, _)| k == &victim));
        }
        let after_twice: Vec<(String, i32)> =
            m.iter().map(|(_, k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(after_once, after_twice);
    }

    // Property: capacity-1 maps agree with default-capacity maps on every
    // observable outcome, so bucket routing never affects semantics.
    #[test]
    fn prop_capacity_does_not_change_semantics(pairs in arb_pairs()) {
        let wide: BucketMap<String, i32> = pairs.clone().into_iter().collect();
        let mut narrow: BucketMap<String, i32> = BucketMap::with_capacity(1);
        narrow.extend(pairs);

        prop_assert_eq!(narrow.len(), wide.len());
        let wide_pairs: Vec<(String, i32)> =
            wide.iter().map(|(_, k, v)| (k.clone(), *v)).collect();
        let narrow_pairs: Vec<(String, i32)> =
            narrow.iter().map(|(_, k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(wide_pairs, narrow_pairs);
    }
}
