#![cfg(test)]

// Property tests for BucketMap kept inside the crate so they can call the
// internals-aware invariant checks after every step.

use crate::map::{BucketMap, Handle};
use proptest::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, the pool shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Find(usize),
    Contains(String),
    At(usize),
    OrInsert(usize, i32),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            8 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            4 => idx.clone().prop_map(OpI::Remove),
            3 => idx.clone().prop_map(OpI::Find),
            2 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            2 => idx.clone().prop_map(OpI::At),
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::OrInsert(i, v)),
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            2 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// The reference model: value map plus the expected most-recent-first key
// order, maintained side by side with the map under test.
struct Model {
    values: HashMap<Key, i32>,
    order: Vec<Key>, // front = most recently inserted
}

impl Model {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn insert_first_wins(&mut self, k: Key, v: i32) -> bool {
        if self.values.contains_key(&k) {
            return false;
        }
        self.values.insert(k.clone(), v);
        self.order.insert(0, k);
        true
    }

    fn remove(&mut self, k: &Key) -> Option<i32> {
        let v = self.values.remove(k)?;
        self.order.retain(|c| c != k);
        Some(v)
    }

    fn clear(&mut self) {
        self.values.clear();
        self.order.clear();
    }
}

fn run_scenario<S>(sut: &mut BucketMap<Key, i32, S>, pool: &[String], ops: Vec<OpI>) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model = Model::new();
    let mut live: HashMap<Key, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let inserted = model.insert_first_wins(k.clone(), v);
                let h = sut.insert(k.clone(), v);
                if inserted {
                    let prev = live.insert(k, h);
                    prop_assert!(prev.is_none());
                } else {
                    // First write wins: same handle, untouched value.
                    prop_assert_eq!(Some(&h), live.get(&k));
                    prop_assert_eq!(sut.get(&k), model.values.get(&k));
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                match model.remove(&k) {
                    Some(mv) => {
                        let (kk, vv) = sut.remove(&k).expect("model says present");
                        prop_assert!(kk == k);
                        prop_assert_eq!(vv, mv);
                        let h = live.remove(&k).expect("tracked live handle");
                        stale.push(h);
                    }
                    None => {
                        prop_assert!(sut.remove(&k).is_none(), "absent remove is a no-op");
                    }
                }
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                let found = sut.find(&k);
                prop_assert_eq!(found.is_some(), model.values.contains_key(&k));
                if let Some(h) = found {
                    prop_assert_eq!(Some(&h), live.get(&k), "handle is stable across lookups");
                }
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.values.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::At(i) => {
                let k = key_from(pool, i);
                match model.values.get(&k) {
                    Some(mv) => prop_assert_eq!(sut.at(&k), Ok(mv)),
                    None => prop_assert!(sut.at(&k).is_err()),
                }
            }
            OpI::OrInsert(i, v) => {
                let k = key_from(pool, i);
                let inserted = model.insert_first_wins(k.clone(), v);
                let got = *sut.get_or_insert_with(k.clone(), || v);
                prop_assert_eq!(got, model.values[&k], "present key keeps its value");
                if inserted {
                    let h = sut.find(&k).expect("just inserted");
                    live.insert(k, h);
                }
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(&h) = live.get(&k) {
                    let vr = h.value_mut(sut).expect("live handle resolves");
                    *vr = vr.saturating_add(d);
                    let mv = model.values.get_mut(&k).expect("present in model");
                    *mv = mv.saturating_add(d);
                } else {
                    prop_assert!(sut.get_mut(&k).is_none());
                }
            }
            OpI::Iterate => {
                let sut_pairs: Vec<(Key, i32)> =
                    sut.iter().map(|(_, k, v)| (k.clone(), *v)).collect();
                let model_pairs: Vec<(Key, i32)> = model
                    .order
                    .iter()
                    .map(|k| (k.clone(), model.values[k]))
                    .collect();
                prop_assert_eq!(sut_pairs, model_pairs, "most-recent-first order");
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                stale.extend(live.drain().map(|(_, h)| h));
            }
        }

        // Post-conditions after every op.
        for &h in &stale {
            prop_assert!(h.value(sut).is_none(), "stale handles never resolve");
        }
        for (k, &h) in &live {
            prop_assert_eq!(h.value(sut), model.values.get(k), "live handles track values");
        }
        prop_assert_eq!(sut.len(), model.values.len());
        prop_assert_eq!(sut.is_empty(), model.values.is_empty());
        sut.check_invariants();
    }
    Ok(())
}

// Property: state-machine equivalence against a HashMap plus an explicit
// order model, with full structural invariants after each step.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: BucketMap<Key, i32> = BucketMap::with_capacity(128);
        run_scenario(&mut sut, &pool, ops)?;
    }
}

// Property: the same invariants with a single bucket, so every key collides
// and resolution rests entirely on key equality.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_single_bucket((pool, ops) in arb_scenario()) {
        let mut sut: BucketMap<Key, i32> = BucketMap::with_capacity(1);
        run_scenario(&mut sut, &pool, ops)?;
    }
}

// Collision variant with a constant hasher: distinct keys, one hash value.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_const_hasher((pool, ops) in arb_scenario()) {
        let mut sut: BucketMap<Key, i32, ConstBuildHasher> =
            BucketMap::with_capacity_and_hasher(64, ConstBuildHasher);
        run_scenario(&mut sut, &pool, ops)?;
    }
}
