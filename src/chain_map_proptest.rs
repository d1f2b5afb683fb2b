// Property tests for ChainMap kept inside the crate so they can check
// structural invariants that are not part of the public API.

use crate::codec::{binary, text, DecodeLimits};
use crate::{ChainMap, Digest, Fnv1a, MAX_LOAD_FACTOR};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeMap, BTreeSet, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    BinaryRoundTrip,
    TextRoundTrip,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<OpI>)> {
    let pool = proptest::collection::vec("[a-z ]{0,5}", 1..=12);
    (1usize..=4, pool).prop_flat_map(|(capacity, pool)| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![contains_pool, "[a-z ]{0,5}"].prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::BinaryRoundTrip),
            1 => Just(OpI::TextRoundTrip),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (capacity, pool.clone(), ops))
    })
}

fn contents<D: Digest>(m: &ChainMap<D>) -> BTreeMap<String, i32> {
    m.iter().map(|(k, v)| (k.to_owned(), v)).collect()
}

// State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - insert returns the previous value and overwrites in place.
// - remove returns the stored value; absent keys are a no-op.
// - find/get/contains_key parity with the model.
// - iteration yields each live entry exactly once.
// - both codecs round-trip the exact contents and capacity.
// - after each op: len parity, every node in its digest bucket, no
//   duplicates, and growth kept the load factor within one entry of 0.75.
fn run_scenario<D: Digest + Clone>(
    mut sut: ChainMap<D>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, i32> = HashMap::new();
    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = &pool[i];
                let before = sut.capacity();
                let grows = sut.len() as f64 >= before as f64 * MAX_LOAD_FACTOR;
                prop_assert_eq!(sut.insert(k.clone(), v), model.insert(k.clone(), v));
                let expected = if grows { before * 2 } else { before };
                prop_assert_eq!(sut.capacity(), expected);
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                let cap = sut.capacity();
                prop_assert_eq!(sut.remove(k), model.remove(k));
                prop_assert_eq!(sut.capacity(), cap, "remove never shrinks");
                prop_assert!(!sut.contains_key(k));
            }
            OpI::Find(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.find(k).ok(), model.get(k).copied());
                prop_assert_eq!(sut.get(k), model.get(k).copied());
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(&s), model.contains_key(&s));
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                match (sut.get_mut(k), model.get_mut(k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    _ => prop_assert!(false, "get_mut presence diverged for {:?}", k),
                }
            }
            OpI::Iterate => {
                let s_keys: Vec<&str> = sut.keys().collect();
                prop_assert_eq!(s_keys.len(), model.len());
                let s_set: BTreeSet<&str> = s_keys.iter().copied().collect();
                prop_assert_eq!(s_set.len(), s_keys.len(), "keys yielded once");
                let m_set: BTreeSet<&str> = model.keys().map(String::as_str).collect();
                prop_assert_eq!(s_set, m_set);
            }
            OpI::BinaryRoundTrip => {
                let mut buf = Vec::new();
                binary::encode(&sut, &mut buf).map_err(|e| TestCaseError::fail(e.to_string()))?;
                let back = binary::decode(&buf[..], sut.digest().clone(), &DecodeLimits::default())
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(back.capacity(), sut.capacity());
                prop_assert_eq!(contents(&back), contents(&sut));
                back.assert_invariants();
            }
            OpI::TextRoundTrip => {
                let mut buf = Vec::new();
                text::encode(&sut, &mut buf).map_err(|e| TestCaseError::fail(e.to_string()))?;
                let back = text::decode(&buf[..], sut.digest().clone(), &DecodeLimits::default())
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(back.capacity(), sut.capacity());
                prop_assert_eq!(contents(&back), contents(&sut));
                back.assert_invariants();
            }
        }

        // Post-conditions after each op
        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.len() as f64 <= sut.capacity() as f64 * MAX_LOAD_FACTOR + 1.0);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((capacity, pool, ops) in arb_scenario()) {
        run_scenario(ChainMap::with_digest(capacity, Fnv1a), &pool, ops)?;
    }
}

// Collision variant: every key digests to the same value, so all entries
// share one chain regardless of capacity.
#[derive(Clone, Default)]
struct ConstDigest;
impl Digest for ConstDigest {
    fn digest(&self, _key: &[u8]) -> u32 {
        0
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior. This stresses chain scans, head/interior unlinking and
// relinking during growth.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((capacity, pool, ops) in arb_scenario()) {
        run_scenario(ChainMap::with_digest(capacity, ConstDigest), &pool, ops)?;
    }
}
