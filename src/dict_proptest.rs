#![cfg(test)]

// Property tests for Dict kept inside the crate so they can check the
// structural invariants of the private tables after every operation.

use crate::dict_type::{BytesType, DictType};
use crate::error::DictError;
use crate::{Dict, Replaced};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations so shrinking moves towards earlier keys, shorter
// pools and shorter op lists.
#[derive(Clone, Debug)]
enum OpI {
    Add(usize, i32),
    Replace(usize, i32),
    Remove(usize),
    Unlink(usize),
    Find(usize),
    Rehash(usize),
    Expand(usize),
    Resize,
    Iterate,
    SafeRemoveEven,
    Scan,
    Sample(usize),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Vec<u8>>, Vec<OpI>)> {
    proptest::collection::btree_set("[a-z]{0,5}", 1..=40).prop_flat_map(|pool| {
        let pool: Vec<Vec<u8>> = pool.into_iter().map(String::into_bytes).collect();
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Add(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Replace(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::Unlink),
            2 => idx.clone().prop_map(OpI::Find),
            1 => (0usize..8).prop_map(OpI::Rehash),
            1 => (0usize..256).prop_map(OpI::Expand),
            1 => Just(OpI::Resize),
            2 => prop_oneof![
                Just(OpI::Iterate),
                Just(OpI::SafeRemoveEven),
                Just(OpI::Scan)
            ],
            1 => (0usize..12).prop_map(OpI::Sample),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn fail(e: DictError) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

// Runs one scenario against a HashMap model. Works for any descriptor over
// byte keys so the same sequence can be replayed with colliding hashes.
fn run_scenario<T>(
    mut sut: Dict<T>,
    pool: &[Vec<u8>],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    T: DictType<Key = Vec<u8>, Value = i32>,
{
    let mut model: HashMap<Vec<u8>, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Add(i, v) => {
                let k = pool[i].clone();
                let already = model.contains_key(&k);
                match sut.add(k.clone(), v) {
                    Ok(id) => {
                        prop_assert!(!already, "add must fail on duplicate");
                        prop_assert_eq!(sut.entry(id).map(|e| *e.value()), Some(v));
                        model.insert(k, v);
                    }
                    Err(DictError::KeyExists) => {
                        prop_assert!(already, "duplicate error only when key exists");
                    }
                    other => prop_assert!(false, "unexpected result: {:?}", other),
                }
            }
            OpI::Replace(i, v) => {
                let k = pool[i].clone();
                let expected = if model.insert(k.clone(), v).is_some() {
                    Replaced::Replaced
                } else {
                    Replaced::Inserted
                };
                prop_assert_eq!(sut.replace(k, v), expected);
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                match sut.remove(k) {
                    Ok(()) => prop_assert!(model.remove(k).is_some()),
                    Err(DictError::KeyNotFound) => prop_assert!(!model.contains_key(k)),
                    other => prop_assert!(false, "unexpected result: {:?}", other),
                }
            }
            OpI::Unlink(i) => {
                let k = &pool[i];
                match sut.unlink(k) {
                    Ok(entry) => {
                        prop_assert_eq!(entry.key(), k);
                        prop_assert_eq!(Some(*entry.value()), model.remove(k));
                        sut.free_unlinked_entry(entry);
                    }
                    Err(DictError::KeyNotFound) => prop_assert!(!model.contains_key(k)),
                    other => prop_assert!(false, "unexpected result: {:?}", other),
                }
            }
            OpI::Find(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.fetch_value(k).copied(), model.get(k).copied());
                prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
            }
            OpI::Rehash(n) => {
                let more = sut.rehash(n);
                prop_assert_eq!(more, sut.is_rehashing());
            }
            OpI::Expand(size) => {
                let rehashing = sut.is_rehashing();
                let used = sut.table_used(0);
                match sut.expand(size) {
                    Ok(()) => prop_assert!(!rehashing && used <= size),
                    Err(DictError::Rehashing) => prop_assert!(rehashing),
                    Err(DictError::ExpandTooSmall { .. }) => prop_assert!(used > size),
                    other => prop_assert!(false, "unexpected result: {:?}", other),
                }
            }
            OpI::Resize => match sut.resize() {
                Ok(()) | Err(DictError::Rehashing) => {}
                other => prop_assert!(false, "unexpected result: {:?}", other),
            },
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
            OpI::SafeRemoveEven => {
                let before: BTreeSet<_> = model.keys().cloned().collect();
                let mut seen = BTreeSet::new();
                let mut it = sut.safe_iterator();
                while let Some(id) = it.next(&sut) {
                    let (k, v) = match sut.entry(id) {
                        Some(e) => (e.key().clone(), *e.value()),
                        None => {
                            it.release(&mut sut).map_err(fail)?;
                            return Err(TestCaseError::fail("iterator returned a dead id"));
                        }
                    };
                    prop_assert!(seen.insert(k.clone()), "key returned twice");
                    if v % 2 == 0 {
                        sut.remove_by_id(id).map_err(fail)?;
                        model.remove(&k);
                    }
                }
                it.release(&mut sut).map_err(fail)?;
                prop_assert_eq!(seen, before);
            }
            OpI::Scan => {
                let mut seen = BTreeSet::new();
                let mut cursor = 0;
                loop {
                    cursor = sut.scan(cursor, |k, _| {
                        seen.insert(k.clone());
                    });
                    if cursor == 0 {
                        break;
                    }
                }
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(seen, m_keys);
            }
            OpI::Sample(count) => {
                let ids = sut.sample_entries(count);
                prop_assert!(ids.len() <= count.min(model.len()));
                let keys: BTreeSet<_> = ids
                    .iter()
                    .filter_map(|id| sut.entry(*id).map(|e| e.key().clone()))
                    .collect();
                prop_assert_eq!(keys.len(), ids.len());
                prop_assert!(keys.iter().all(|k| model.contains_key(k)));
            }
        }

        // Post-conditions after each op
        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.safe_iterators(), 0);
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Duplicate adds are rejected; replace reports insert vs overwrite.
// - Lookups, removals and unlinks agree with the model while rehashing.
// - Both tables' bucket chains hold exactly the live entries, each in the
//   bucket its stored hash selects, and the migrated prefix stays empty.
// - Iteration, safe iteration with removal and full scans see every key.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: Dict<BytesType<i32>> = Dict::new(crate::hash::DEFAULT_SEED);
        run_scenario(sut, &pool, ops)?;
    }
}

// Every key hashes to the same bucket so chains get long and every lookup
// has to resolve through key comparison.
struct Colliding;

impl DictType for Colliding {
    type Key = Vec<u8>;
    type Value = i32;
    type Context = ();

    fn hash(_: &(), _: &Vec<u8>) -> u64 {
        0
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior (constant hash).
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut: Dict<Colliding> = Dict::new(());
        run_scenario(sut, &pool, ops)?;
    }
}
