// Dict property tests through the public API.
//
// Property 1: counting and visibility against a HashMap model.
//  - Model: HashMap<u16, u32>.
//  - Invariant: len() == model.len(); table_used(0) + table_used(1) ==
//    len(); fetch_value(k) == model.get(k) for every key of the universe.
//  - Operations: add, replace, remove, explicit rehash steps, shrink.
//
// Property 2: scans interleaved with mutation.
//  - Keys present for the whole scan (never removed during it) must be
//    reported at least once, whatever grows or shrinks happen in between.
use proptest::prelude::*;
use rehash_dict::{Dict, DictError, StdType};
use std::collections::{HashMap, HashSet};

type D = Dict<StdType<u16, u32>>;

fn new_dict() -> D {
    Dict::new(Default::default())
}

// Property 1: model equivalence with rehash steps and shrinking mixed in.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_dict_matches_model(ops in proptest::collection::vec((0u8..=5u8, 0u16..300u16, any::<u32>()), 1..400)) {
        let mut d = new_dict();
        let mut model: HashMap<u16, u32> = HashMap::new();

        for (op, k, v) in ops {
            match op {
                // Add; duplicates rejected.
                0 | 1 => match d.add(k, v) {
                    Ok(_) => { prop_assert!(model.insert(k, v).is_none()); }
                    Err(DictError::KeyExists) => { prop_assert!(model.contains_key(&k)); }
                    Err(e) => prop_assert!(false, "unexpected error: {e}"),
                },
                // Replace.
                2 => {
                    d.replace(k, v);
                    model.insert(k, v);
                }
                // Remove.
                3 => {
                    let res = d.remove(&k);
                    prop_assert_eq!(res.is_ok(), model.remove(&k).is_some());
                }
                // Explicit rehash work.
                4 => {
                    d.rehash((v % 4) as usize);
                }
                // Shrink when underfilled.
                _ => {
                    d.shrink_if_needed();
                }
            }
            prop_assert_eq!(d.len(), model.len());
            prop_assert_eq!(d.table_used(0) + d.table_used(1), d.len());
        }

        for k in 0u16..300 {
            prop_assert_eq!(d.fetch_value(&k).copied(), model.get(&k).copied());
        }
        while d.rehash(100) {}
        prop_assert_eq!(d.table_size(1), 0);
        prop_assert_eq!(d.len(), model.len());
    }
}

// Property 2: scan completeness under interleaved mutation.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_scan_reports_stable_keys(
        initial in proptest::collection::hash_set(0u16..2000u16, 0..300),
        churn in proptest::collection::vec((any::<bool>(), 0u16..2000u16), 0..200),
    ) {
        let mut d = new_dict();
        for &k in &initial {
            d.add(k, 0).unwrap();
        }
        let mut removed: HashSet<u16> = HashSet::new();
        let mut seen: HashSet<u16> = HashSet::new();
        let mut churn = churn.into_iter();
        let mut cursor = 0;
        loop {
            cursor = d.scan(cursor, |k, _| { seen.insert(*k); });
            if let Some((add, k)) = churn.next() {
                if add {
                    let _ = d.add(k, 1);
                } else if d.remove(&k).is_ok() {
                    removed.insert(k);
                }
                d.shrink_if_needed();
            }
            if cursor == 0 {
                break;
            }
        }
        for k in initial.difference(&removed) {
            prop_assert!(seen.contains(k), "key {} present throughout but not reported", k);
        }
    }
}
