//! Property-based tests checked against a plain `HashMap` oracle and
//! against the table's own invariants.

mod common;

use std::collections::HashMap;

use arrow_table::ArrowTable;
use common::IdentityBuildHasher;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CAPACITY: usize = 100;
const KEY_SPACE: u64 = 1000;
const STEPS: usize = 10_000;

/// Drive the table and a `HashMap` oracle through the same sequence of
/// random inserts and deletes, always inserting when the table is empty
/// and always deleting a present key when it is full, and checking full
/// key/value agreement (plus the table's own invariants) after every step.
fn randomized_oracle_run(seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut table: ArrowTable<u64, u64, IdentityBuildHasher> =
        ArrowTable::with_hasher(CAPACITY, IdentityBuildHasher);
    let mut oracle: HashMap<u64, u64> = HashMap::new();

    for step in 0..STEPS {
        let do_insert = if oracle.is_empty() {
            true
        } else if oracle.len() == CAPACITY {
            false
        } else {
            rng.gen_bool(0.5)
        };

        if do_insert {
            let key = rng.gen_range(0..KEY_SPACE);
            let value = rng.gen::<u64>();
            let before = oracle.insert(key, value);
            let result = table.insert(key, value);
            match before {
                Some(old) => assert_eq!(result, Ok(Some(old)), "step {step}: overwrite mismatch"),
                None => assert_eq!(result, Ok(None), "step {step}: fresh insert should succeed"),
            }
        } else {
            let key = *oracle.keys().nth(rng.gen_range(0..oracle.len())).unwrap();
            let expected = oracle.remove(&key);
            assert_eq!(table.remove(&key), expected, "step {step}: delete mismatch");
        }

        assert_eq!(table.len(), oracle.len(), "step {step}: len diverged");
        table.debug_assert_invariants();
    }

    for (key, value) in &oracle {
        assert_eq!(table.get(key), Some(value), "final state diverged for key {key}");
    }
}

#[test]
fn randomized_oracle_matches_reference_map() {
    for seed in 0..4u64 {
        randomized_oracle_run(seed);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Inserting a batch of distinct keys and reading them all back never
    /// loses or corrupts a value, regardless of how the keys happen to
    /// collide under the real `BuildHasher`.
    #[test]
    fn round_trip_after_random_inserts(
        pairs in prop::collection::vec((0u32..64, any::<u32>()), 0..64)
    ) {
        let mut table: ArrowTable<u32, u32> = ArrowTable::new(64);
        let mut oracle: HashMap<u32, u32> = HashMap::new();
        for (key, value) in pairs {
            oracle.insert(key, value);
            prop_assert!(table.insert(key, value).is_ok());
        }
        for (key, value) in &oracle {
            prop_assert_eq!(table.get(key), Some(value));
        }
        prop_assert_eq!(table.len(), oracle.len());
        table.debug_assert_invariants();
    }

    /// Overwriting an existing key never changes how many entries the
    /// table reports.
    #[test]
    fn overwrite_neutrality(key in 0u32..64, v1 in any::<u32>(), v2 in any::<u32>()) {
        let mut table: ArrowTable<u32, u32> = ArrowTable::new(64);
        table.insert(key, v1).unwrap();
        let len_before = table.len();
        let replaced = table.insert(key, v2);
        prop_assert_eq!(replaced, Ok(Some(v1)));
        prop_assert_eq!(table.len(), len_before);
        prop_assert_eq!(table.get(&key), Some(&v2));
        table.debug_assert_invariants();
    }

    /// Deleting an absent key and deleting a key twice both behave as a
    /// no-op the second time.
    #[test]
    fn idempotent_delete(key in 0u32..64, value in any::<u32>(), present in any::<bool>()) {
        let mut table: ArrowTable<u32, u32> = ArrowTable::new(64);
        if present {
            table.insert(key, value).unwrap();
            prop_assert_eq!(table.remove(&key), Some(value));
        }
        prop_assert_eq!(table.remove(&key), None);
        prop_assert_eq!(table.contains_key(&key), false);
        table.debug_assert_invariants();
    }
}
