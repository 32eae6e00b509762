//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store against a simple creation-ordered model,
//! with a manual scheduler standing in for wall-clock time.

use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{normalize_key, CacheStore, SharedStore};
use crate::config::CacheConfig;
use crate::timer::ManualScheduler;

// == Test Configuration ==
const TEST_MAX_COUNT: usize = 8;

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-j]"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,32}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Lookup { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        1 => key_strategy().prop_map(|key| CacheOp::Lookup { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn new_store(config: CacheConfig) -> (SharedStore<String>, ManualScheduler) {
    let clock = ManualScheduler::new();
    let store = CacheStore::shared(config, Arc::new(clock.clone()));
    (store, clock)
}

// == Reference Model ==
/// Entries in creation order, oldest at the front.
#[derive(Default)]
struct Model {
    entries: VecDeque<(String, String)>,
}

impl Model {
    fn set(&mut self, key: String, value: String, max_count: usize) {
        self.delete(&key);
        self.entries.push_back((key, value));
        if self.entries.len() > max_count {
            self.entries.pop_front();
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn delete(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Any sequence of set/lookup/delete leaves the store holding exactly the
    // entries of the creation-ordered model, and never more than max_count.
    #[test]
    fn prop_matches_creation_order_model(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let (store, _clock) = new_store(CacheConfig::default().with_max_count(TEST_MAX_COUNT));
        let mut store = store.lock();
        let mut model = Model::default();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.insert(key.clone(), value.clone());
                    model.set(key, value, TEST_MAX_COUNT);
                }
                CacheOp::Lookup { key } => {
                    prop_assert_eq!(store.lookup(&key), model.get(&key), "Lookup mismatch for {}", key);
                }
                CacheOp::Delete { key } => {
                    store.delete(&key);
                    model.delete(&key);
                }
            }

            prop_assert!(store.len() <= TEST_MAX_COUNT, "Store size {} exceeds max", store.len());
            prop_assert_eq!(store.len(), model.entries.len());
        }

        for (key, value) in &model.entries {
            prop_assert_eq!(store.peek(key).map(|e| e.value.clone()), Some(value.clone()));
        }
    }

    // Every live entry owns exactly two pending timers; removed entries own none.
    #[test]
    fn prop_timers_follow_entries(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let (store, clock) = new_store(CacheConfig::default().with_max_count(TEST_MAX_COUNT));
        let mut store = store.lock();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => store.insert(key, value),
                CacheOp::Lookup { key } => {
                    store.lookup(&key);
                }
                CacheOp::Delete { key } => {
                    store.delete(&key);
                }
            }
            prop_assert_eq!(clock.pending(), store.len() * 2);
        }
    }

    // Reads never extend an entry past its stale time.
    #[test]
    fn prop_reads_never_outlive_stale_time(
        key in key_strategy(),
        value in value_strategy(),
        reads in prop::collection::vec(1u64..50, 0..10)
    ) {
        let stale = Duration::from_millis(100);
        let config = CacheConfig::default()
            .with_stale_time(stale)
            .with_unused_time(Duration::from_millis(60));
        let (store, clock) = new_store(config);

        store.lock().insert(key.clone(), value);

        for step in reads {
            if clock.now() + Duration::from_millis(step) >= stale {
                break;
            }
            clock.advance(Duration::from_millis(step));
            prop_assert!(store.lock().lookup(&key).is_some(), "Entry read within its windows must be live");
        }

        clock.advance(stale.saturating_sub(clock.now()));
        prop_assert!(!store.lock().contains(&key));
        prop_assert_eq!(clock.pending(), 0);
    }

    // Structurally equal keys normalize identically however they were built.
    #[test]
    fn prop_normalization_ignores_insertion_order(
        pairs in prop::collection::btree_map("[a-z]{1,6}", 0i64..1000, 0..12)
    ) {
        let forward: std::collections::HashMap<_, _> = pairs.iter().collect();
        let backward: std::collections::HashMap<_, _> = pairs.iter().rev().collect();

        let a = normalize_key(&forward).unwrap();
        let b = normalize_key(&backward).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a, normalize_key(&pairs).unwrap());
    }
}
