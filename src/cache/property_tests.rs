//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache's TTL, LRU and key invariants.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::thread::sleep;
use std::time::Duration;

use crate::cache::{generate_key, CacheStore};
use crate::client::RequestOptions;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_/]{1,48}"
}

fn payload_strategy() -> impl Strategy<Value = Value> {
    ("[a-zA-Z ]{1,32}", 0u32..1000).prop_map(|(name, hp)| json!({"name": name, "hp": hp}))
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, data: Value },
    Get { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), payload_strategy()).prop_map(|(key, data)| CacheOp::Set { key, data }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
    ]
}

fn unique(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Hit and miss counters match the outcome of every lookup.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let mut store = CacheStore::new(TEST_MAX_ENTRIES, TEST_TTL);
        let mut expected_hits = 0u64;
        let mut expected_misses = 0u64;

        for op in ops {
            match op {
                CacheOp::Set { key, data } => store.set(key, data),
                CacheOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.size, store.len());
    }

    // A fresh entry is returned exactly as stored, and only if it was stored.
    #[test]
    fn prop_get_returns_stored_payload(
        stored in prop::collection::hash_map(key_strategy(), payload_strategy(), 1..30),
        lookup in key_strategy()
    ) {
        let mut store = CacheStore::new(TEST_MAX_ENTRIES, TEST_TTL);
        for (key, data) in &stored {
            store.set(key.clone(), data.clone());
        }

        for (key, data) in &stored {
            let got = store.get(key);
            prop_assert_eq!(got.as_ref(), Some(data));
        }
        prop_assert_eq!(store.get(&lookup).is_some(), stored.contains_key(&lookup));
    }

    // Size never exceeds capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((key_strategy(), payload_strategy()), 1..200)
    ) {
        let max_entries = 25;
        let mut store = CacheStore::new(max_entries, TEST_TTL);

        for (key, data) in entries {
            store.set(key, data);
            prop_assert!(store.len() <= max_entries, "size {} exceeds {}", store.len(), max_entries);
        }
    }

    // Inserting into a full cache evicts exactly the least recently accessed key.
    #[test]
    fn prop_lru_evicts_least_recently_accessed(
        keys in prop::collection::vec(key_strategy(), 3..12),
        accesses in prop::collection::vec(0usize..64, 0..20),
        new_key in key_strategy()
    ) {
        let keys = unique(keys);
        prop_assume!(keys.len() >= 2);
        prop_assume!(!keys.contains(&new_key));

        let mut store = CacheStore::new(keys.len(), TEST_TTL);
        let mut last_access: HashMap<String, usize> = HashMap::new();
        let mut clock = 0usize;

        for key in &keys {
            store.set(key.clone(), json!(key));
            last_access.insert(key.clone(), clock);
            clock += 1;
        }
        for index in accesses {
            let key = &keys[index % keys.len()];
            prop_assert!(store.get(key).is_some());
            last_access.insert(key.clone(), clock);
            clock += 1;
        }

        let expected_victim = last_access
            .iter()
            .min_by_key(|(_, tick)| **tick)
            .map(|(key, _)| key.clone())
            .unwrap();

        store.set(new_key.clone(), json!("new"));

        prop_assert_eq!(store.len(), keys.len());
        prop_assert!(!store.contains(&expected_victim), "{} should be evicted", expected_victim);
        prop_assert!(store.contains(&new_key));
        for key in keys.iter().filter(|k| **k != expected_victim) {
            prop_assert!(store.contains(key), "{} should survive", key);
        }
    }

    // Header order never changes the generated key.
    #[test]
    fn prop_key_ignores_header_order(
        url in "https://[a-z]{3,10}\\.io/[a-z/]{0,20}",
        headers in prop::collection::hash_map("[A-Za-z-]{1,12}", "[a-z0-9]{0,12}", 0..8)
    ) {
        let pairs: Vec<(String, String)> = headers.into_iter().collect();
        let forward = pairs
            .iter()
            .fold(RequestOptions::get(), |opts, (k, v)| opts.header(k.clone(), v.clone()));
        let backward = pairs
            .iter()
            .rev()
            .fold(RequestOptions::get(), |opts, (k, v)| opts.header(k.clone(), v.clone()));

        prop_assert_eq!(generate_key(&url, &forward), generate_key(&url, &backward));
    }
}

// Time-sensitive TTL property with few cases
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // Entries older than the TTL are never returned.
    #[test]
    fn prop_ttl_expiration_behavior(key in key_strategy(), data in payload_strategy()) {
        let mut store = CacheStore::new(TEST_MAX_ENTRIES, Duration::from_millis(40));

        store.set(key.clone(), data.clone());
        prop_assert_eq!(store.get(&key), Some(data));

        sleep(Duration::from_millis(70));

        prop_assert!(store.get(&key).is_none(), "entry should expire after the TTL");
    }
}

// == Concurrent Access ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    // Concurrent access through the shared lock keeps the store consistent.
    #[test]
    fn prop_concurrent_operation_correctness(
        operations in prop::collection::vec(cache_op_strategy(), 10..50)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let store = crate::cache::shared(CacheStore::new(16, TEST_TTL));
            let total_gets = operations
                .iter()
                .filter(|op| matches!(op, CacheOp::Get { .. }))
                .count() as u64;

            let mut handles = vec![];
            for op in operations {
                let store = store.clone();
                handles.push(tokio::spawn(async move {
                    let mut cache = store.write().await;
                    match op {
                        CacheOp::Set { key, data } => cache.set(key, data),
                        CacheOp::Get { key } => {
                            cache.get(&key);
                        }
                    }
                }));
            }
            for handle in handles {
                handle.await.expect("task should not panic");
            }

            let stats = store.read().await.stats();
            prop_assert!(stats.size <= 16);
            prop_assert_eq!(stats.hits + stats.misses, total_gets);
            prop_assert!((0.0..=100.0).contains(&stats.hit_rate));
            Ok(())
        })?;
    }
}

// == Scenario Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refreshed_entry_survives_eviction() {
        let mut store = CacheStore::new(2, TEST_TTL);

        store.set("a", json!("a"));
        store.set("b", json!("b"));
        store.get("a");
        store.set("c", json!("c"));

        let mut keys: Vec<&str> = ["a", "b", "c"]
            .into_iter()
            .filter(|k| store.contains(k))
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
