//! Cache Store Module
//!
//! Response cache combining HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruIndex};

// == Cache Store ==
/// Bounded response cache with TTL expiry and LRU eviction.
///
/// TTL and capacity are independent: an entry leaves through whichever
/// triggers first.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Access recency for eviction
    lru: LruIndex,
    hits: u64,
    misses: u64,
    evictions: u64,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Maximum age of a servable entry
    ttl: Duration,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with the given capacity and TTL.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruIndex::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
            max_entries,
            ttl,
        }
    }

    // == Get ==
    /// Returns the cached payload for `key`.
    ///
    /// A missing or expired entry counts as a miss; an expired entry is
    /// dropped on the spot. A hit refreshes the entry's last access.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let ttl = self.ttl;
        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(ttl) => {
                entry.touch();
                let data = entry.data.clone();
                self.lru.touch(key);
                self.hits += 1;
                Some(data)
            }
            Some(_) => {
                self.remove(key);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    // == Set ==
    /// Stores a payload, evicting the least recently used entry when a new
    /// key would exceed capacity. Overwriting an existing key never evicts.
    pub fn set(&mut self, key: impl Into<String>, data: Value) {
        let key = key.into();
        if self.max_entries == 0 {
            return;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                self.evictions += 1;
                debug!(key = %evicted, "evicted least recently used cache entry");
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(data));
        self.lru.touch(&key);
    }

    /// Drops an entry without touching the counters.
    pub fn remove(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    // == Cleanup ==
    /// Removes every entry older than the TTL. Returns how many were removed.
    pub fn cleanup(&mut self) -> usize {
        let ttl = self.ttl;
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    // == Clear ==
    /// Drops all entries and resets the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        CacheStats::new(
            self.entries.len(),
            self.max_entries,
            self.hits,
            self.misses,
            self.evictions,
        )
    }

    /// Whether `key` is stored, expired or not. Does not count as an access.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entry metadata, without counting an access.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
