//! Cache Entry Module
//!
//! A cached API payload with its insertion and last-access times.

use std::time::{Duration, Instant};

use serde_json::Value;

// == Cache Entry ==
/// A single cached response payload.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached JSON payload
    pub data: Value,
    /// When the entry was inserted; TTL is measured from here
    pub timestamp: Instant,
    /// When the entry was last returned by `get` (or inserted)
    pub last_access: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(data: Value) -> Self {
        let now = Instant::now();
        Self {
            data,
            timestamp: now,
            last_access: now,
        }
    }

    /// Time elapsed since insertion.
    pub fn age(&self) -> Duration {
        self.timestamp.elapsed()
    }

    // == Is Expired ==
    /// An entry stays valid while its age is at most `ttl`.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }

    /// Marks the entry as just read.
    pub fn touch(&mut self) {
        self.last_access = Instant::now();
    }
}
