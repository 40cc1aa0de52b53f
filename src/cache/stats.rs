//! Cache Statistics Module
//!
//! Read-only snapshot of cache effectiveness.

use serde::Serialize;

// == Cache Stats ==
/// Cache statistics, recomputed on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Current number of entries
    pub size: usize,
    /// Successful lookups
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// hits / (hits + misses) as a percentage, 0 before any lookup
    pub hit_rate: f64,
    /// Capacity
    pub max_size: usize,
}

impl CacheStats {
    pub fn new(size: usize, max_size: usize, hits: u64, misses: u64, evictions: u64) -> Self {
        Self {
            size,
            hits,
            misses,
            evictions,
            hit_rate: hit_rate_percent(hits, misses),
            max_size,
        }
    }
}

// == Hit Rate ==
fn hit_rate_percent(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64 * 100.0
    }
}
