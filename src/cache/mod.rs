//! Cache Module
//!
//! Response cache for the API layer with TTL expiration and LRU eviction.

mod entry;
mod key;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::CacheEntry;
pub use key::generate_key;
pub use lru::LruIndex;
pub use stats::CacheStats;
pub use store::CacheStore;

/// Cache store shared between the fetcher, the background sweep and the API.
pub type SharedCache = Arc<RwLock<CacheStore>>;

/// Wraps a store for sharing.
pub fn shared(store: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(store))
}
