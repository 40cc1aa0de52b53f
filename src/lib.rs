//! pokedex_perf - API performance layer for a Pokémon card dashboard
//!
//! A TTL + LRU response cache, a concurrency-limited retrying fetcher with
//! request batching and deduplication, a performance monitor, and a
//! synthetic test suite that holds the whole stack to budgets.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod suite;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::{spawn_cleanup_task, spawn_report_task};
