//! Configuration Module
//!
//! Loads the API layer, monitor and server settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::client::RetryPolicy;

/// Runtime configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of cached API responses
    pub cache_max_entries: usize,
    /// Cache TTL in seconds
    pub cache_ttl: u64,
    /// Per-attempt request timeout in seconds
    pub request_timeout: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff schedule in milliseconds, one entry per retry
    pub retry_delays_ms: Vec<u64>,
    /// Number of queued requests that triggers an immediate batch flush
    pub batch_size: usize,
    /// Batch window in milliseconds
    pub batch_delay_ms: u64,
    /// Upper bound on in-flight network requests
    pub concurrent_requests: usize,
    /// Cache sweep and batch flush interval in seconds
    pub cleanup_interval: u64,
    /// Periodic monitor report interval in seconds
    pub report_interval: u64,
    /// Samples the monitor keeps per metric name
    pub metrics_capacity: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Endpoints hit by the basic API performance test
    pub perf_test_endpoints: Vec<String>,
    /// Origins the fetch proxy may reach, e.g. `https://api.pokemontcg.io`
    pub allowed_upstreams: Vec<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` (default: 1000)
    /// - `CACHE_TTL_SECS` (default: 300)
    /// - `REQUEST_TIMEOUT_SECS` (default: 30)
    /// - `MAX_RETRIES` (default: 3)
    /// - `RETRY_DELAYS_MS` comma separated (default: 1000,2000,4000)
    /// - `BATCH_SIZE` (default: 10)
    /// - `BATCH_DELAY_MS` (default: 100)
    /// - `CONCURRENT_REQUESTS` (default: 6)
    /// - `CLEANUP_INTERVAL_SECS` (default: 300)
    /// - `REPORT_INTERVAL_SECS` (default: 60)
    /// - `METRICS_CAPACITY` samples per metric name (default: 100)
    /// - `SERVER_PORT` (default: 3000)
    /// - `PERF_TEST_ENDPOINTS` comma separated (default: http://127.0.0.1:3000/health)
    /// - `ALLOWED_UPSTREAMS` comma separated origins (default: the Pokémon TCG API and image hosts)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_max_entries: env_or("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cache_ttl: env_or("CACHE_TTL_SECS", defaults.cache_ttl),
            request_timeout: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            max_retries: env_or("MAX_RETRIES", defaults.max_retries),
            retry_delays_ms: env_list("RETRY_DELAYS_MS").unwrap_or(defaults.retry_delays_ms),
            batch_size: env_or("BATCH_SIZE", defaults.batch_size),
            batch_delay_ms: env_or("BATCH_DELAY_MS", defaults.batch_delay_ms),
            concurrent_requests: env_or("CONCURRENT_REQUESTS", defaults.concurrent_requests),
            cleanup_interval: env_or("CLEANUP_INTERVAL_SECS", defaults.cleanup_interval),
            report_interval: env_or("REPORT_INTERVAL_SECS", defaults.report_interval),
            metrics_capacity: env_or("METRICS_CAPACITY", defaults.metrics_capacity),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            perf_test_endpoints: env_list("PERF_TEST_ENDPOINTS")
                .unwrap_or(defaults.perf_test_endpoints),
            allowed_upstreams: env_list("ALLOWED_UPSTREAMS").unwrap_or(defaults.allowed_upstreams),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Whether `url` is absolute and its origin (scheme, host, port) is one of
    /// `allowed_upstreams`.
    pub fn allows_upstream(&self, url: &str) -> bool {
        let Some(origin) = origin_of(url) else {
            return false;
        };
        self.allowed_upstreams
            .iter()
            .filter_map(|allowed| origin_of(allowed))
            .any(|allowed| allowed == origin)
    }

    /// Retry policy built from `max_retries` and the backoff schedule.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            self.retry_delays_ms
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_max_entries: 1000,
            cache_ttl: 300,
            request_timeout: 30,
            max_retries: 3,
            retry_delays_ms: vec![1000, 2000, 4000],
            batch_size: 10,
            batch_delay_ms: 100,
            concurrent_requests: 6,
            cleanup_interval: 300,
            report_interval: 60,
            metrics_capacity: 100,
            server_port: 3000,
            perf_test_endpoints: vec!["http://127.0.0.1:3000/health".to_string()],
            allowed_upstreams: vec![
                "https://api.pokemontcg.io".to_string(),
                "https://images.pokemontcg.io".to_string(),
            ],
        }
    }
}

fn origin_of(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    Some(parsed.origin().ascii_serialization())
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses a comma separated variable. Any unparseable item rejects the whole list.
fn env_list<T: FromStr>(name: &str) -> Option<Vec<T>> {
    let raw = env::var(name).ok()?;
    let items = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect::<Option<Vec<T>>>()?;
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
