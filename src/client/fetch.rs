//! Retry/backoff fetch wrapper.
//!
//! Cache first; on a miss, one limiter slot covers the whole attempt loop,
//! backoff waits included.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, error, warn};

use super::dedupe::RequestDeduplicator;
use super::limiter::ConcurrencyLimiter;
use super::report::ApiPerformanceReport;
use super::request::RequestOptions;
use super::retry::{RetryDecision, RetryPolicy};
use super::transport::Transport;
use crate::cache::{generate_key, SharedCache};
use crate::config::Config;
use crate::error::FetchError;
use crate::monitor::{PerformanceMetric, PerformanceMonitor};

type FetchOutcome = Result<Value, FetchError>;

/// Cached, concurrency-limited, retrying JSON fetcher.
///
/// Cheap to clone; clones share cache, limiter, monitor and in-flight map.
#[derive(Clone)]
pub struct OptimizedFetcher {
    cache: SharedCache,
    limiter: ConcurrencyLimiter,
    monitor: Arc<PerformanceMonitor>,
    policy: RetryPolicy,
    timeout: Duration,
    transport: Arc<dyn Transport>,
    dedup: Arc<RequestDeduplicator<FetchOutcome>>,
}

impl OptimizedFetcher {
    /// Fetcher with the default limiter, retry policy and 30s timeout.
    pub fn new(
        cache: SharedCache,
        monitor: Arc<PerformanceMonitor>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            cache,
            limiter: ConcurrencyLimiter::new(6),
            monitor,
            policy: RetryPolicy::default(),
            timeout: Duration::from_secs(30),
            transport,
            dedup: Arc::new(RequestDeduplicator::new()),
        }
    }

    pub fn from_config(
        config: &Config,
        cache: SharedCache,
        monitor: Arc<PerformanceMonitor>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::new(cache, monitor, transport)
            .with_limiter(ConcurrencyLimiter::new(config.concurrent_requests))
            .with_policy(config.retry_policy())
            .with_timeout(config.request_timeout())
    }

    pub fn with_limiter(mut self, limiter: ConcurrencyLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    // == Fetch ==
    /// Returns the cached payload or fetches, retries and caches it.
    ///
    /// Terminal errors come back unchanged; running out of attempts yields
    /// [`FetchError::RetriesExhausted`] wrapping the last error.
    pub async fn fetch(&self, url: &str, options: &RequestOptions) -> FetchOutcome {
        let started = Instant::now();
        let key = generate_key(url, options);

        let cached = self.cache.write().await.get(&key);
        if let Some(data) = cached {
            self.monitor
                .record_metric(PerformanceMetric::api_cache_hit(url, started.elapsed()));
            return Ok(data);
        }

        let data = self
            .limiter
            .execute(self.attempt_until_settled(url, options))
            .await??;

        self.cache.write().await.set(key, data.clone());
        Ok(data)
    }

    /// Like [`fetch`](Self::fetch), but concurrent identical requests share
    /// one call.
    pub async fn fetch_deduped(&self, url: &str, options: &RequestOptions) -> FetchOutcome {
        let key = generate_key(url, options);
        let fetcher = self.clone();
        let url = url.to_string();
        let options = options.clone();

        self.dedup
            .dedupe(&key, move || async move { fetcher.fetch(&url, &options).await })
            .await
    }

    async fn attempt_until_settled(&self, url: &str, options: &RequestOptions) -> FetchOutcome {
        let mut attempt = 1;
        loop {
            let started = Instant::now();
            let outcome = self.attempt(url, options).await;
            let latency = started.elapsed();

            let err = match outcome {
                Ok((status, data)) => {
                    self.monitor.record_metric(PerformanceMetric::api_success(
                        url, attempt, status, latency,
                    ));
                    return Ok(data);
                }
                Err(err) => err,
            };

            self.monitor.record_metric(PerformanceMetric::api_error(
                url,
                attempt,
                err.status(),
                &err.to_string(),
                latency,
            ));

            match self.policy.decide(attempt, &err) {
                RetryDecision::Retry { after } => {
                    debug!(url, attempt, delay_ms = after.as_millis() as u64, error = %err, "retrying request");
                    tokio::time::sleep(after).await;
                    attempt += 1;
                }
                RetryDecision::Stop => {
                    warn!(url, attempt, error = %err, "request failed with terminal error");
                    return Err(err);
                }
                RetryDecision::Exhausted => {
                    error!(url, attempts = attempt, error = %err, "request failed after all retries");
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
            }
        }
    }

    /// One timed attempt. Dropping the send future on timeout cancels it.
    async fn attempt(&self, url: &str, options: &RequestOptions) -> Result<(u16, Value), FetchError> {
        let response = tokio::time::timeout(self.timeout, self.transport.send(url, options))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        let status = response.status;
        response.into_json().map(|data| (status, data))
    }

    // == Report ==
    pub async fn api_report(&self) -> ApiPerformanceReport {
        let cache = self.cache.read().await.stats();
        ApiPerformanceReport::from_metrics(cache, &self.monitor.metrics())
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn monitor(&self) -> &Arc<PerformanceMonitor> {
        &self.monitor
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}
