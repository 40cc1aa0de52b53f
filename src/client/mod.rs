//! API Client Module
//!
//! Request shaping in front of the network: concurrency limiting, retries
//! with backoff, batching and in-flight deduplication.

mod batch;
mod dedupe;
mod fetch;
mod limiter;
mod report;
mod request;
mod retry;
mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use batch::RequestBatcher;
pub use dedupe::RequestDeduplicator;
pub use fetch::OptimizedFetcher;
pub use limiter::ConcurrencyLimiter;
pub use report::{ApiPerformanceReport, LatencyBuckets, RequestSummary, FAST_REQUEST_MS, SLOW_REQUEST_MS};
pub use request::{Method, RequestOptions};
pub use retry::{RetryDecision, RetryPolicy};
pub use transport::{ReqwestTransport, Transport, TransportResponse};
