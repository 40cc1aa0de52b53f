//! API performance report, projected from the monitor's buffered metrics.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::monitor::{PerformanceMetric, API_BATCH_REQUEST, API_REQUEST_ERROR, API_REQUEST_SUCCESS};

/// Successful requests below this latency count as fast.
pub const FAST_REQUEST_MS: f64 = 1000.0;
/// Successful requests above this latency count as slow.
pub const SLOW_REQUEST_MS: f64 = 5000.0;

#[derive(Debug, Clone, Serialize)]
pub struct ApiPerformanceReport {
    pub cache: CacheStats,
    pub requests: RequestSummary,
    pub performance: LatencyBuckets,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestSummary {
    /// Attempts recorded, successful or not
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Batch flushes
    pub batched: usize,
    pub average_response_time_ms: f64,
    /// Percent of attempts that succeeded, 0 when nothing was recorded
    pub success_rate: f64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencyBuckets {
    pub fast_requests: usize,
    pub slow_requests: usize,
}

impl ApiPerformanceReport {
    pub fn from_metrics<'a>(
        cache: CacheStats,
        metrics: impl IntoIterator<Item = &'a PerformanceMetric>,
    ) -> Self {
        let mut requests = RequestSummary::default();
        let mut performance = LatencyBuckets::default();
        let mut success_total = 0.0;

        for metric in metrics {
            match metric.name.as_str() {
                API_REQUEST_SUCCESS => {
                    requests.successful += 1;
                    success_total += metric.value;
                    if metric.value < FAST_REQUEST_MS {
                        performance.fast_requests += 1;
                    } else if metric.value > SLOW_REQUEST_MS {
                        performance.slow_requests += 1;
                    }
                }
                API_REQUEST_ERROR => requests.failed += 1,
                API_BATCH_REQUEST => requests.batched += 1,
                _ => {}
            }
        }

        requests.total = requests.successful + requests.failed;
        if requests.successful > 0 {
            requests.average_response_time_ms = success_total / requests.successful as f64;
        }
        if requests.total > 0 {
            requests.success_rate = requests.successful as f64 / requests.total as f64 * 100.0;
            requests.error_rate = 100.0 - requests.success_rate;
        }

        Self {
            cache,
            requests,
            performance,
        }
    }
}
