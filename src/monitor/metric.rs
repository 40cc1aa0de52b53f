//! Typed performance metrics.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::vitals::{ResourceKind, VitalRating, WebVital};

pub const API_REQUEST_SUCCESS: &str = "api-request-success";
pub const API_REQUEST_ERROR: &str = "api-request-error";
pub const API_CACHE_HIT: &str = "api-cache-hit";
pub const API_BATCH_REQUEST: &str = "api-batch-request";
pub const PAGE_LOAD: &str = "page-load";
pub const TIME_TO_INTERACTIVE: &str = "time-to-interactive";
pub const MEMORY_USAGE: &str = "memory-usage";

// == Unit ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricUnit {
    Milliseconds,
    Bytes,
    Score,
    Count,
    Percent,
}

// == Navigation Phase ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPhase {
    Load,
    Interactive,
}

// == Metric Kind ==
/// What a metric describes, with the fields that kind of metric carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricKind {
    /// One network attempt made by the fetcher
    ApiRequest {
        url: String,
        attempt: u32,
        status: Option<u16>,
        error: Option<String>,
    },
    /// A fetch answered from the cache
    ApiCacheHit { url: String },
    /// One batch flush
    ApiBatch { batch_size: usize, failed: usize },
    WebVital { vital: WebVital, rating: VitalRating },
    Navigation { phase: NavigationPhase },
    Resource {
        resource: ResourceKind,
        url: String,
        transfer_size: u64,
        cached: bool,
    },
    Memory { total: u64 },
    /// Mark/measure, timers and measured closures
    Timing { id: Option<String> },
    /// Free-form metric reported by a collaborator
    Custom { label: Option<String> },
}

// == Performance Metric ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub name: String,
    pub value: f64,
    pub unit: MetricUnit,
    pub timestamp: DateTime<Utc>,
    pub kind: MetricKind,
}

impl PerformanceMetric {
    pub fn new(name: impl Into<String>, value: f64, unit: MetricUnit, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            value,
            unit,
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn api_success(url: &str, attempt: u32, status: u16, latency: Duration) -> Self {
        Self::new(
            API_REQUEST_SUCCESS,
            millis(latency),
            MetricUnit::Milliseconds,
            MetricKind::ApiRequest {
                url: url.to_string(),
                attempt,
                status: Some(status),
                error: None,
            },
        )
    }

    pub fn api_error(
        url: &str,
        attempt: u32,
        status: Option<u16>,
        error: &str,
        latency: Duration,
    ) -> Self {
        Self::new(
            API_REQUEST_ERROR,
            millis(latency),
            MetricUnit::Milliseconds,
            MetricKind::ApiRequest {
                url: url.to_string(),
                attempt,
                status,
                error: Some(error.to_string()),
            },
        )
    }

    pub fn api_cache_hit(url: &str, latency: Duration) -> Self {
        Self::new(
            API_CACHE_HIT,
            millis(latency),
            MetricUnit::Milliseconds,
            MetricKind::ApiCacheHit {
                url: url.to_string(),
            },
        )
    }

    pub fn api_batch(batch_size: usize, failed: usize, elapsed: Duration) -> Self {
        Self::new(
            API_BATCH_REQUEST,
            millis(elapsed),
            MetricUnit::Milliseconds,
            MetricKind::ApiBatch { batch_size, failed },
        )
    }

    pub fn vital(vital: WebVital, value: f64) -> Self {
        Self::new(
            vital.name(),
            value,
            vital.unit(),
            MetricKind::WebVital {
                vital,
                rating: vital.rating(value),
            },
        )
    }

    pub fn timing(name: impl Into<String>, elapsed: Duration, id: Option<String>) -> Self {
        Self::new(
            name,
            millis(elapsed),
            MetricUnit::Milliseconds,
            MetricKind::Timing { id },
        )
    }

    pub fn memory(used: u64, total: u64) -> Self {
        Self::new(
            MEMORY_USAGE,
            used as f64,
            MetricUnit::Bytes,
            MetricKind::Memory { total },
        )
    }

    /// The vital this metric reports, if any.
    pub fn as_vital(&self) -> Option<WebVital> {
        match self.kind {
            MetricKind::WebVital { vital, .. } => Some(vital),
            _ => None,
        }
    }
}

/// Duration as fractional milliseconds.
pub fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
