//! Response DTOs for the dashboard API
//!
//! Report endpoints serialize the report types directly; the bodies here
//! cover the remaining routes.

use serde::Serialize;
use serde_json::Value;

/// Response body for `GET /api/fetch`
#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    pub url: String,
    pub batched: bool,
    pub data: Value,
}

impl FetchResponse {
    pub fn new(url: impl Into<String>, batched: bool, data: Value) -> Self {
        Self {
            url: url.into(),
            batched,
            data,
        }
    }
}

/// Response body for `POST /api/metrics`
#[derive(Debug, Clone, Serialize)]
pub struct MetricRecorded {
    /// Metrics held by the monitor after recording
    pub stored: usize,
    /// Running CLS, only for layout shift submissions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cls: Option<f64>,
}

/// Response body for `DELETE /api/cache`
#[derive(Debug, Clone, Serialize)]
pub struct CacheClearedResponse {
    pub message: String,
    /// Entries dropped by the clear
    pub removed: usize,
}

impl CacheClearedResponse {
    pub fn new(removed: usize) -> Self {
        Self {
            message: format!("Cleared {removed} cached responses"),
            removed,
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub version: &'static str,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Error body, mirrors what `AppError` renders
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
