//! Error types for the API layer and the dashboard service
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Fetch Error Enum ==
/// Failure of a single fetch attempt or of a whole fetch call.
///
/// `Clone` so that deduplicated and batched callers can each receive the
/// shared outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Upstream answered with a non-2xx status
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },

    /// Attempt exceeded its timeout and was cancelled
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection or transport level failure
    #[error("network error: {0}")]
    Network(String),

    /// Response body was not valid JSON
    #[error("invalid JSON response: {0}")]
    Decode(String),

    /// Every allowed attempt failed with a retryable error
    #[error("request failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<FetchError> },

    /// Batch item was dropped before its batch ran
    #[error("batched request was dropped before completion")]
    BatchDropped,

    /// Concurrency limiter was shut down
    #[error("concurrency limiter closed")]
    LimiterClosed,
}

impl FetchError {
    // == Retry Classification ==
    /// Whether another attempt may succeed.
    ///
    /// Timeouts and not-found responses (404/410) are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout(_) => false,
            FetchError::Http { status, .. } => !matches!(status, 404 | 410),
            FetchError::Network(_) | FetchError::Decode(_) => true,
            FetchError::RetriesExhausted { .. }
            | FetchError::BatchDropped
            | FetchError::LimiterClosed => false,
        }
    }

    /// HTTP status carried by this error, looking through retry exhaustion.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            FetchError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Short machine-readable label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Http { .. } => "http",
            FetchError::Timeout(_) => "timeout",
            FetchError::Network(_) => "network",
            FetchError::Decode(_) => "decode",
            FetchError::RetriesExhausted { .. } => "retries_exhausted",
            FetchError::BatchDropped => "batch_dropped",
            FetchError::LimiterClosed => "limiter_closed",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

// == App Error Enum ==
/// Error type for the dashboard HTTP surface.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested URL is outside the configured upstream origins
    #[error("Upstream not allowed: {0}")]
    UpstreamNotAllowed(String),

    /// Upstream fetch failed
    #[error("Upstream error: {0}")]
    Upstream(#[from] FetchError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamNotAllowed(_) => StatusCode::FORBIDDEN,
            AppError::Upstream(err) => upstream_status(err),
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

fn upstream_status(err: &FetchError) -> StatusCode {
    match err {
        FetchError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        FetchError::Http { status: 404, .. } | FetchError::Http { status: 410, .. } => {
            StatusCode::NOT_FOUND
        }
        FetchError::RetriesExhausted { last, .. } => upstream_status(last),
        _ => StatusCode::BAD_GATEWAY,
    }
}

// == Result Type Alias ==
/// Convenience Result type for the dashboard service.
pub type Result<T> = std::result::Result<T, AppError>;
