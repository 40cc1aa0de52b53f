//! Request DTOs for the dashboard API
//!
//! Defines the structure of incoming query strings and JSON bodies.

use serde::Deserialize;

use crate::monitor::{MetricUnit, NavigationTiming, ResourceTiming, WebVital};

/// Query string of `GET /api/fetch`
///
/// # Fields
/// - `url`: Upstream URL to fetch
/// - `batched`: Route the call through the request batcher
/// - `dedupe`: Share the result with identical calls already in flight
#[derive(Debug, Clone, Deserialize)]
pub struct FetchQuery {
    pub url: String,
    #[serde(default)]
    pub batched: bool,
    #[serde(default)]
    pub dedupe: bool,
}

impl FetchQuery {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        let url = self.url.trim();
        if url.is_empty() {
            return Some("url cannot be empty".to_string());
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Some("url must be an absolute http(s) URL".to_string());
        }
        None
    }
}

/// Body of `POST /api/metrics`, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricRequest {
    Vital {
        name: WebVital,
        value: f64,
    },
    LayoutShift {
        value: f64,
        #[serde(default)]
        had_recent_input: bool,
    },
    PageLoad(NavigationTiming),
    Resource(ResourceTiming),
    Memory {
        used: u64,
        total: u64,
    },
    Custom {
        name: String,
        value: f64,
        #[serde(default = "default_unit")]
        unit: MetricUnit,
        #[serde(default)]
        label: Option<String>,
    },
}

fn default_unit() -> MetricUnit {
    MetricUnit::Milliseconds
}

impl MetricRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match self {
            MetricRequest::Vital { value, .. } | MetricRequest::LayoutShift { value, .. } => {
                non_negative(*value)
            }
            MetricRequest::PageLoad(timing) => [
                timing.request_start,
                timing.response_start,
                timing.dom_interactive,
                timing.load_event_end,
            ]
            .into_iter()
            .find_map(non_negative),
            MetricRequest::Resource(resource) => non_negative(resource.duration_ms),
            MetricRequest::Memory { used, total } if used > total => {
                Some("used memory cannot exceed total".to_string())
            }
            MetricRequest::Memory { .. } => None,
            MetricRequest::Custom { name, value, .. } => {
                if name.trim().is_empty() {
                    Some("metric name cannot be empty".to_string())
                } else if !value.is_finite() {
                    Some("metric value must be finite".to_string())
                } else {
                    None
                }
            }
        }
    }
}

fn non_negative(value: f64) -> Option<String> {
    if value.is_finite() && value >= 0.0 {
        None
    } else {
        Some(format!("value must be a finite non-negative number, got {value}"))
    }
}
