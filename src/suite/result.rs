//! Test results and their typed details.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::ApiPerformanceReport;
use crate::monitor::{VitalReport, WebVital};

// == Metric Check ==
/// One measured value and the budget it was held to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricCheck {
    pub value: f64,
    /// `None` for informational metrics, which always pass
    pub threshold: Option<f64>,
    pub passed: bool,
}

impl MetricCheck {
    pub fn new(value: f64, threshold: Option<f64>) -> Self {
        Self {
            value,
            threshold,
            passed: threshold.map_or(true, |limit| value <= limit),
        }
    }
}

// == Details ==
#[derive(Debug, Clone, Serialize)]
pub struct MemorySnapshot {
    pub elapsed_ms: u64,
    pub used: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointError {
    pub endpoint: String,
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserOutcome {
    pub user_id: usize,
    pub response_time_ms: f64,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Regression {
    pub metric: String,
    pub baseline: f64,
    pub current: f64,
    /// Percent above baseline
    pub regression: f64,
}

/// Test-specific payload attached to a [`TestResult`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestDetails {
    None,
    CoreWebVitals {
        vitals: BTreeMap<WebVital, VitalReport>,
    },
    MemoryLeak {
        snapshots: Vec<MemorySnapshot>,
        duration_ms: u64,
    },
    ApiPerformance {
        response_times_ms: Vec<f64>,
        errors: Vec<EndpointError>,
        api_report: Option<ApiPerformanceReport>,
    },
    Load {
        users: Vec<UserOutcome>,
        concurrent_users: usize,
    },
    Regression {
        regressions: Vec<Regression>,
        baseline: BTreeMap<String, f64>,
    },
    /// The test could not run or failed unexpectedly
    Error { message: String },
}

// == Test Result ==
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub test_name: String,
    pub passed: bool,
    pub metrics: BTreeMap<String, MetricCheck>,
    pub details: TestDetails,
    pub timestamp: DateTime<Utc>,
}

impl TestResult {
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            passed: false,
            metrics: BTreeMap::new(),
            details: TestDetails::None,
            timestamp: Utc::now(),
        }
    }

    /// Failed result carrying an error message.
    pub fn failed(test_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            details: TestDetails::Error {
                message: message.into(),
            },
            ..Self::new(test_name)
        }
    }

    pub fn add_metric(&mut self, name: impl Into<String>, value: f64, threshold: Option<f64>) {
        self.metrics
            .insert(name.into(), MetricCheck::new(value, threshold));
    }

    pub fn metric(&self, name: &str) -> Option<&MetricCheck> {
        self.metrics.get(name)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.details {
            TestDetails::Error { message } => Some(message),
            _ => None,
        }
    }
}
