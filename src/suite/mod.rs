//! Synthetic Test Suite
//!
//! Pluggable performance checks held to budgets, run sequentially, with
//! prioritized remediation advice for whatever fails.

mod api_test;
mod result;
mod runner;
mod vitals_test;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::monitor::WebVital;

pub use api_test::ApiPerformanceTest;
pub use load_test::LoadTest;
pub use memory_test::{MemoryLeakTest, MemoryProbe, MemorySample, ProcessMemoryProbe, LEAK_THRESHOLD_BYTES};
pub use regression_test::{RegressionTest, REGRESSION_TOLERANCE};
pub use result::{
    EndpointError, MemorySnapshot, MetricCheck, Regression, TestDetails, TestResult, UserOutcome,
};
pub use runner::{
    recommendations, run_basic_performance_tests, PerformanceTestSuite, Priority, Recommendation,
    SuiteContext, SuiteReport, SuiteSummary,
};
pub use vitals_test::CoreWebVitalsTest;

/// A check the suite can run.
///
/// Returning `Err` (or panicking) yields a failed result carrying the message.
#[async_trait]
pub trait PerformanceTest: Send + Sync {
    fn name(&self) -> &str;

    async fn run_test(&self) -> anyhow::Result<TestResult>;
}

// == Budgets ==
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceBudgets {
    pub fcp_ms: f64,
    pub lcp_ms: f64,
    pub fid_ms: f64,
    pub cls: f64,
    pub ttfb_ms: f64,
    pub api_response_time_ms: f64,
    /// Percent
    pub api_error_rate: f64,
    pub memory_usage_bytes: f64,
}

impl Default for PerformanceBudgets {
    fn default() -> Self {
        Self {
            fcp_ms: 1800.0,
            lcp_ms: 2500.0,
            fid_ms: 100.0,
            cls: 0.1,
            ttfb_ms: 800.0,
            api_response_time_ms: 1000.0,
            api_error_rate: 5.0,
            memory_usage_bytes: 50_000_000.0,
        }
    }
}

impl PerformanceBudgets {
    /// Budget per Web Vital.
    pub fn vitals(&self) -> BTreeMap<WebVital, f64> {
        BTreeMap::from([
            (WebVital::Fcp, self.fcp_ms),
            (WebVital::Lcp, self.lcp_ms),
            (WebVital::Fid, self.fid_ms),
            (WebVital::Cls, self.cls),
            (WebVital::Ttfb, self.ttfb_ms),
        ])
    }
}
