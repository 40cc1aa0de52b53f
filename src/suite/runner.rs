//! Suite runner and recommendations.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use super::api_test::ApiPerformanceTest;
use super::memory_test::{MemoryLeakTest, MemoryProbe, ProcessMemoryProbe};
use super::result::TestResult;
use super::vitals_test::CoreWebVitalsTest;
use super::{PerformanceBudgets, PerformanceTest};
use crate::client::OptimizedFetcher;
use crate::config::Config;
use crate::monitor::{millis, PerformanceMonitor};

// == Report ==
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub summary: SuiteSummary,
    pub results: Vec<TestResult>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteSummary {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    /// Percent of tests passed, 0 for an empty suite
    pub success_rate: f64,
    pub total_time_ms: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// How far over its threshold a value is.
    pub fn for_overrun(value: f64, threshold: f64) -> Self {
        let ratio = value / threshold;
        if ratio > 2.0 {
            Priority::High
        } else if ratio > 1.5 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: Priority,
    pub metric: String,
    pub message: String,
    pub suggestions: Vec<String>,
}

fn suggestions_for(metric: &str) -> &'static [&'static str] {
    match metric {
        "fcp" => &[
            "Optimize critical rendering path",
            "Inline critical CSS",
            "Reduce render-blocking resources",
        ],
        "lcp" => &[
            "Optimize images",
            "Improve server response times",
            "Remove render-blocking JavaScript",
        ],
        "fid" => &[
            "Reduce JavaScript execution time",
            "Code split large bundles",
            "Use web workers for heavy tasks",
        ],
        "cls" => &[
            "Include size attributes on images and videos",
            "Never insert content above existing content",
            "Use CSS transform animations",
        ],
        "average_response_time" => &[
            "Implement request caching",
            "Use CDN for static assets",
            "Optimize database queries",
        ],
        "memory_increase" => &[
            "Check for memory leaks",
            "Release listeners and timers on teardown",
            "Bound long-lived buffers and caches",
        ],
        _ => &["Review and optimize this metric"],
    }
}

/// One recommendation per over-threshold metric of every failed test,
/// highest priority first.
pub fn recommendations(results: &[TestResult]) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = results
        .iter()
        .filter(|result| !result.passed)
        .flat_map(|result| result.metrics.iter())
        .filter_map(|(metric, check)| {
            let threshold = check.threshold?;
            if check.passed || threshold == 0.0 {
                return None;
            }
            Some(Recommendation {
                kind: "performance".to_string(),
                priority: Priority::for_overrun(check.value, threshold),
                metric: metric.clone(),
                message: format!("{metric} ({:.2}) exceeds threshold ({threshold})", check.value),
                suggestions: suggestions_for(metric)
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            })
        })
        .collect();

    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
    recommendations
}

// == Suite ==
/// Runs registered tests one at a time, in insertion order.
#[derive(Default)]
pub struct PerformanceTestSuite {
    tests: Vec<Arc<dyn PerformanceTest>>,
    results: Vec<TestResult>,
}

impl PerformanceTestSuite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_test(&mut self, test: impl PerformanceTest + 'static) {
        self.tests.push(Arc::new(test));
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Results of the last run.
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Runs every test and reports. A test that errors or panics becomes a
    /// failed result; the suite always finishes.
    pub async fn run_all_tests(&mut self) -> SuiteReport {
        info!(test_count = self.tests.len(), "starting performance test suite");
        let started = Instant::now();
        self.results.clear();

        for test in &self.tests {
            let result = run_isolated(Arc::clone(test)).await;
            if result.passed {
                info!(test = %result.test_name, metrics = ?result.metrics, "test passed");
            } else {
                error!(test = %result.test_name, error = ?result.error(), metrics = ?result.metrics, "test failed");
            }
            self.results.push(result);
        }

        let report = self.report(started.elapsed());
        info!(
            total = report.summary.total_tests,
            passed = report.summary.passed_tests,
            failed = report.summary.failed_tests,
            total_time_ms = report.summary.total_time_ms,
            "performance test suite completed"
        );
        report
    }

    fn report(&self, elapsed: Duration) -> SuiteReport {
        let total_tests = self.results.len();
        let passed_tests = self.results.iter().filter(|r| r.passed).count();

        SuiteReport {
            summary: SuiteSummary {
                total_tests,
                passed_tests,
                failed_tests: total_tests - passed_tests,
                success_rate: if total_tests == 0 {
                    0.0
                } else {
                    passed_tests as f64 / total_tests as f64 * 100.0
                },
                total_time_ms: millis(elapsed),
                timestamp: Utc::now(),
            },
            results: self.results.clone(),
            recommendations: recommendations(&self.results),
        }
    }
}

async fn run_isolated(test: Arc<dyn PerformanceTest>) -> TestResult {
    let name = test.name().to_string();
    match tokio::spawn(async move { test.run_test().await }).await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => TestResult::failed(name, format!("{err:#}")),
        Err(join_error) => {
            let message = match join_error.try_into_panic() {
                Ok(panic) => panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string()),
                Err(_) => "test task cancelled".to_string(),
            };
            TestResult::failed(name, format!("test panicked: {message}"))
        }
    }
}

// == Basic Run ==
/// Collaborators of [`run_basic_performance_tests`].
#[derive(Clone)]
pub struct SuiteContext {
    pub monitor: Arc<PerformanceMonitor>,
    pub fetcher: OptimizedFetcher,
    pub probe: Arc<dyn MemoryProbe>,
    pub endpoints: Vec<String>,
    pub budgets: PerformanceBudgets,
    pub memory_test_duration: Duration,
    pub api_requests_per_endpoint: usize,
}

impl SuiteContext {
    pub fn new(monitor: Arc<PerformanceMonitor>, fetcher: OptimizedFetcher, endpoints: Vec<String>) -> Self {
        Self {
            monitor,
            fetcher,
            probe: Arc::new(ProcessMemoryProbe::new()),
            endpoints,
            budgets: PerformanceBudgets::default(),
            memory_test_duration: Duration::from_secs(10),
            api_requests_per_endpoint: 10,
        }
    }

    pub fn from_config(config: &Config, monitor: Arc<PerformanceMonitor>, fetcher: OptimizedFetcher) -> Self {
        Self::new(monitor, fetcher, config.perf_test_endpoints.clone())
    }
}

/// Core Web Vitals, a memory growth run and an API probe of the context's
/// endpoints.
pub async fn run_basic_performance_tests(ctx: &SuiteContext) -> SuiteReport {
    let mut suite = PerformanceTestSuite::new();

    suite.add_test(CoreWebVitalsTest::with_budgets(
        Arc::clone(&ctx.monitor),
        &ctx.budgets,
    ));
    suite.add_test(
        MemoryLeakTest::new(Arc::clone(&ctx.probe), ctx.memory_test_duration)
            .with_budgets(&ctx.budgets)
            .with_monitor(Arc::clone(&ctx.monitor)),
    );
    suite.add_test(
        ApiPerformanceTest::for_fetcher(
            &ctx.fetcher,
            ctx.endpoints.clone(),
            ctx.api_requests_per_endpoint,
        )
        .with_budgets(&ctx.budgets),
    );

    suite.run_all_tests().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::result::{MetricCheck, TestDetails};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Fixed {
        name: &'static str,
        result: fn() -> anyhow::Result<TestResult>,
        log: Option<Arc<Mutex<Vec<&'static str>>>>,
    }

    #[async_trait]
    impl PerformanceTest for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn run_test(&self) -> anyhow::Result<TestResult> {
            if let Some(log) = &self.log {
                log.lock().unwrap().push(self.name);
            }
            (self.result)()
        }
    }

    fn fixed(name: &'static str, result: fn() -> anyhow::Result<TestResult>) -> Fixed {
        Fixed {
            name,
            result,
            log: None,
        }
    }

    fn passing() -> anyhow::Result<TestResult> {
        let mut result = TestResult::new("ok");
        result.passed = true;
        Ok(result)
    }

    fn slow_api() -> anyhow::Result<TestResult> {
        let mut result = TestResult::new("api");
        result.add_metric("average_response_time", 2500.0, Some(1000.0));
        result.add_metric("error_rate", 6.0, Some(5.0));
        result.add_metric("total_requests", 20.0, None);
        Ok(result)
    }

    struct Panicking;

    #[async_trait]
    impl PerformanceTest for Panicking {
        fn name(&self) -> &str {
            "Panicking"
        }

        async fn run_test(&self) -> anyhow::Result<TestResult> {
            panic!("test exploded")
        }
    }

    #[tokio::test]
    async fn test_errors_and_panics_become_failed_results() {
        let mut suite = PerformanceTestSuite::new();
        suite.add_test(fixed("erroring", || anyhow::bail!("endpoint list empty")));
        suite.add_test(Panicking);
        suite.add_test(fixed("ok", passing));

        let report = suite.run_all_tests().await;

        assert_eq!(report.summary.total_tests, 3);
        assert_eq!(report.summary.passed_tests, 1);
        assert_eq!(report.summary.failed_tests, 2);
        assert_eq!(report.results[0].test_name, "erroring");
        assert_eq!(report.results[0].error(), Some("endpoint list empty"));
        assert!(report.results[1].error().unwrap().contains("test exploded"));
        assert!(report.results[2].passed);
    }

    #[tokio::test]
    async fn test_tests_run_in_insertion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut suite = PerformanceTestSuite::new();
        for name in ["first", "second", "third"] {
            suite.add_test(Fixed {
                name,
                result: passing,
                log: Some(Arc::clone(&log)),
            });
        }

        suite.run_all_tests().await;

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_recommendations_sorted_by_priority() {
        let mut suite = PerformanceTestSuite::new();
        suite.add_test(fixed("api", slow_api));

        let report = suite.run_all_tests().await;
        let recs = &report.recommendations;

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].metric, "average_response_time");
        assert_eq!(recs[0].priority, Priority::High);
        assert_eq!(recs[0].suggestions[0], "Implement request caching");
        assert_eq!(recs[1].metric, "error_rate");
        assert_eq!(recs[1].priority, Priority::Low);
        assert_eq!(recs[1].suggestions, vec!["Review and optimize this metric"]);
        assert_eq!(recs[0].message, "average_response_time (2500.00) exceeds threshold (1000)");
    }

    #[test]
    fn test_passed_tests_yield_no_recommendations() {
        let mut result = TestResult::new("vitals");
        result.passed = true;
        result
            .metrics
            .insert("lcp".into(), MetricCheck::new(9000.0, Some(2500.0)));
        assert!(recommendations(&[result]).is_empty());
    }

    #[test]
    fn test_priority_bands() {
        assert_eq!(Priority::for_overrun(2100.0, 1000.0), Priority::High);
        assert_eq!(Priority::for_overrun(1600.0, 1000.0), Priority::Medium);
        assert_eq!(Priority::for_overrun(1100.0, 1000.0), Priority::Low);
    }

    #[tokio::test]
    async fn test_empty_suite() {
        let report = PerformanceTestSuite::new().run_all_tests().await;
        assert_eq!(report.summary.total_tests, 0);
        assert_eq!(report.summary.success_rate, 0.0);
        assert!(matches!(
            TestResult::failed("x", "y").details,
            TestDetails::Error { .. }
        ));
    }
}
