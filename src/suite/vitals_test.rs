//! Core Web Vitals budget check.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::warn;

use super::result::{TestDetails, TestResult};
use super::{PerformanceBudgets, PerformanceTest};
use crate::monitor::{PerformanceMonitor, WebVital};

pub struct CoreWebVitalsTest {
    monitor: Arc<PerformanceMonitor>,
    budgets: BTreeMap<WebVital, f64>,
    timeout: Duration,
    poll_interval: Duration,
}

impl CoreWebVitalsTest {
    pub const NAME: &'static str = "Core Web Vitals";

    pub fn new(monitor: Arc<PerformanceMonitor>) -> Self {
        Self::with_budgets(monitor, &PerformanceBudgets::default())
    }

    pub fn with_budgets(monitor: Arc<PerformanceMonitor>, budgets: &PerformanceBudgets) -> Self {
        Self {
            monitor,
            budgets: budgets.vitals(),
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
        }
    }

    /// How long to wait for the first vital before judging what is there.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn wait_for_vitals(&self) {
        let started = Instant::now();
        while self.monitor.latest_vitals().is_empty() && started.elapsed() <= self.timeout {
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl PerformanceTest for CoreWebVitalsTest {
    fn name(&self) -> &str {
        Self::NAME
    }

    /// Passes when every reported vital is within budget. Vitals never
    /// reported are not judged.
    async fn run_test(&self) -> anyhow::Result<TestResult> {
        self.wait_for_vitals().await;

        let report = self.monitor.generate_report();
        let mut result = TestResult::new(Self::NAME);
        let mut all_passed = true;

        for (vital, budget) in &self.budgets {
            let Some(reported) = report.vitals.get(vital) else {
                continue;
            };
            result.add_metric(vital.name(), reported.value, Some(*budget));
            if reported.value > *budget {
                all_passed = false;
                warn!(
                    vital = %vital,
                    value = reported.value,
                    budget,
                    difference = reported.value - budget,
                    "core web vital over budget"
                );
            }
        }

        result.passed = all_passed;
        result.details = TestDetails::CoreWebVitals {
            vitals: report.vitals,
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::PerformanceMetric;

    #[tokio::test]
    async fn test_lcp_over_budget_fails_only_lcp() {
        let monitor = Arc::new(PerformanceMonitor::new(100));
        monitor.record_vital(WebVital::Fcp, 1200.0);
        monitor.record_vital(WebVital::Lcp, 3000.0);
        monitor.record_vital(WebVital::Fid, 40.0);
        monitor.record_vital(WebVital::Cls, 0.05);
        monitor.record_vital(WebVital::Ttfb, 300.0);

        let result = CoreWebVitalsTest::new(monitor).run_test().await.unwrap();

        assert!(!result.passed);
        assert!(!result.metric("lcp").unwrap().passed);
        for name in ["fcp", "fid", "cls", "ttfb"] {
            assert!(result.metric(name).unwrap().passed, "{name} should pass");
        }
    }

    #[tokio::test]
    async fn test_lcp_survives_heavy_api_traffic() {
        let monitor = Arc::new(PerformanceMonitor::default());
        monitor.record_vital(WebVital::Lcp, 3000.0);
        for _ in 0..1000 {
            monitor.record_metric(PerformanceMetric::api_success(
                "https://api.pokemontcg.io/v2/cards",
                1,
                200,
                Duration::from_millis(25),
            ));
        }

        let result = CoreWebVitalsTest::new(monitor).run_test().await.unwrap();

        assert!(!result.passed);
        let lcp = result.metric("lcp").expect("lcp should still be reported");
        assert_eq!(lcp.value, 3000.0);
        assert!(!lcp.passed);
    }

    #[tokio::test]
    async fn test_within_budget_passes() {
        let monitor = Arc::new(PerformanceMonitor::new(100));
        monitor.record_vital(WebVital::Lcp, 2000.0);

        let result = CoreWebVitalsTest::new(monitor).run_test().await.unwrap();

        assert!(result.passed);
        assert_eq!(result.metrics.len(), 1);
    }

    #[tokio::test]
    async fn test_waits_for_late_vitals() {
        let monitor = Arc::new(PerformanceMonitor::new(100));
        let reporter = Arc::clone(&monitor);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            reporter.record_vital(WebVital::Fid, 500.0);
        });

        let result = CoreWebVitalsTest::new(monitor).run_test().await.unwrap();

        assert!(!result.passed);
        assert_eq!(result.metric("fid").unwrap().value, 500.0);
    }

    #[tokio::test]
    async fn test_no_vitals_after_timeout() {
        let monitor = Arc::new(PerformanceMonitor::new(100));
        let test = CoreWebVitalsTest::new(monitor).with_timeout(Duration::from_millis(50));

        let result = test.run_test().await.unwrap();

        assert!(result.passed);
        assert!(result.metrics.is_empty());
    }
}
