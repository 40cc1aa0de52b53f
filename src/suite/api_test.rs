//! API latency and error-rate check.
//!
//! Probes endpoints directly through the transport, bypassing the cache, so
//! every request measures the network.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use super::result::{EndpointError, TestDetails, TestResult};
use super::{PerformanceBudgets, PerformanceTest};
use crate::client::{OptimizedFetcher, RequestOptions, Transport};
use crate::monitor::millis;

pub struct ApiPerformanceTest {
    transport: Arc<dyn Transport>,
    endpoints: Vec<String>,
    request_count: usize,
    latency_budget_ms: f64,
    error_rate_budget: f64,
    fetcher: Option<OptimizedFetcher>,
}

impl ApiPerformanceTest {
    pub const NAME: &'static str = "API Performance";

    pub fn new(transport: Arc<dyn Transport>, endpoints: Vec<String>, request_count: usize) -> Self {
        let budgets = PerformanceBudgets::default();
        Self {
            transport,
            endpoints,
            request_count,
            latency_budget_ms: budgets.api_response_time_ms,
            error_rate_budget: budgets.api_error_rate,
            fetcher: None,
        }
    }

    /// Probes through the fetcher's transport and attaches its API report.
    pub fn for_fetcher(fetcher: &OptimizedFetcher, endpoints: Vec<String>, request_count: usize) -> Self {
        Self {
            fetcher: Some(fetcher.clone()),
            ..Self::new(Arc::clone(fetcher.transport()), endpoints, request_count)
        }
    }

    pub fn with_budgets(mut self, budgets: &PerformanceBudgets) -> Self {
        self.latency_budget_ms = budgets.api_response_time_ms;
        self.error_rate_budget = budgets.api_error_rate;
        self
    }
}

#[async_trait]
impl PerformanceTest for ApiPerformanceTest {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run_test(&self) -> anyhow::Result<TestResult> {
        let api_report = match &self.fetcher {
            Some(fetcher) => Some(fetcher.api_report().await),
            None => None,
        };

        let options = RequestOptions::get();
        let mut response_times_ms = Vec::new();
        let mut errors = Vec::new();

        for endpoint in &self.endpoints {
            for _ in 0..self.request_count {
                let started = Instant::now();
                match self.transport.send(endpoint, &options).await {
                    Ok(response) => {
                        response_times_ms.push(millis(started.elapsed()));
                        if !response.is_success() {
                            errors.push(EndpointError {
                                endpoint: endpoint.clone(),
                                status: Some(response.status),
                                message: response.status_text,
                            });
                        }
                    }
                    Err(err) => errors.push(EndpointError {
                        endpoint: endpoint.clone(),
                        status: err.status(),
                        message: err.to_string(),
                    }),
                }
            }
        }

        let total_requests = self.request_count * self.endpoints.len();
        let average = if response_times_ms.is_empty() {
            0.0
        } else {
            response_times_ms.iter().sum::<f64>() / response_times_ms.len() as f64
        };
        let error_rate = if total_requests == 0 {
            0.0
        } else {
            errors.len() as f64 / total_requests as f64 * 100.0
        };

        let mut result = TestResult::new(Self::NAME);
        result.add_metric("average_response_time", average, Some(self.latency_budget_ms));
        result.add_metric("error_rate", error_rate, Some(self.error_rate_budget));
        result.add_metric("total_requests", total_requests as f64, None);
        result.passed = average <= self.latency_budget_ms && error_rate <= self.error_rate_budget;
        result.details = TestDetails::ApiPerformance {
            response_times_ms,
            errors,
            api_report,
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::RoutedTransport;
    use crate::client::TransportResponse;
    use crate::error::FetchError;
    use serde_json::json;
    use std::time::Duration;

    fn endpoints() -> Vec<String> {
        vec!["/api/filters".into(), "/api/collect-prices".into()]
    }

    #[tokio::test]
    async fn test_healthy_endpoints_pass() {
        let transport = RoutedTransport::new(|_: &str| Ok(TransportResponse::json(200, &json!({}))));

        let result = ApiPerformanceTest::new(transport.clone(), endpoints(), 5)
            .run_test()
            .await
            .unwrap();

        assert!(result.passed);
        assert_eq!(transport.calls(), 10);
        assert_eq!(result.metric("total_requests").unwrap().value, 10.0);
        assert_eq!(result.metric("error_rate").unwrap().value, 0.0);
    }

    #[tokio::test]
    async fn test_error_rate_over_budget_fails() {
        let transport = RoutedTransport::new(|url: &str| {
            if url.ends_with("prices") {
                Ok(TransportResponse::json(500, &json!({})))
            } else {
                Err(FetchError::Network("connection refused".into()))
            }
        });

        let result = ApiPerformanceTest::new(transport, endpoints(), 2)
            .run_test()
            .await
            .unwrap();

        assert!(!result.passed);
        assert_eq!(result.metric("error_rate").unwrap().value, 100.0);
        match &result.details {
            TestDetails::ApiPerformance { errors, response_times_ms, .. } => {
                assert_eq!(errors.len(), 4);
                assert_eq!(response_times_ms.len(), 2);
                assert!(errors.iter().any(|e| e.status == Some(500)));
            }
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_endpoint_fails_latency_budget() {
        let transport = RoutedTransport::slow(
            |_: &str| Ok(TransportResponse::json(200, &json!({}))),
            Duration::from_millis(30),
        );
        let budgets = PerformanceBudgets {
            api_response_time_ms: 10.0,
            ..PerformanceBudgets::default()
        };

        let result = ApiPerformanceTest::new(transport, vec!["/slow".into()], 2)
            .with_budgets(&budgets)
            .run_test()
            .await
            .unwrap();

        assert!(!result.passed);
        assert!(!result.metric("average_response_time").unwrap().passed);
    }

    #[tokio::test]
    async fn test_no_endpoints_passes() {
        let transport = RoutedTransport::new(|_: &str| Ok(TransportResponse::json(200, &json!({}))));
        let result = ApiPerformanceTest::new(transport, Vec::new(), 10)
            .run_test()
            .await
            .unwrap();
        assert!(result.passed);
    }
}
