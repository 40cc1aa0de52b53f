//! API Handlers
//!
//! HTTP request handlers for the dashboard endpoints.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::debug;

use crate::cache::{shared, CacheStats, CacheStore, SharedCache};
use crate::client::{
    ApiPerformanceReport, OptimizedFetcher, ReqwestTransport, RequestBatcher, RequestOptions,
    Transport,
};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    CacheClearedResponse, FetchQuery, FetchResponse, HealthResponse, MetricRecorded,
    MetricRequest,
};
use crate::monitor::{MetricKind, MonitorReport, PerformanceMetric, PerformanceMonitor};
use crate::suite::{run_basic_performance_tests, SuiteContext, SuiteReport};

/// Application state shared across all handlers.
///
/// Every component is shared: the fetcher, batcher and suite all see the
/// same cache and monitor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: SharedCache,
    pub monitor: Arc<PerformanceMonitor>,
    pub fetcher: OptimizedFetcher,
    pub batcher: RequestBatcher,
    pub suite: SuiteContext,
}

impl AppState {
    /// State talking to real upstreams over reqwest.
    pub fn from_config(config: &Config) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// State with a custom transport, used to point the fetcher elsewhere.
    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let cache = shared(CacheStore::new(config.cache_max_entries, config.cache_ttl()));
        let monitor = Arc::new(PerformanceMonitor::new(config.metrics_capacity));
        let fetcher =
            OptimizedFetcher::from_config(config, cache.clone(), Arc::clone(&monitor), transport);
        let batcher = RequestBatcher::from_config(config, fetcher.clone());
        let suite = SuiteContext::from_config(config, Arc::clone(&monitor), fetcher.clone());

        Self {
            config: Arc::new(config.clone()),
            cache,
            monitor,
            fetcher,
            batcher,
            suite,
        }
    }
}

/// Handler for GET /api/fetch
///
/// Proxies a JSON GET through the fetcher, the batcher (`batched=true`) or
/// the deduplicator (`dedupe=true`). Only configured upstream origins are
/// reachable.
pub async fn fetch_handler(
    State(state): State<AppState>,
    Query(query): Query<FetchQuery>,
) -> Result<Json<FetchResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let url = query.url.trim();
    if !state.config.allows_upstream(url) {
        return Err(AppError::UpstreamNotAllowed(url.to_string()));
    }

    let options = RequestOptions::get();
    let data = if query.batched {
        state.batcher.add(url, options).await?
    } else if query.dedupe {
        state.fetcher.fetch_deduped(url, &options).await?
    } else {
        state.fetcher.fetch(url, &options).await?
    };

    Ok(Json(FetchResponse::new(url, query.batched, data)))
}

/// Handler for POST /api/metrics
///
/// Records a metric reported by the browser.
pub async fn record_metric_handler(
    State(state): State<AppState>,
    Json(req): Json<MetricRequest>,
) -> Result<Json<MetricRecorded>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let monitor = &state.monitor;
    let mut cls = None;
    match req {
        MetricRequest::Vital { name, value } => monitor.record_vital(name, value),
        MetricRequest::LayoutShift {
            value,
            had_recent_input,
        } => cls = Some(monitor.record_layout_shift(value, had_recent_input)),
        MetricRequest::PageLoad(timing) => monitor.record_page_load(&timing),
        MetricRequest::Resource(resource) => monitor.record_resource(resource),
        MetricRequest::Memory { used, total } => monitor.record_memory(used, total),
        MetricRequest::Custom {
            name,
            value,
            unit,
            label,
        } => monitor.record_metric(PerformanceMetric::new(
            name,
            value,
            unit,
            MetricKind::Custom { label },
        )),
    }

    Ok(Json(MetricRecorded {
        stored: monitor.len(),
        cls,
    }))
}

/// Handler for GET /api/metrics/report
pub async fn monitor_report_handler(State(state): State<AppState>) -> Json<MonitorReport> {
    Json(state.monitor.generate_report())
}

/// Handler for GET /api/performance/report
pub async fn api_report_handler(State(state): State<AppState>) -> Json<ApiPerformanceReport> {
    Json(state.fetcher.api_report().await)
}

/// Handler for POST /api/performance/tests
///
/// Runs the basic suite to completion before answering.
pub async fn run_tests_handler(State(state): State<AppState>) -> Json<SuiteReport> {
    debug!(endpoints = state.suite.endpoints.len(), "running basic performance tests");
    Json(run_basic_performance_tests(&state.suite).await)
}

/// Handler for GET /api/cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    // Acquire read lock for stats
    let cache = state.cache.read().await;
    Json(cache.stats())
}

/// Handler for DELETE /api/cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<CacheClearedResponse> {
    let mut cache = state.cache.write().await;
    let removed = cache.len();
    cache.clear();

    Json(CacheClearedResponse::new(removed))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
