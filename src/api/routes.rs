//! API Routes
//!
//! Configures the Axum router with all dashboard endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    api_report_handler, cache_stats_handler, clear_cache_handler, fetch_handler, health_handler,
    monitor_report_handler, record_metric_handler, run_tests_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: the dashboard page posts metrics from another origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/fetch", get(fetch_handler))
        .route("/metrics", post(record_metric_handler))
        .route("/metrics/report", get(monitor_report_handler))
        .route("/performance/report", get(api_report_handler))
        .route("/performance/tests", post(run_tests_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache", delete(clear_cache_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
