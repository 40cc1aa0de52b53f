//! API Module
//!
//! HTTP handlers and routing for the dashboard REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /api/fetch?url=&batched=&dedupe=` - Cached, retrying fetch from an allowed upstream
//! - `POST /api/metrics` - Record a browser metric
//! - `GET /api/metrics/report` - Monitor report
//! - `GET /api/performance/report` - API performance report
//! - `POST /api/performance/tests` - Run the basic performance suite
//! - `GET /api/cache/stats` - Cache statistics
//! - `DELETE /api/cache` - Drop every cached response

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
