//! Request and Response models for the dashboard API
//!
//! DTOs for query strings and JSON bodies; report endpoints reuse the
//! report types from `monitor`, `client` and `suite`.

pub mod requests;
pub mod responses;

pub use requests::{FetchQuery, MetricRequest};
pub use responses::{
    CacheClearedResponse, ErrorResponse, FetchResponse, HealthResponse, MetricRecorded,
};
