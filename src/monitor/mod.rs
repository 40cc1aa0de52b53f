//! Performance Monitor Module
//!
//! Typed metrics, Web Vitals ingestion, timing marks and reporting.

mod buffer;
mod collector;
mod metric;
mod report;
mod vitals;

pub use self::buffer::MetricBuffer;
pub use self::collector::{
    PerformanceMonitor, Subscription, VitalsListener, DEFAULT_SAMPLES_PER_METRIC, SLOW_METRIC_THRESHOLD,
};
pub use self::metric::{
    millis, MetricKind, MetricUnit, NavigationPhase, PerformanceMetric, API_BATCH_REQUEST,
    API_CACHE_HIT, API_REQUEST_ERROR, API_REQUEST_SUCCESS, MEMORY_USAGE, PAGE_LOAD,
    TIME_TO_INTERACTIVE,
};
pub use self::report::{
    MemoryReport, MonitorReport, ReportSummary, ResourceBreakdown, ResourceSummary,
    TimingSummary, VitalReport,
};
pub use self::vitals::{NavigationTiming, ResourceKind, ResourceTiming, VitalRating, WebVital};
