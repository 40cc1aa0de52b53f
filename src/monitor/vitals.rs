//! Web Vitals
//!
//! Vital identifiers, their rating thresholds and the navigation/resource
//! timings reported by the browser.

use serde::{Deserialize, Serialize};

use super::metric::MetricUnit;

// == Web Vital ==
/// A Core Web Vital tracked by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebVital {
    /// First Contentful Paint
    Fcp,
    /// Largest Contentful Paint
    Lcp,
    /// First Input Delay
    Fid,
    /// Cumulative Layout Shift
    Cls,
    /// Time to First Byte
    Ttfb,
}

impl WebVital {
    pub const ALL: [WebVital; 5] = [
        WebVital::Fcp,
        WebVital::Lcp,
        WebVital::Fid,
        WebVital::Cls,
        WebVital::Ttfb,
    ];

    /// Metric name used when the vital is recorded.
    pub fn name(self) -> &'static str {
        match self {
            WebVital::Fcp => "fcp",
            WebVital::Lcp => "lcp",
            WebVital::Fid => "fid",
            WebVital::Cls => "cls",
            WebVital::Ttfb => "ttfb",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|vital| vital.name().eq_ignore_ascii_case(name))
    }

    /// CLS is a unitless score, every other vital is a duration.
    pub fn unit(self) -> MetricUnit {
        match self {
            WebVital::Cls => MetricUnit::Score,
            _ => MetricUnit::Milliseconds,
        }
    }

    /// (good, needs-improvement) upper bounds.
    fn thresholds(self) -> (f64, f64) {
        match self {
            WebVital::Fcp => (1800.0, 3000.0),
            WebVital::Lcp => (2500.0, 4000.0),
            WebVital::Fid => (100.0, 300.0),
            WebVital::Cls => (0.1, 0.25),
            WebVital::Ttfb => (800.0, 1800.0),
        }
    }

    pub fn good_threshold(self) -> f64 {
        self.thresholds().0
    }

    pub fn rating(self, value: f64) -> VitalRating {
        let (good, needs_improvement) = self.thresholds();
        if value <= good {
            VitalRating::Good
        } else if value <= needs_improvement {
            VitalRating::NeedsImprovement
        } else {
            VitalRating::Poor
        }
    }
}

impl std::fmt::Display for WebVital {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// == Rating ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VitalRating {
    Good,
    NeedsImprovement,
    Poor,
}

// == Navigation Timing ==
/// Navigation timing of a page load, in milliseconds since navigation start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavigationTiming {
    pub request_start: f64,
    pub response_start: f64,
    pub dom_interactive: f64,
    pub load_event_end: f64,
}

impl NavigationTiming {
    pub fn ttfb(&self) -> f64 {
        (self.response_start - self.request_start).max(0.0)
    }
}

// == Resource Timing ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Script,
    Css,
    Image,
}

impl ResourceKind {
    pub fn metric_name(self) -> &'static str {
        match self {
            ResourceKind::Script => "script-load-time",
            ResourceKind::Css => "css-load-time",
            ResourceKind::Image => "image-load-time",
        }
    }
}

/// A single loaded resource as reported by the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTiming {
    pub kind: ResourceKind,
    pub url: String,
    pub duration_ms: f64,
    /// Bytes transferred; 0 means the resource came from the browser cache
    pub transfer_size: u64,
}
