//! Monitor report: a projection of the buffered metrics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::metric::{MetricKind, NavigationPhase, PerformanceMetric};
use super::vitals::{ResourceKind, VitalRating, WebVital};

#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    pub timestamp: DateTime<Utc>,
    pub summary: ReportSummary,
    pub vitals: BTreeMap<WebVital, VitalReport>,
    pub resources: ResourceBreakdown,
    pub custom: BTreeMap<String, TimingSummary>,
    pub memory: Option<MemoryReport>,
    pub metric_count: usize,
    /// Samples evicted by the per-name cap since the last clear
    pub dropped_metrics: u64,
}

/// Latest page-level numbers, `None` until reported.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    pub page_load_ms: Option<f64>,
    pub time_to_interactive_ms: Option<f64>,
    pub fcp_ms: Option<f64>,
    pub lcp_ms: Option<f64>,
    pub cls: Option<f64>,
    pub fid_ms: Option<f64>,
    pub ttfb_ms: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct VitalReport {
    pub value: f64,
    pub rating: VitalRating,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceBreakdown {
    pub script: ResourceSummary,
    pub css: ResourceSummary,
    pub image: ResourceSummary,
}

impl ResourceBreakdown {
    fn slot(&mut self, kind: ResourceKind) -> &mut ResourceSummary {
        match kind {
            ResourceKind::Script => &mut self.script,
            ResourceKind::Css => &mut self.css,
            ResourceKind::Image => &mut self.image,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceSummary {
    pub count: usize,
    pub average_ms: f64,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimingSummary {
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryReport {
    pub used: u64,
    pub total: u64,
    pub percentage: f64,
}

impl MonitorReport {
    /// Builds the report from metrics ordered oldest first. Later values of
    /// the same vital or navigation phase replace earlier ones.
    pub fn from_metrics<'a>(metrics: impl IntoIterator<Item = &'a PerformanceMetric>) -> Self {
        let mut summary = ReportSummary::default();
        let mut vitals = BTreeMap::new();
        let mut resources = ResourceBreakdown::default();
        let mut timings: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut memory = None;
        let mut metric_count = 0;

        for metric in metrics {
            metric_count += 1;
            match &metric.kind {
                MetricKind::WebVital { vital, rating } => {
                    vitals.insert(
                        *vital,
                        VitalReport {
                            value: metric.value,
                            rating: *rating,
                        },
                    );
                }
                MetricKind::Navigation { phase } => match phase {
                    NavigationPhase::Load => summary.page_load_ms = Some(metric.value),
                    NavigationPhase::Interactive => {
                        summary.time_to_interactive_ms = Some(metric.value)
                    }
                },
                MetricKind::Resource {
                    resource,
                    transfer_size,
                    ..
                } => {
                    let slot = resources.slot(*resource);
                    slot.count += 1;
                    // running mean
                    slot.average_ms += (metric.value - slot.average_ms) / slot.count as f64;
                    slot.total_bytes += transfer_size;
                }
                MetricKind::Memory { total } => {
                    let used = metric.value as u64;
                    memory = Some(MemoryReport {
                        used,
                        total: *total,
                        percentage: if *total == 0 {
                            0.0
                        } else {
                            used as f64 / *total as f64 * 100.0
                        },
                    });
                }
                MetricKind::Timing { .. } | MetricKind::Custom { .. } => {
                    timings
                        .entry(metric.name.clone())
                        .or_default()
                        .push(metric.value);
                }
                MetricKind::ApiRequest { .. }
                | MetricKind::ApiCacheHit { .. }
                | MetricKind::ApiBatch { .. } => {}
            }
        }

        let vital_value = |vital: WebVital| vitals.get(&vital).map(|v: &VitalReport| v.value);
        summary.fcp_ms = vital_value(WebVital::Fcp);
        summary.lcp_ms = vital_value(WebVital::Lcp);
        summary.cls = vital_value(WebVital::Cls);
        summary.fid_ms = vital_value(WebVital::Fid);
        summary.ttfb_ms = vital_value(WebVital::Ttfb);

        let custom = timings
            .into_iter()
            .map(|(name, values)| (name, summarize(&values)))
            .collect();

        Self {
            timestamp: Utc::now(),
            summary,
            vitals,
            resources,
            custom,
            memory,
            metric_count,
            dropped_metrics: 0,
        }
    }
}

fn summarize(values: &[f64]) -> TimingSummary {
    let count = values.len();
    let sum: f64 = values.iter().sum();
    TimingSummary {
        count,
        average: if count == 0 { 0.0 } else { sum / count as f64 },
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}
