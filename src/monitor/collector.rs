//! Performance Monitor
//!
//! Collects timing marks, typed metrics and Web Vitals, notifies listeners and
//! projects everything into a pull-based report.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::buffer::MetricBuffer;
use super::metric::{
    millis, MetricKind, MetricUnit, NavigationPhase, PerformanceMetric, PAGE_LOAD,
    TIME_TO_INTERACTIVE,
};
use super::report::MonitorReport;
use super::vitals::{NavigationTiming, ResourceTiming, VitalRating, WebVital};

/// Samples kept per metric name by [`PerformanceMonitor::default`].
pub const DEFAULT_SAMPLES_PER_METRIC: usize = 100;

/// Metrics in milliseconds above this value are logged as slow.
pub const SLOW_METRIC_THRESHOLD: Duration = Duration::from_millis(1000);

/// Callback invoked for every recorded metric. Errors are logged and isolated.
pub type VitalsListener = Arc<dyn Fn(&PerformanceMetric) -> anyhow::Result<()> + Send + Sync>;

type ListenerMap = RwLock<BTreeMap<u64, VitalsListener>>;

// == Performance Monitor ==
/// Process-level metric collector.
///
/// Constructed explicitly and shared by `Arc`; tests build isolated instances.
pub struct PerformanceMonitor {
    metrics: RwLock<MetricBuffer>,
    marks: Mutex<HashMap<String, Instant>>,
    timers: Mutex<HashMap<(String, String), Instant>>,
    /// Running CLS total
    layout_shift: Mutex<f64>,
    listeners: Arc<ListenerMap>,
    next_listener_id: AtomicU64,
}

impl PerformanceMonitor {
    /// `capacity` bounds the samples kept for each metric name.
    pub fn new(capacity: usize) -> Self {
        Self {
            metrics: RwLock::new(MetricBuffer::new(capacity)),
            marks: Mutex::new(HashMap::new()),
            timers: Mutex::new(HashMap::new()),
            layout_shift: Mutex::new(0.0),
            listeners: Arc::new(RwLock::new(BTreeMap::new())),
            next_listener_id: AtomicU64::new(0),
        }
    }

    // == Record ==
    /// Appends a metric, logs it when slow and pushes it to every listener.
    pub fn record_metric(&self, metric: PerformanceMetric) {
        self.flag_slow(&metric);
        debug!(name = %metric.name, value = metric.value, "performance metric recorded");

        self.metrics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(metric.clone());

        self.notify(&metric);
    }

    fn flag_slow(&self, metric: &PerformanceMetric) {
        match metric.kind {
            MetricKind::WebVital { vital, rating } if rating != VitalRating::Good => {
                warn!(
                    vital = %vital,
                    value = metric.value,
                    threshold = vital.good_threshold(),
                    ?rating,
                    "performance threshold exceeded"
                );
            }
            _ if metric.unit == MetricUnit::Milliseconds
                && metric.value > millis(SLOW_METRIC_THRESHOLD) =>
            {
                warn!(
                    name = %metric.name,
                    value_ms = metric.value,
                    kind = ?metric.kind,
                    "slow operation"
                );
            }
            _ => {}
        }
    }

    fn notify(&self, metric: &PerformanceMetric) {
        let listeners: Vec<(u64, VitalsListener)> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        for (id, listener) in listeners {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(metric))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(listener = id, error = %err, "vitals listener failed");
                }
                Err(_) => {
                    warn!(listener = id, "vitals listener panicked");
                }
            }
        }
    }

    // == Web Vitals Ingestion ==
    pub fn record_vital(&self, vital: WebVital, value: f64) {
        self.record_metric(PerformanceMetric::vital(vital, value));
    }

    /// Adds a layout shift to the running CLS and records the new total.
    /// Shifts right after user input do not count.
    pub fn record_layout_shift(&self, value: f64, had_recent_input: bool) -> f64 {
        let total = {
            let mut cls = self
                .layout_shift
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !had_recent_input {
                *cls += value;
            }
            *cls
        };
        self.record_vital(WebVital::Cls, total);
        total
    }

    /// Records page load, time to interactive and TTFB from navigation timing.
    pub fn record_page_load(&self, timing: &NavigationTiming) {
        self.record_metric(PerformanceMetric::new(
            PAGE_LOAD,
            timing.load_event_end,
            MetricUnit::Milliseconds,
            MetricKind::Navigation {
                phase: NavigationPhase::Load,
            },
        ));
        self.record_metric(PerformanceMetric::new(
            TIME_TO_INTERACTIVE,
            timing.dom_interactive,
            MetricUnit::Milliseconds,
            MetricKind::Navigation {
                phase: NavigationPhase::Interactive,
            },
        ));
        self.record_vital(WebVital::Ttfb, timing.ttfb());
    }

    pub fn record_resource(&self, resource: ResourceTiming) {
        let kind = resource.kind;
        self.record_metric(PerformanceMetric::new(
            kind.metric_name(),
            resource.duration_ms,
            MetricUnit::Milliseconds,
            MetricKind::Resource {
                resource: kind,
                url: resource.url,
                transfer_size: resource.transfer_size,
                cached: resource.transfer_size == 0,
            },
        ));
    }

    /// Records a memory sample in bytes.
    pub fn record_memory(&self, used: u64, total: u64) {
        self.record_metric(PerformanceMetric::memory(used, total));
    }

    // == Marks ==
    /// Records a named time origin, replacing any earlier mark of that name.
    pub fn mark(&self, name: &str) {
        self.marks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Instant::now());
    }

    /// Time elapsed since `start_mark` (or the mark named `name`), recorded
    /// as a timing metric. `None` if the mark does not exist.
    pub fn measure(&self, name: &str, start_mark: Option<&str>) -> Option<Duration> {
        let origin = start_mark.unwrap_or(name);
        let started = *self
            .marks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(origin)?;

        let elapsed = started.elapsed();
        self.record_metric(PerformanceMetric::timing(name, elapsed, None));
        Some(elapsed)
    }

    // == Timers ==
    pub fn start_timer(&self, name: &str, id: &str) {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((name.to_string(), id.to_string()), Instant::now());
    }

    /// Stops a timer started with the same name and id and records it.
    pub fn end_timer(&self, name: &str, id: &str) -> Option<Duration> {
        let started = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(name.to_string(), id.to_string()))?;

        let elapsed = started.elapsed();
        self.record_metric(PerformanceMetric::timing(
            name,
            elapsed,
            Some(id.to_string()),
        ));
        Some(elapsed)
    }

    /// Ids of timers currently running under `name`.
    pub fn active_timers(&self, name: &str) -> Vec<String> {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|(timer, _)| timer == name)
            .map(|(_, id)| id.clone())
            .collect()
    }

    /// Awaits `fut` and records how long it took.
    pub async fn measure_async<F, T>(&self, name: &str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let started = Instant::now();
        let output = fut.await;
        self.record_metric(PerformanceMetric::timing(name, started.elapsed(), None));
        output
    }

    // == Listeners ==
    /// Registers a listener for every subsequently recorded metric.
    pub fn on_vitals_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&PerformanceMetric) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(listener));

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    // == Queries ==
    /// Snapshot of all buffered metrics, oldest first.
    pub fn metrics(&self) -> Vec<PerformanceMetric> {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn metrics_named(&self, name: &str) -> Vec<PerformanceMetric> {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .named(name)
            .cloned()
            .collect()
    }

    /// Latest value of each vital seen so far.
    pub fn latest_vitals(&self) -> BTreeMap<WebVital, f64> {
        let metrics = self.metrics.read().unwrap_or_else(PoisonError::into_inner);
        WebVital::ALL
            .into_iter()
            .filter_map(|vital| {
                metrics
                    .named(vital.name())
                    .filter(|m| m.as_vital() == Some(vital))
                    .last()
                    .map(|m| (vital, m.value))
            })
            .collect()
    }

    /// Mean of `name` over metrics recorded within `window`.
    pub fn average_metric(&self, name: &str, window: Duration) -> Option<f64> {
        let cutoff = chrono::Duration::from_std(window)
            .ok()
            .and_then(|window| chrono::Utc::now().checked_sub_signed(window))
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);
        let metrics = self.metrics.read().unwrap_or_else(PoisonError::into_inner);

        let (sum, count) = metrics
            .named(name)
            .filter(|m| m.timestamp >= cutoff)
            .fold((0.0, 0usize), |(sum, count), m| (sum + m.value, count + 1));

        (count > 0).then(|| sum / count as f64)
    }

    pub fn len(&self) -> usize {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Report ==
    pub fn generate_report(&self) -> MonitorReport {
        let metrics = self.metrics.read().unwrap_or_else(PoisonError::into_inner);
        let mut report = MonitorReport::from_metrics(metrics.iter());
        report.dropped_metrics = metrics.dropped();
        report
    }

    // == Reset ==
    /// Drops buffered metrics.
    pub fn clear(&self) {
        self.metrics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("performance metrics cleared");
    }

    /// Full teardown: metrics, marks, timers, CLS total and listeners.
    pub fn cleanup(&self) {
        self.clear();
        self.marks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self
            .layout_shift
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = 0.0;
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLES_PER_METRIC)
    }
}

// == Subscription ==
/// Handle returned by [`PerformanceMonitor::on_vitals_change`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerMap>,
}

impl Subscription {
    /// Removes the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.listeners.upgrade() {
            Some(listeners) => listeners
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id)
                .is_some(),
            None => false,
        }
    }
}
