//! Metric history bounded per metric name.
//!
//! Each name keeps its own most recent `capacity` samples, so a burst of one
//! kind of metric (API attempts, say) never pushes out the others.

use std::collections::{HashMap, VecDeque};

use super::metric::PerformanceMetric;

/// Per-name ring buffers with a global recording order.
#[derive(Debug)]
pub struct MetricBuffer {
    series: HashMap<String, VecDeque<(u64, PerformanceMetric)>>,
    capacity: usize,
    next_seq: u64,
    len: usize,
    dropped: u64,
}

impl MetricBuffer {
    /// `capacity` applies to every metric name separately.
    pub fn new(capacity: usize) -> Self {
        Self {
            series: HashMap::new(),
            capacity: capacity.max(1),
            next_seq: 0,
            len: 0,
            dropped: 0,
        }
    }

    pub fn push(&mut self, metric: PerformanceMetric) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let series = self.series.entry(metric.name.clone()).or_default();
        if series.len() == self.capacity {
            series.pop_front();
            self.dropped += 1;
        } else {
            self.len += 1;
        }
        series.push_back((seq, metric));
    }

    /// Every buffered metric, oldest first across all names.
    pub fn iter(&self) -> impl Iterator<Item = &PerformanceMetric> {
        let mut all: Vec<&(u64, PerformanceMetric)> = self.series.values().flatten().collect();
        all.sort_unstable_by_key(|(seq, _)| *seq);
        all.into_iter().map(|(_, metric)| metric)
    }

    /// Buffered metrics of one name, oldest first.
    pub fn named(&self, name: &str) -> impl Iterator<Item = &PerformanceMetric> {
        self.series
            .get(name)
            .into_iter()
            .flatten()
            .map(|(_, metric)| metric)
    }

    /// Metrics dropped to stay within capacity since the last clear.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.series.clear();
        self.len = 0;
        self.dropped = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
