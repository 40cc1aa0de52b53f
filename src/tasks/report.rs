//! Periodic Report Task
//!
//! Logs a condensed monitor report at a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::monitor::PerformanceMonitor;

/// Spawns the periodic report. Abort the returned handle on shutdown.
pub fn spawn_report_task(monitor: Arc<PerformanceMonitor>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // skip the immediate first tick
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let report = monitor.generate_report();
            if report.metric_count == 0 {
                continue;
            }
            info!(
                metrics = report.metric_count,
                dropped = report.dropped_metrics,
                page_load_ms = ?report.summary.page_load_ms,
                fcp_ms = ?report.summary.fcp_ms,
                lcp_ms = ?report.summary.lcp_ms,
                fid_ms = ?report.summary.fid_ms,
                cls = ?report.summary.cls,
                ttfb_ms = ?report.summary.ttfb_ms,
                "performance report"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::WebVital;

    #[tokio::test]
    async fn test_report_task_runs_until_aborted() {
        let monitor = Arc::new(PerformanceMonitor::new(10));
        monitor.record_vital(WebVital::Lcp, 1800.0);

        let handle = spawn_report_task(Arc::clone(&monitor), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(!handle.is_finished());

        handle.abort();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(handle.is_finished());
        // reporting never consumes metrics
        assert_eq!(monitor.len(), 1);
    }
}
