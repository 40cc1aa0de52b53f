//! Cache Sweep Task
//!
//! Periodically drops expired cache entries and flushes whatever the batcher
//! still holds.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;
use crate::client::RequestBatcher;

/// Spawns the periodic sweep. Abort the returned handle on shutdown.
///
/// The cache write lock is held only for the sweep itself; the batch flush
/// runs without it.
pub fn spawn_cleanup_task(
    cache: SharedCache,
    batcher: RequestBatcher,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs_f64(), "starting cache sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.cleanup();
            if removed > 0 {
                info!(removed, "cache sweep removed expired entries");
            } else {
                debug!("cache sweep found no expired entries");
            }

            if batcher.pending() > 0 {
                debug!(pending = batcher.pending(), "flushing queued batch requests");
                batcher.flush().await;
            }
        }
    })
}
