//! Request Batcher
//!
//! Groups requests raised within a short window and fans each batch out
//! through the fetcher. Batching shapes timing only; every item is still its
//! own request and settles with its own outcome.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use super::fetch::OptimizedFetcher;
use super::request::RequestOptions;
use crate::config::Config;
use crate::error::FetchError;
use crate::monitor::PerformanceMetric;

type FetchOutcome = Result<Value, FetchError>;

struct BatchItem {
    url: String,
    options: RequestOptions,
    reply: oneshot::Sender<FetchOutcome>,
}

struct ArmedTimer {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct BatchState {
    queue: VecDeque<BatchItem>,
    timer: Option<ArmedTimer>,
}

struct Inner {
    fetcher: OptimizedFetcher,
    batch_size: usize,
    delay: Duration,
    state: Mutex<BatchState>,
    next_timer_id: AtomicU64,
    flushes: AtomicU64,
}

/// Who asked for a batch to be taken.
#[derive(Clone, Copy)]
enum Trigger {
    /// Explicit flush or a full queue: cancels the armed timer
    Immediate,
    /// Timer expiry; ignored unless the timer is still the armed one
    Timer(u64),
}

#[derive(Clone)]
pub struct RequestBatcher {
    inner: Arc<Inner>,
}

impl RequestBatcher {
    /// `batch_size` is raised to at least one.
    pub fn new(fetcher: OptimizedFetcher, batch_size: usize, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                batch_size: batch_size.max(1),
                delay,
                state: Mutex::new(BatchState::default()),
                next_timer_id: AtomicU64::new(0),
                flushes: AtomicU64::new(0),
            }),
        }
    }

    pub fn from_config(config: &Config, fetcher: OptimizedFetcher) -> Self {
        Self::new(fetcher, config.batch_size, config.batch_delay())
    }

    // == Add ==
    /// Queues a request and waits for the batch that carries it.
    ///
    /// A full queue is flushed at once; otherwise the first queued item arms
    /// the batch timer.
    pub async fn add(&self, url: impl Into<String>, options: RequestOptions) -> FetchOutcome {
        let (reply, outcome) = oneshot::channel();

        let full_batch = {
            let mut state = self.lock_state();
            state.queue.push_back(BatchItem {
                url: url.into(),
                options,
                reply,
            });

            if state.queue.len() >= self.inner.batch_size {
                Some(self.take_batch(&mut state, Trigger::Immediate))
            } else {
                if state.timer.is_none() {
                    self.arm_timer(&mut state);
                }
                None
            }
        };

        if let Some(batch) = full_batch {
            let batcher = self.clone();
            tokio::spawn(async move { batcher.run_batch(batch).await });
        }

        outcome.await.map_err(|_| FetchError::BatchDropped)?
    }

    // == Flush ==
    /// Runs up to one batch of queued items now. No-op on an empty queue.
    pub async fn flush(&self) {
        let batch = {
            let mut state = self.lock_state();
            self.take_batch(&mut state, Trigger::Immediate)
        };
        self.run_batch(batch).await;
    }

    /// Items waiting for a flush.
    pub fn pending(&self) -> usize {
        self.lock_state().queue.len()
    }

    pub fn timer_armed(&self) -> bool {
        self.lock_state().timer.is_some()
    }

    /// Non-empty batches executed so far.
    pub fn flush_count(&self) -> u64 {
        self.inner.flushes.load(Ordering::SeqCst)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, BatchState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn arm_timer(&self, state: &mut BatchState) {
        let id = self.inner.next_timer_id.fetch_add(1, Ordering::Relaxed);
        let batcher = self.clone();
        let delay = self.inner.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let batch = {
                let mut state = batcher.lock_state();
                batcher.take_batch(&mut state, Trigger::Timer(id))
            };
            batcher.run_batch(batch).await;
        });

        state.timer = Some(ArmedTimer { id, handle });
    }

    /// Removes up to `batch_size` items. Re-arms the timer when items remain
    /// so none are stranded.
    fn take_batch(&self, state: &mut BatchState, trigger: Trigger) -> Vec<BatchItem> {
        match (trigger, state.timer.take()) {
            (Trigger::Immediate, Some(timer)) => timer.handle.abort(),
            // the timer task itself; aborting would cancel this batch
            (Trigger::Timer(id), Some(timer)) if timer.id == id => {}
            (Trigger::Timer(_), other) => {
                state.timer = other;
                return Vec::new();
            }
            (Trigger::Immediate, None) => {}
        }

        let take = state.queue.len().min(self.inner.batch_size);
        let batch: Vec<BatchItem> = state.queue.drain(..take).collect();

        if !state.queue.is_empty() {
            self.arm_timer(state);
        }
        batch
    }

    async fn run_batch(&self, batch: Vec<BatchItem>) {
        if batch.is_empty() {
            return;
        }

        let started = Instant::now();
        let fetcher = &self.inner.fetcher;
        let outcomes = join_all(
            batch
                .iter()
                .map(|item| fetcher.fetch(&item.url, &item.options)),
        )
        .await;

        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        self.inner.flushes.fetch_add(1, Ordering::SeqCst);
        fetcher.monitor().record_metric(PerformanceMetric::api_batch(
            batch.len(),
            failed,
            started.elapsed(),
        ));
        debug!(size = batch.len(), failed, "batch flushed");

        for (item, outcome) in batch.into_iter().zip(outcomes) {
            // caller may have stopped waiting
            let _ = item.reply.send(outcome);
        }
    }
}
