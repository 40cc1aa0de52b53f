//! Concurrency Limiter
//!
//! Bounds in-flight network operations. Waiters are admitted in FIFO order
//! because tokio's semaphore is fair.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::FetchError;

#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    running: Arc<AtomicUsize>,
    queued: Arc<AtomicUsize>,
}

/// Decrements a counter when dropped, so cancelled waiters and panicking
/// tasks still release their slot in the bookkeeping.
struct CountGuard<'a>(&'a AtomicUsize);

impl<'a> CountGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for CountGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyLimiter {
    /// A zero bound is raised to one.
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            running: Arc::new(AtomicUsize::new(0)),
            queued: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Waits for a slot, then runs `task`. The slot is released when the task
    /// settles, whatever its outcome.
    pub async fn execute<F, T>(&self, task: F) -> Result<T, FetchError>
    where
        F: Future<Output = T>,
    {
        let permit = {
            let _waiting = CountGuard::enter(&self.queued);
            self.semaphore
                .acquire()
                .await
                .map_err(|_| FetchError::LimiterClosed)?
        };

        let _running = CountGuard::enter(&self.running);
        let output = task.await;
        drop(permit);
        Ok(output)
    }

    /// Tasks currently holding a slot.
    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Tasks waiting for a slot.
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Rejects current and future waiters with [`FetchError::LimiterClosed`].
    pub fn close(&self) {
        self.semaphore.close();
    }
}
