//! Request Deduplicator
//!
//! Concurrent calls sharing a key await one underlying operation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

type InFlight<T> = Arc<Mutex<HashMap<String, (u64, Shared<BoxFuture<'static, T>>)>>>;

pub struct RequestDeduplicator<T: Clone> {
    in_flight: InFlight<T>,
    next_id: AtomicU64,
}

impl<T> RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Joins the in-flight operation for `key`, or starts one with `request`.
    ///
    /// The entry is removed as soon as the operation settles, so a later call
    /// runs `request` again.
    pub async fn dedupe<F, Fut>(&self, key: &str, request: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let shared = {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            match in_flight.get(key) {
                Some((_, pending)) => {
                    debug!(key, "joining in-flight request");
                    pending.clone()
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let registry = Arc::clone(&self.in_flight);
                    let owned_key = key.to_string();
                    let fut = request();

                    let pending = async move {
                        let output = fut.await;
                        let mut in_flight =
                            registry.lock().unwrap_or_else(PoisonError::into_inner);
                        // a newer operation may already own the key
                        if matches!(in_flight.get(&owned_key), Some((current, _)) if *current == id)
                        {
                            in_flight.remove(&owned_key);
                        }
                        output
                    }
                    .boxed()
                    .shared();

                    in_flight.insert(key.to_string(), (id, pending.clone()));
                    pending
                }
            }
        };

        shared.await
    }

    /// Keys with an operation in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<T> Default for RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
