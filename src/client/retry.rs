//! Retry policy for the fetcher.

use std::time::Duration;

use crate::error::FetchError;

/// Fixed backoff schedule without jitter.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    delays: Vec<Duration>,
}

/// What the fetcher does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep, then try again
    Retry { after: Duration },
    /// The error is terminal
    Stop,
    /// The attempt budget is spent
    Exhausted,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delays: Vec<Duration>) -> Self {
        Self { max_retries, delays }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self::new(0, Vec::new())
    }

    /// First attempt plus retries.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the `retry`-th retry (1-based). Retries past the end of
    /// the schedule go immediately.
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        retry
            .checked_sub(1)
            .and_then(|index| self.delays.get(index as usize))
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Decision after `attempt` (1-based) failed with `err`.
    pub fn decide(&self, attempt: u32, err: &FetchError) -> RetryDecision {
        if !err.is_retryable() {
            RetryDecision::Stop
        } else if attempt >= self.max_attempts() {
            RetryDecision::Exhausted
        } else {
            RetryDecision::Retry {
                after: self.delay_before_retry(attempt),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            3,
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000),
            ],
        )
    }
}
