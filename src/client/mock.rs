//! Test transports.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::request::RequestOptions;
use super::transport::{Transport, TransportResponse};
use crate::error::FetchError;

type Answer = Result<TransportResponse, FetchError>;

/// Replays scripted answers; repeats the last one when the script runs out.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Answer>>,
    last: Mutex<Option<Answer>>,
    delay: Duration,
    calls: AtomicU32,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Answer>) -> Arc<Self> {
        Self::slow(script, Duration::ZERO)
    }

    pub fn slow(script: Vec<Answer>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            delay,
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _url: &str, _options: &RequestOptions) -> Answer {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(answer) => {
                *last = Some(answer.clone());
                answer
            }
            None => last.clone().expect("script is empty"),
        }
    }
}

/// Answers every request from a function of the URL.
pub struct RoutedTransport<F> {
    route: F,
    delay: Duration,
    calls: AtomicU32,
}

impl<F> RoutedTransport<F>
where
    F: Fn(&str) -> Answer + Send + Sync,
{
    pub fn new(route: F) -> Arc<Self> {
        Self::slow(route, Duration::ZERO)
    }

    pub fn slow(route: F, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            route,
            delay,
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F> Transport for RoutedTransport<F>
where
    F: Fn(&str) -> Answer + Send + Sync,
{
    async fn send(&self, url: &str, _options: &RequestOptions) -> Answer {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        (self.route)(url)
    }
}
