//! Network transport seam.
//!
//! The fetcher talks to the network only through [`Transport`], so tests can
//! script responses without a server.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use super::request::{Method, RequestOptions};
use crate::error::FetchError;

/// Raw upstream answer, before status classification.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            body: Bytes::from(body.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses a 2xx body as JSON; any other status becomes [`FetchError::Http`].
    pub fn into_json(self) -> Result<Value, FetchError> {
        if !self.is_success() {
            return Err(FetchError::Http {
                status: self.status,
                status_text: self.status_text,
            });
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one request. Non-2xx statuses are returned, not raised.
    async fn send(&self, url: &str, options: &RequestOptions)
        -> Result<TransportResponse, FetchError>;
}

// == Reqwest Transport ==
/// Production transport on a pooled `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<TransportResponse, FetchError> {
        let method = match options.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut request = self.client.request(method, url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}

fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("")
}
