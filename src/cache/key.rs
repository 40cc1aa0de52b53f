//! Cache key generation.

use std::collections::BTreeMap;

use serde_json::json;

use crate::client::RequestOptions;

/// Derives the cache key of a request.
///
/// The key covers URL, method, serialized body and headers. Headers are
/// sorted by name, so two requests differing only in header order share a key.
pub fn generate_key(url: &str, options: &RequestOptions) -> String {
    let headers: BTreeMap<&str, &str> = options
        .headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();

    json!({
        "url": url,
        "method": options.method.as_str(),
        "body": options.body.as_ref().map(|body| body.to_string()),
        "headers": headers,
    })
    .to_string()
}
