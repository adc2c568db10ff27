//! Dashwire HTTP client utilities.
//!
//! A lightweight client for fetching arbitrary JSON-returning endpoints on
//! behalf of widgets. It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults (10s timeout, JSON
//!   accept header)
//! - Attaching provider API keys from the environment, as a query parameter
//!   or a header depending on the provider
//! - Mapping rate-limit and quota responses to actionable errors
//! - Serving repeat fetches from an injected [`ResponseCache`]
//!
//! The primary entry point is [`ApiClient`]: create one with
//! [`ApiClient::new`], then call [`ApiClient::fetch`] per refresh tick or
//! [`ApiClient::test_connection`] from the configuration flow.

pub mod cache;
pub mod provider;

use std::time::Duration;

use reqwest::{Client, StatusCode, header};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub use cache::ResponseCache;
pub use provider::{Provider, url_has_api_key};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors surfaced by widget data fetches.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("API quota exceeded. Please check your API key limits.")]
    QuotaExceeded,
    #[error("API Error: {0}")]
    Status(StatusCode),
    #[error("Network Error: Unable to reach the API")]
    Network(#[source] reqwest::Error),
    #[error("response was not valid JSON")]
    InvalidJson(#[source] reqwest::Error),
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

/// Outcome of probing an endpoint from the configuration flow.
#[derive(Debug)]
pub struct ConnectionTest {
    pub success: bool,
    pub data: Option<Value>,
    pub message: String,
}

/// Thin wrapper around a configured `reqwest::Client` for widget fetches.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
}

impl ApiClient {
    /// Construct a client with the default timeout and JSON headers.
    pub fn new() -> Result<Self, ApiError> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self { http })
    }

    /// Fetch `url`, serving from `cache` when a fresh entry exists.
    ///
    /// Successful bodies are cached under the caller's URL (before key
    /// injection, so credentials never become cache keys).
    pub async fn fetch(&self, url: &str, cache: &ResponseCache, max_age: Duration) -> Result<Value, ApiError> {
        if let Some(cached) = cache.get(url, max_age) {
            debug!(%url, "serving response from cache");
            return Ok(cached);
        }

        let data = self.fetch_uncached(url).await?;
        cache.insert(url, data.clone());
        Ok(data)
    }

    /// Probe an endpoint without touching the cache.
    pub async fn test_connection(&self, url: &str) -> ConnectionTest {
        match self.fetch_uncached(url).await {
            Ok(data) => ConnectionTest {
                success: true,
                data: Some(data),
                message: "API connection successful!".to_string(),
            },
            Err(error) => ConnectionTest {
                success: false,
                data: None,
                message: format!("API connection failed: {error}"),
            },
        }
    }

    async fn fetch_uncached(&self, url: &str) -> Result<Value, ApiError> {
        let prepared = prepare_url(url);
        debug!(url = %prepared, "fetching widget data");

        let mut request = self.http.get(&prepared);
        if let Some(token) = finnhub_header_token(url) {
            request = request.header("X-Finnhub-Token", token);
        }

        let response = request.send().await.map_err(ApiError::Network)?;
        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(ApiError::RateLimited),
            StatusCode::FORBIDDEN => return Err(ApiError::QuotaExceeded),
            status if !status.is_success() => return Err(ApiError::Status(status)),
            _ => {}
        }

        response.json::<Value>().await.map_err(ApiError::InvalidJson)
    }
}

/// Append the provider API key to a URL that does not already carry one.
///
/// Empty and `demo` keys are skipped so the stock demo endpoints keep
/// working without configuration.
pub fn prepare_url(url: &str) -> String {
    if url_has_api_key(url) {
        return url.to_string();
    }

    let provider = Provider::detect(url);
    let Some(key) = provider.api_key() else {
        return url.to_string();
    };
    if key == "demo" {
        return url.to_string();
    }

    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{}={key}", provider.query_param())
}

/// Finnhub additionally accepts its key via header; attach it when the URL
/// carries none of its own.
fn finnhub_header_token(url: &str) -> Option<String> {
    if Provider::detect(url) != Provider::Finnhub {
        return None;
    }
    let key = Provider::Finnhub.api_key()?;
    if key == "demo" { None } else { Some(key) }
}
