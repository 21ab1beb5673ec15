//! Downloading ICS feeds over HTTP.

use std::time::Duration;

use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for ICS feeds. One attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    http_client: reqwest::Client,
}

impl FeedFetcher {
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::configuration("failed to create HTTP client").with_source(e))?;
        Ok(Self { http_client })
    }

    /// GETs `url` and returns the body as text.
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx statuses are `fetch_failed`.
    pub async fn fetch(&self, url: &str, bearer_token: Option<&str>) -> ProviderResult<String> {
        let mut request = self.http_client.get(url);
        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timeout".to_string()
            } else if e.is_connect() {
                format!("connection failed: {e}")
            } else {
                format!("request failed: {e}")
            };
            ProviderError::fetch(message).with_source(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::fetch(format!("feed returned HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::fetch("failed to read feed body").with_source(e))?;
        debug!(bytes = body.len(), "downloaded ICS feed");
        Ok(body)
    }
}

/// Fetches a feed with the default timeout.
///
/// # Errors
///
/// See [`FeedFetcher::fetch`].
pub async fn fetch_feed(url: &str, bearer_token: Option<&str>) -> ProviderResult<String> {
    FeedFetcher::new(DEFAULT_TIMEOUT)?
        .fetch(url, bearer_token)
        .await
}
