//! Retrieval of remote specification documents.

use crate::error::CatalogError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Default ceiling on a downloaded document.
pub const DEFAULT_MAX_SPEC_BYTES: usize = 32 * 1024 * 1024;

/// Default time allowed for one download.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of parsed specification documents.
#[async_trait]
pub trait SpecFetcher: Send + Sync {
    /// Downloads and parses the document at `url`.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Fetch`] for transport, status, timeout and size
    /// failures; [`CatalogError::Parse`] when the body is not JSON.
    async fn fetch(&self, url: &str) -> Result<Value, CatalogError>;
}

/// Limits applied by [`HttpSpecFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Time allowed for the whole request, body included.
    pub timeout: Duration,
    /// Bodies larger than this are rejected.
    pub max_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_bytes: DEFAULT_MAX_SPEC_BYTES,
        }
    }
}

/// [`SpecFetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpSpecFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpSpecFetcher {
    /// Creates a fetcher with its own client.
    #[must_use]
    pub fn new(config: FetchConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Creates a fetcher sharing an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: FetchConfig) -> Self {
        Self { client, config }
    }
}

impl Default for HttpSpecFetcher {
    fn default() -> Self {
        Self::new(FetchConfig::default())
    }
}

#[async_trait]
impl SpecFetcher for HttpSpecFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, CatalogError> {
        tracing::debug!(url, "fetching specification");
        let limit = self.config.max_bytes;
        let mut response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|err| transport_error(url, &err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::fetch(url, format!("HTTP {status}")));
        }
        if let Some(length) = response.content_length()
            && length > limit as u64
        {
            return Err(too_large(url, limit));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| transport_error(url, &err))?
        {
            if body.len() + chunk.len() > limit {
                return Err(too_large(url, limit));
            }
            body.extend_from_slice(&chunk);
        }

        serde_json::from_slice(&body)
            .map_err(|err| CatalogError::parse(format!("{url} is not valid JSON: {err}")))
    }
}

fn transport_error(url: &str, err: &reqwest::Error) -> CatalogError {
    let message = if err.is_timeout() {
        "request timed out".to_owned()
    } else {
        err.to_string()
    };
    CatalogError::fetch(url, message)
}

fn too_large(url: &str, limit: usize) -> CatalogError {
    CatalogError::fetch(url, format!("document exceeds {limit} bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_bytes, 32 * 1024 * 1024);
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error() {
        let fetcher = HttpSpecFetcher::new(FetchConfig {
            timeout: Duration::from_millis(500),
            max_bytes: 1024,
        });
        // Port 9 on the loopback interface is reserved for discard and is closed.
        let err = fetcher
            .fetch("http://127.0.0.1:9/spec.json")
            .await
            .expect_err("nothing listens there");
        assert_eq!(err.url(), Some("http://127.0.0.1:9/spec.json"));
    }
}
