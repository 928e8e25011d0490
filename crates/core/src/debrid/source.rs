//! Download of candidate torrent sources.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::metrics::record_external_call;

use super::DebridError;

/// Default limit for candidate downloads, matching the provider timeouts.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A downloaded candidate: declared content type plus raw body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedSource {
    /// `Content-Type` header, empty when absent.
    pub content_type: String,
    pub body: Vec<u8>,
}

impl FetchedSource {
    pub fn is_torrent(&self) -> bool {
        self.content_type
            .to_ascii_lowercase()
            .contains("application/x-bittorrent")
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Trait for downloading a URL believed to serve a `.torrent`.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch `url`. A non-2xx response is an error.
    async fn fetch(&self, url: &str) -> Result<FetchedSource, DebridError>;
}

/// Plain HTTP(S) fetcher.
pub struct HttpSourceFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpSourceFetcher {
    pub fn new(timeout: Duration) -> Result<Self, DebridError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DebridError::Unreachable(format!("HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Fetcher with the default timeout.
    pub fn with_default_timeout() -> Result<Self, DebridError> {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedSource, DebridError> {
        let start = Instant::now();
        let result = self.fetch_inner(url).await;
        record_external_call("source", "fetch", result.is_ok(), start.elapsed());
        result
    }
}

impl HttpSourceFetcher {
    async fn fetch_inner(&self, url: &str) -> Result<FetchedSource, DebridError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DebridError::SourceUnavailable(format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| self.unavailable(e))?
            .to_vec();
        debug!(
            content_type = %content_type,
            bytes = body.len(),
            "Fetched candidate source"
        );

        Ok(FetchedSource { content_type, body })
    }

    fn unavailable(&self, e: reqwest::Error) -> DebridError {
        if e.is_timeout() {
            DebridError::SourceUnavailable(format!(
                "timed out after {}s",
                self.timeout.as_secs_f64()
            ))
        } else {
            DebridError::SourceUnavailable(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_torrent() {
        let source = FetchedSource {
            content_type: "Application/X-BitTorrent; charset=binary".to_string(),
            body: Vec::new(),
        };
        assert!(source.is_torrent());

        let html = FetchedSource {
            content_type: "text/html".to_string(),
            body: b"<html></html>".to_vec(),
        };
        assert!(!html.is_torrent());
        assert_eq!(html.text(), "<html></html>");
    }

    #[tokio::test]
    async fn test_fetch_rejects_unsupported_scheme() {
        let fetcher = HttpSourceFetcher::with_default_timeout().unwrap();
        let err = fetcher.fetch("magnet:?xt=urn:btih:ABC").await.unwrap_err();
        assert!(matches!(err, DebridError::SourceUnavailable(_)));
        assert!(err.to_string().contains("could not fetch torrent"));
    }
}
