//! Mock source fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::debrid::{DebridError, FetchedSource, SourceFetcher};

/// Mock implementation of the SourceFetcher trait.
///
/// URLs without a configured response fail like a 404 would.
#[derive(Debug, Default)]
pub struct MockSourceFetcher {
    /// Configured responses by URL.
    responses: Arc<RwLock<HashMap<String, FetchedSource>>>,
    /// URLs fetched, in call order.
    fetched: Arc<RwLock<Vec<String>>>,
}

impl MockSourceFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `source` for `url`.
    pub async fn add_response(&self, url: &str, source: FetchedSource) {
        self.responses
            .write()
            .await
            .insert(url.to_string(), source);
    }

    /// URLs fetched so far.
    pub async fn fetched_urls(&self) -> Vec<String> {
        self.fetched.read().await.clone()
    }
}

#[async_trait]
impl SourceFetcher for MockSourceFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedSource, DebridError> {
        self.fetched.write().await.push(url.to_string());
        self.responses
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| DebridError::SourceUnavailable("HTTP 404 Not Found".to_string()))
    }
}
