//! Types for the Torznab search system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// An indexer configured in the metasearch provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indexer {
    /// Provider-side identifier, used as the tracker id in searches.
    pub id: String,
    /// Display name (falls back to `id`).
    pub name: String,
    /// Free-form description, empty when the provider sends none.
    pub description: String,
}

/// The `<enclosure>` element of a Torznab item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Enclosure {
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
}

/// Every `torznab:attr` name/value pair of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorznabAttrs {
    pub attrs: BTreeMap<String, String>,
}

impl TorznabAttrs {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// Everything the parser could extract from one `<item>` block.
///
/// Kept alongside each [`SearchResult`] so that a caller can hand it back
/// later (e.g. for submission to the debrid service) without re-querying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawItem {
    pub title: Option<String>,
    pub guid: Option<String>,
    pub link: Option<String>,
    pub comments: Option<String>,
    pub pub_date: Option<String>,
    pub description: Option<String>,
    pub magnet: Option<String>,
    pub enclosure: Option<Enclosure>,
    pub torrent_url: Option<String>,
    pub size: Option<u64>,
    pub seeders: Option<u32>,
    pub peers: Option<u32>,
    pub torznab: TorznabAttrs,
    pub categories: Vec<String>,
    pub category_attr: Vec<String>,
}

impl RawItem {
    /// Best known download URL: enclosure, then torrent URL, then link.
    ///
    /// HTML-escaped ampersands are normalized.
    pub fn download_url(&self) -> Option<String> {
        let enclosure_url = self.enclosure.as_ref().and_then(|e| e.url.as_deref());
        [enclosure_url, self.torrent_url.as_deref(), self.link.as_deref()]
            .into_iter()
            .flatten()
            .find(|url| !url.trim().is_empty())
            .map(normalize_url)
    }
}

/// Replace `&amp;` with `&`, as indexers often escape query strings twice.
pub fn normalize_url(url: &str) -> String {
    url.replace("&amp;", "&")
}

/// One normalized search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// `<tracker>-<ordinal>`; only unique within one search call.
    pub id: String,
    pub tracker: String,
    pub title: String,
    pub guid: Option<String>,
    pub size_bytes: Option<u64>,
    pub seeders: Option<u32>,
    pub magnet: Option<String>,
    pub torrent_url: Option<String>,
    pub raw: RawItem,
}

/// Errors that can occur talking to the metasearch provider.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Search backend API error: {0}")]
    ApiError(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_connect() {
            SearchError::ConnectionFailed(e.to_string())
        } else {
            SearchError::ApiError(e.to_string())
        }
    }
}

/// Trait for metasearch backends.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Indexers configured in the provider.
    async fn list_indexers(&self) -> Result<Vec<Indexer>, SearchError>;

    /// Query each tracker and merge the results in tracker order.
    ///
    /// Never fails: a tracker that cannot be queried contributes nothing.
    async fn search(&self, query: &str, trackers: &[String]) -> Vec<SearchResult>;
}
