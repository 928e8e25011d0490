//! Mock searcher for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::searcher::{
    merge_tracker_results, Indexer, RawItem, SearchError, SearchResult, Searcher,
};

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    /// The query that was searched.
    pub query: String,
    /// Trackers requested, in order.
    pub trackers: Vec<String>,
    /// When the search was made.
    pub timestamp: Instant,
}

/// Mock implementation of the Searcher trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable per-tracker items
/// - Track search queries for assertions
/// - Simulate failing trackers and indexer listing errors
///
/// Results are merged exactly like the real client: tracker order, with
/// positional `<tracker>-<n>` ids, failing trackers contributing nothing.
///
/// # Example
///
/// ```rust,ignore
/// use debridge_core::testing::{MockSearcher, fixtures};
///
/// let searcher = MockSearcher::new();
/// searcher.set_items("1337x", vec![fixtures::raw_item("Ubuntu 24.04", 10)]).await;
/// searcher.fail_tracker("rarbg").await;
///
/// let results = searcher.search("ubuntu", &["1337x".into(), "rarbg".into()]).await;
/// assert_eq!(results.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockSearcher {
    /// Configured items per tracker.
    items: Arc<RwLock<HashMap<String, Vec<RawItem>>>>,
    /// Trackers whose search fails.
    failing: Arc<RwLock<HashSet<String>>>,
    /// Recorded searches.
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    /// Configured indexers.
    indexers: Arc<RwLock<Vec<Indexer>>>,
    /// If set, the next list_indexers call will fail with this error.
    next_error: Arc<RwLock<Option<SearchError>>>,
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearcher {
    /// Create a new mock searcher with two indexers and no items.
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            indexers: Arc::new(RwLock::new(vec![
                Indexer {
                    id: "mock-indexer-1".to_string(),
                    name: "Mock Indexer 1".to_string(),
                    description: String::new(),
                },
                Indexer {
                    id: "mock-indexer-2".to_string(),
                    name: "Mock Indexer 2".to_string(),
                    description: String::new(),
                },
            ])),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the items a tracker returns.
    pub async fn set_items(&self, tracker: &str, items: Vec<RawItem>) {
        self.items.write().await.insert(tracker.to_string(), items);
    }

    /// Make searches against `tracker` fail.
    pub async fn fail_tracker(&self, tracker: &str) {
        self.failing.write().await.insert(tracker.to_string());
    }

    /// Set the configured indexers.
    pub async fn set_indexers(&self, indexers: Vec<Indexer>) {
        *self.indexers.write().await = indexers;
    }

    /// Configure the next indexer listing to fail with the given error.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get recorded searches.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// Get the number of searches performed.
    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_indexers(&self) -> Result<Vec<Indexer>, SearchError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        Ok(self.indexers.read().await.clone())
    }

    async fn search(&self, query: &str, trackers: &[String]) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() || trackers.is_empty() {
            return Vec::new();
        }

        self.searches.write().await.push(RecordedSearch {
            query: query.to_string(),
            trackers: trackers.to_vec(),
            timestamp: Instant::now(),
        });

        let items = self.items.read().await;
        let failing = self.failing.read().await;
        let per_tracker = trackers
            .iter()
            .map(|tracker| {
                let tracker_items = if failing.contains(tracker) {
                    Vec::new()
                } else {
                    items.get(tracker).cloned().unwrap_or_default()
                };
                (tracker.clone(), tracker_items)
            })
            .collect();

        merge_tracker_results(per_tracker)
    }
}
