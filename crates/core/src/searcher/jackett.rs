//! Jackett Torznab backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::JackettConfig;
use crate::metrics::{record_external_call, SEARCH_RESULTS, TRACKER_FAILURES};

use super::torznab::{extract_error, extract_indexers, extract_items};
use super::{Indexer, RawItem, SearchError, SearchResult, Searcher};

const SERVICE: &str = "jackett";

/// Jackett search backend, speaking the Torznab XML API.
pub struct JackettClient {
    client: Client,
    config: JackettConfig,
}

impl JackettClient {
    /// Create a new JackettClient with the given configuration.
    pub fn new(config: JackettConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| SearchError::ConnectionFailed(format!("HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Build the Torznab URL listing configured indexers.
    fn build_indexers_url(&self) -> String {
        format!(
            "{}/api/v2.0/indexers/all/results/torznab/api?apikey={}&t=indexers&configured=true",
            self.base_url(),
            urlencoding::encode(&self.config.api_key)
        )
    }

    /// Build the Torznab URL searching a single indexer.
    fn build_search_url(&self, query: &str, tracker: &str) -> String {
        format!(
            "{}/api/v2.0/indexers/{}/results/torznab/api?apikey={}&t=search&q={}",
            self.base_url(),
            urlencoding::encode(tracker),
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(query)
        )
    }

    /// GET a Torznab endpoint and return the body text.
    async fn fetch_xml(&self, url: &str, operation: &str) -> Result<String, SearchError> {
        let start = Instant::now();
        let result = self.fetch_xml_inner(url).await;
        record_external_call(SERVICE, operation, result.is_ok(), start.elapsed());
        result
    }

    async fn fetch_xml_inner(&self, url: &str) -> Result<String, SearchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let xml = response.text().await?;
        if let Some(err) = extract_error(&xml) {
            return Err(SearchError::ApiError(match err.code {
                Some(code) => format!("Torznab error {}: {}", code, err.description),
                None => format!("Torznab error: {}", err.description),
            }));
        }

        Ok(xml)
    }

    /// Search a single tracker.
    async fn search_tracker(&self, query: &str, tracker: &str) -> Result<Vec<RawItem>, SearchError> {
        let url = self.build_search_url(query, tracker);
        debug!(tracker = tracker, "Searching Jackett");

        let xml = self.fetch_xml(&url, "search").await?;
        let items = extract_items(&xml);

        debug!(tracker = tracker, results = items.len(), "Tracker search complete");
        Ok(items)
    }
}

/// Merge per-tracker item lists into results with call-scoped ids.
///
/// `per_tracker` must already be in the caller's tracker order.
pub(crate) fn merge_tracker_results(per_tracker: Vec<(String, Vec<RawItem>)>) -> Vec<SearchResult> {
    let mut results = Vec::new();

    for (tracker, items) in per_tracker {
        for raw in items {
            let Some(title) = raw.title.clone() else {
                continue;
            };
            results.push(SearchResult {
                id: format!("{}-{}", tracker, results.len()),
                tracker: tracker.clone(),
                title,
                guid: raw.guid.clone(),
                size_bytes: raw.size,
                seeders: raw.seeders,
                magnet: raw.magnet.clone(),
                torrent_url: raw.torrent_url.clone(),
                raw,
            });
        }
    }

    results
}

#[async_trait]
impl Searcher for JackettClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn list_indexers(&self) -> Result<Vec<Indexer>, SearchError> {
        let xml = self.fetch_xml(&self.build_indexers_url(), "indexers").await?;
        let indexers = extract_indexers(&xml);
        debug!(count = indexers.len(), "Listed Jackett indexers");
        Ok(indexers)
    }

    async fn search(&self, query: &str, trackers: &[String]) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() || trackers.is_empty() {
            return Vec::new();
        }

        let start = Instant::now();
        debug!(trackers = ?trackers, query = %query, "Starting parallel search");

        // join_all yields in input order, so arrival order never leaks into
        // the merged list.
        let search_futures: Vec<_> = trackers
            .iter()
            .map(|tracker| async move {
                let result = self.search_tracker(query, tracker).await;
                (tracker.clone(), result)
            })
            .collect();

        let per_tracker = futures::future::join_all(search_futures)
            .await
            .into_iter()
            .map(|(tracker, result)| match result {
                Ok(items) => (tracker, items),
                Err(e) => {
                    warn!(tracker = %tracker, error = %e, "Tracker search failed");
                    TRACKER_FAILURES.with_label_values(&[&tracker]).inc();
                    (tracker, Vec::new())
                }
            })
            .collect();

        let results = merge_tracker_results(per_tracker);
        SEARCH_RESULTS
            .with_label_values(&[])
            .observe(results.len() as f64);

        debug!(
            results = results.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Search complete"
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> JackettClient {
        JackettClient::new(JackettConfig {
            url: url.to_string(),
            api_key: "test-key".to_string(),
            timeout_secs: 30,
        })
        .unwrap()
    }

    fn raw(title: &str) -> RawItem {
        RawItem {
            title: Some(title.to_string()),
            seeders: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_search_url() {
        let url = client("http://localhost:9117").build_search_url("test query", "1337x");
        assert_eq!(
            url,
            "http://localhost:9117/api/v2.0/indexers/1337x/results/torznab/api?apikey=test-key&t=search&q=test%20query"
        );
    }

    #[test]
    fn test_build_indexers_url_trailing_slash() {
        let url = client("http://localhost:9117/").build_indexers_url();
        assert_eq!(
            url,
            "http://localhost:9117/api/v2.0/indexers/all/results/torznab/api?apikey=test-key&t=indexers&configured=true"
        );
    }

    #[test]
    fn test_merge_assigns_positional_ids_in_tracker_order() {
        let merged = merge_tracker_results(vec![
            ("b".to_string(), vec![raw("b1"), raw("b2")]),
            ("a".to_string(), vec![]),
            ("c".to_string(), vec![raw("c1")]),
        ]);

        let ids: Vec<_> = merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b-0", "b-1", "c-2"]);
        assert_eq!(merged[2].tracker, "c");
        assert_eq!(merged[2].title, "c1");
        assert_eq!(merged[2].seeders, Some(1));
        assert_eq!(merged[2].raw.title.as_deref(), Some("c1"));
    }

    #[test]
    fn test_merge_keeps_duplicates_across_trackers() {
        let merged = merge_tracker_results(vec![
            ("a".to_string(), vec![raw("same")]),
            ("b".to_string(), vec![raw("same")]),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[tokio::test]
    async fn test_search_with_empty_inputs_is_noop() {
        // Unroutable address: any request would fail, but none is made.
        let searcher = client("http://127.0.0.1:1");
        assert!(searcher.search("", &["a".to_string()]).await.is_empty());
        assert!(searcher.search("   ", &["a".to_string()]).await.is_empty());
        assert!(searcher.search("query", &[]).await.is_empty());
    }
}
