//! Types for debrid service operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during debrid operations.
#[derive(Debug, Error)]
pub enum DebridError {
    #[error("Debrid service unreachable: {0}")]
    Unreachable(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Debrid service rejected the request: {0}")]
    Rejected(String),

    #[error("Indexer source unavailable, could not fetch torrent: {0}")]
    SourceUnavailable(String),

    #[error("No usable source: {0}")]
    NoUsableSource(String),

    #[error("Malformed response: {0}")]
    ParseFailure(String),

    #[error("{0}")]
    EmptyResult(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl DebridError {
    /// Failure class name, stable across messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DebridError::Unreachable(_) | DebridError::Timeout => "upstream_unreachable",
            DebridError::Rejected(_) => "upstream_rejected",
            DebridError::SourceUnavailable(_) => "source_unavailable",
            DebridError::NoUsableSource(_) => "no_usable_source",
            DebridError::ParseFailure(_) => "parse_failure",
            DebridError::EmptyResult(_) => "empty_result",
            DebridError::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl From<reqwest::Error> for DebridError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DebridError::Timeout
        } else if e.is_decode() {
            DebridError::ParseFailure(e.to_string())
        } else {
            DebridError::Unreachable(e.to_string())
        }
    }
}

/// One item registered with the debrid service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebridItem {
    /// Remote id, or the content hash when the remote sends no id.
    pub id: String,
    pub magnet: Option<String>,
    pub title: String,
    pub size_bytes: Option<u64>,
    /// Remote caching state; polled, never pushed.
    pub ready: bool,
    /// Vendor timestamp, passed through as sent (string or number).
    pub created_at: Option<Value>,
    /// The remote record, untouched.
    pub raw: Value,
}

/// Timestamp fields seen on status records, in preference order.
const CREATED_AT_FIELDS: [&str; 6] = [
    "uploadDate",
    "upload_date",
    "added",
    "added_at",
    "time",
    "timestamp",
];

impl DebridItem {
    /// Map a remote status record, tolerating missing fields.
    pub fn from_record(record: &Value) -> Self {
        let id = [record.get("id"), record.get("hash")]
            .into_iter()
            .flatten()
            .find_map(scalar_string)
            .unwrap_or_default();

        let magnet = record.get("magnet").and_then(scalar_string);

        let title = ["name", "filename", "magnet"]
            .into_iter()
            .filter_map(|field| record.get(field))
            .find_map(scalar_string)
            .unwrap_or_else(|| "Sin nombre".to_string());

        let size_bytes = record.get("size").and_then(|size| match size {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
            Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as u64),
            _ => None,
        });

        let ready = record
            .get("ready")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let created_at = CREATED_AT_FIELDS
            .iter()
            .filter_map(|field| record.get(*field))
            .find(|v| is_populated(v))
            .cloned();

        Self {
            id,
            magnet,
            title,
            size_bytes,
            ready,
            created_at,
            raw: record.clone(),
        }
    }
}

/// Non-empty string, or a number rendered as one.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    }
}

/// One file entry from an item's file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebridFile {
    pub name: String,
    /// Opaque remote link, only usable through an unlock.
    pub link: String,
}

/// Flatten a remote file tree into its file entries.
///
/// Folders carry an `e` array of children; files carry `n` (name) and `l`
/// (link). Entries are visited depth-first in document order.
pub fn flatten_file_tree(nodes: &[Value]) -> Vec<DebridFile> {
    let mut files = Vec::new();
    for node in nodes {
        collect_files(node, &mut files);
    }
    files
}

fn collect_files(node: &Value, files: &mut Vec<DebridFile>) {
    if let Some(children) = node.get("e").and_then(Value::as_array) {
        for child in children {
            collect_files(child, files);
        }
        return;
    }

    let name = node.get("n").and_then(Value::as_str);
    let link = node.get("l").and_then(Value::as_str);
    if let (Some(name), Some(link)) = (name, link) {
        if !name.is_empty() && !link.is_empty() {
            files.push(DebridFile {
                name: name.to_string(),
                link: link.to_string(),
            });
        }
    }
}

/// A playable file of an item, before unlocking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFile {
    pub name: String,
    pub url: String,
}

/// A direct download link. May expire remotely; never cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedLink {
    pub filename: String,
    pub url: String,
}

/// Which strategy produced a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStrategy {
    /// The item carried a magnet.
    MagnetDirect,
    /// A magnet was found in the fetched page (or the URL was one).
    BodyMagnet,
    /// Raw `.torrent` bytes were uploaded.
    TorrentFile,
}

impl SubmitStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitStrategy::MagnetDirect => "magnet_direct",
            SubmitStrategy::BodyMagnet => "body_magnet",
            SubmitStrategy::TorrentFile => "torrent_file",
        }
    }
}

/// A successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub strategy: SubmitStrategy,
    /// The service's success response, as sent.
    pub response: Value,
}

/// Trait for remote debrid services.
#[async_trait]
pub trait DebridService: Send + Sync {
    /// Service name for logging.
    fn name(&self) -> &str;

    /// Register a magnet URI. Returns the success response.
    async fn upload_magnet(&self, magnet: &str) -> Result<Value, DebridError>;

    /// Register raw `.torrent` bytes. Returns the success response.
    async fn upload_torrent_file(&self, data: Vec<u8>) -> Result<Value, DebridError>;

    /// Snapshot of every registered item. Empty when the service reports
    /// non-success.
    async fn list_items(&self) -> Result<Vec<DebridItem>, DebridError>;

    /// Remove an item. Returns the success response.
    async fn delete_item(&self, id: &str) -> Result<Value, DebridError>;

    /// Flattened file list of an item.
    async fn item_files(&self, id: &str) -> Result<Vec<DebridFile>, DebridError>;

    /// Exchange an opaque file link for a direct download URL.
    async fn unlock_link(&self, link: &str) -> Result<String, DebridError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_from_full_record() {
        let record = json!({
            "id": 12345,
            "hash": "abc",
            "filename": "Movie.2024.mkv",
            "size": 1_000_000,
            "ready": true,
            "uploadDate": 1_700_000_000,
        });
        let item = DebridItem::from_record(&record);
        assert_eq!(item.id, "12345");
        assert_eq!(item.title, "Movie.2024.mkv");
        assert_eq!(item.size_bytes, Some(1_000_000));
        assert!(item.ready);
        assert_eq!(item.created_at, Some(json!(1_700_000_000)));
        assert_eq!(item.raw, record);
    }

    #[test]
    fn test_item_fallbacks() {
        let record = json!({
            "hash": "deadbeef",
            "magnet": "magnet:?xt=urn:btih:deadbeef",
            "size": "2048",
            "upload_date": "",
            "added_at": "2024-01-01",
        });
        let item = DebridItem::from_record(&record);
        assert_eq!(item.id, "deadbeef");
        assert_eq!(item.title, "magnet:?xt=urn:btih:deadbeef");
        assert_eq!(item.magnet.as_deref(), Some("magnet:?xt=urn:btih:deadbeef"));
        assert_eq!(item.size_bytes, Some(2048));
        assert!(!item.ready);
        assert_eq!(item.created_at, Some(json!("2024-01-01")));
    }

    #[test]
    fn test_item_from_empty_record() {
        let item = DebridItem::from_record(&json!({}));
        assert_eq!(item.id, "");
        assert_eq!(item.title, "Sin nombre");
        assert!(item.size_bytes.is_none());
        assert!(item.created_at.is_none());
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let item = DebridItem::from_record(&json!({"id": "1", "name": "x", "size": 5}));
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["sizeBytes"], 5);
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_flatten_file_tree_nested_and_top_level() {
        let tree = vec![
            json!({"n": "single.mp4", "l": "https://l/1"}),
            json!({"n": "Season 1", "e": [
                {"n": "ep1.mkv", "l": "https://l/2"},
                {"n": "Extras", "e": [{"n": "bonus.avi", "l": "https://l/3"}]},
                {"n": "nolink.txt"}
            ]}),
        ];
        let files = flatten_file_tree(&tree);
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["single.mp4", "ep1.mkv", "bonus.avi"]);
        assert_eq!(files[2].link, "https://l/3");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(DebridError::Timeout.kind(), "upstream_unreachable");
        assert_eq!(
            DebridError::SourceUnavailable("x".into()).kind(),
            "source_unavailable"
        );
        assert_eq!(
            DebridError::EmptyResult("x".into()).kind(),
            "empty_result"
        );
        assert_eq!(
            DebridError::NoUsableSource("x".into()).kind(),
            "no_usable_source"
        );
    }
}
