//! Mock debrid service for testing.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::debrid::{DebridError, DebridFile, DebridItem, DebridService};

/// Mock implementation of the DebridService trait.
///
/// Provides controllable behavior for testing:
/// - Track magnet and file uploads, deletions and unlocks for assertions
/// - Configure file trees and unlock results per item/link
/// - Simulate failures
///
/// Every successful upload registers a new item visible to `list_items`.
///
/// # Example
///
/// ```rust,ignore
/// let service = MockDebridService::new();
/// service.set_files("1", vec![DebridFile { name: "a.mkv".into(), link: "l1".into() }]).await;
/// service.set_unlock("l1", "https://dl/a.mkv").await;
///
/// let links = resolve_and_unlock(&service, "1").await?;
/// assert_eq!(service.unlocked_links().await, vec!["l1"]);
/// ```
#[derive(Debug)]
pub struct MockDebridService {
    /// Magnets passed to upload_magnet.
    magnets: Arc<RwLock<Vec<String>>>,
    /// Bytes passed to upload_torrent_file.
    files: Arc<RwLock<Vec<Vec<u8>>>>,
    /// Registered items.
    items: Arc<RwLock<Vec<DebridItem>>>,
    /// Ids passed to delete_item.
    deleted: Arc<RwLock<Vec<String>>>,
    /// File listing per item id.
    item_files: Arc<RwLock<HashMap<String, Vec<DebridFile>>>>,
    /// Direct URL per opaque link.
    unlocks: Arc<RwLock<HashMap<String, String>>>,
    /// Links whose unlock fails.
    failing_unlocks: Arc<RwLock<HashSet<String>>>,
    /// Links passed to unlock_link, in call order.
    unlock_calls: Arc<RwLock<Vec<String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<DebridError>>>,
    /// Counter for generating item ids.
    id_counter: Arc<RwLock<u64>>,
}

impl Default for MockDebridService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDebridService {
    /// Create a new mock service with no items.
    pub fn new() -> Self {
        Self {
            magnets: Arc::new(RwLock::new(Vec::new())),
            files: Arc::new(RwLock::new(Vec::new())),
            items: Arc::new(RwLock::new(Vec::new())),
            deleted: Arc::new(RwLock::new(Vec::new())),
            item_files: Arc::new(RwLock::new(HashMap::new())),
            unlocks: Arc::new(RwLock::new(HashMap::new())),
            failing_unlocks: Arc::new(RwLock::new(HashSet::new())),
            unlock_calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            id_counter: Arc::new(RwLock::new(0)),
        }
    }

    /// Magnets uploaded so far.
    pub async fn uploaded_magnets(&self) -> Vec<String> {
        self.magnets.read().await.clone()
    }

    /// Torrent files uploaded so far.
    pub async fn uploaded_files(&self) -> Vec<Vec<u8>> {
        self.files.read().await.clone()
    }

    /// Ids deleted so far.
    pub async fn deleted_ids(&self) -> Vec<String> {
        self.deleted.read().await.clone()
    }

    /// Links unlock was attempted for, in call order.
    pub async fn unlocked_links(&self) -> Vec<String> {
        self.unlock_calls.read().await.clone()
    }

    /// Replace the registered items.
    pub async fn set_items(&self, items: Vec<DebridItem>) {
        *self.items.write().await = items;
    }

    /// Configure the file listing of an item.
    pub async fn set_files(&self, item_id: &str, files: Vec<DebridFile>) {
        self.item_files
            .write()
            .await
            .insert(item_id.to_string(), files);
    }

    /// Configure a successful unlock.
    pub async fn set_unlock(&self, link: &str, url: &str) {
        self.unlocks
            .write()
            .await
            .insert(link.to_string(), url.to_string());
    }

    /// Make unlocking `link` fail.
    pub async fn fail_unlock(&self, link: &str) {
        self.failing_unlocks.write().await.insert(link.to_string());
    }

    /// Make the next operation fail with the given error.
    pub async fn set_next_error(&self, error: DebridError) {
        *self.next_error.write().await = Some(error);
    }

    async fn check_error(&self) -> Result<(), DebridError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(())
    }

    async fn register(&self, title: &str, magnet: Option<&str>) -> Value {
        let id = {
            let mut counter = self.id_counter.write().await;
            *counter += 1;
            *counter
        };

        let record = json!({
            "id": id,
            "filename": title,
            "magnet": magnet,
            "ready": false,
        });
        self.items
            .write()
            .await
            .push(DebridItem::from_record(&record));

        json!({
            "status": "success",
            "data": { "magnets": [{ "id": id, "name": title, "ready": false }] }
        })
    }
}

#[async_trait]
impl DebridService for MockDebridService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload_magnet(&self, magnet: &str) -> Result<Value, DebridError> {
        self.check_error().await?;
        self.magnets.write().await.push(magnet.to_string());
        Ok(self.register(magnet, Some(magnet)).await)
    }

    async fn upload_torrent_file(&self, data: Vec<u8>) -> Result<Value, DebridError> {
        self.check_error().await?;
        self.files.write().await.push(data);
        Ok(self.register("upload.torrent", None).await)
    }

    async fn list_items(&self) -> Result<Vec<DebridItem>, DebridError> {
        self.check_error().await?;
        Ok(self.items.read().await.clone())
    }

    async fn delete_item(&self, id: &str) -> Result<Value, DebridError> {
        self.check_error().await?;
        self.deleted.write().await.push(id.to_string());
        self.items.write().await.retain(|item| item.id != id);
        Ok(json!({ "status": "success", "data": { "message": "Magnet was successfully deleted" } }))
    }

    async fn item_files(&self, id: &str) -> Result<Vec<DebridFile>, DebridError> {
        self.check_error().await?;
        self.item_files
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DebridError::Rejected(format!("could not fetch files: unknown item {}", id)))
    }

    async fn unlock_link(&self, link: &str) -> Result<String, DebridError> {
        self.check_error().await?;
        self.unlock_calls.write().await.push(link.to_string());

        if self.failing_unlocks.read().await.contains(link) {
            return Err(DebridError::Rejected("unlock failed: link is dead".to_string()));
        }
        self.unlocks
            .read()
            .await
            .get(link)
            .cloned()
            .ok_or_else(|| DebridError::Rejected(format!("unlock failed: unknown link {}", link)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uploads_register_items() {
        let service = MockDebridService::new();
        service.upload_magnet("magnet:?xt=urn:btih:A").await.unwrap();
        service.upload_torrent_file(vec![1, 2, 3]).await.unwrap();

        let items = service.list_items().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "1");
        assert_eq!(items[1].title, "upload.torrent");

        service.delete_item("1").await.unwrap();
        assert_eq!(service.list_items().await.unwrap().len(), 1);
        assert_eq!(service.deleted_ids().await, vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn test_next_error_is_one_shot() {
        let service = MockDebridService::new();
        service.set_next_error(DebridError::Timeout).await;

        assert!(service.list_items().await.is_err());
        assert!(service.list_items().await.is_ok());
    }
}
