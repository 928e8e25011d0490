//! AllDebrid v4.1 API client implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::AllDebridConfig;
use crate::metrics::record_external_call;

use super::types::{flatten_file_tree, DebridError, DebridFile, DebridItem, DebridService};

const SERVICE: &str = "alldebrid";

/// AllDebrid client. Every call carries the API key as a bearer token.
pub struct AllDebridClient {
    client: Client,
    config: AllDebridConfig,
}

/// Response envelope shared by every AllDebrid endpoint.
#[derive(Debug, Default, Deserialize)]
struct Envelope {
    /// Anything but the string `"success"` counts as failure.
    #[serde(default)]
    status: Value,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Value,
}

impl Envelope {
    fn is_success(&self) -> bool {
        self.status.as_str() == Some("success")
    }

    /// The remote's own failure message, or the whole document.
    fn reason(&self, body: &Value) -> String {
        ["message", "code"]
            .into_iter()
            .filter_map(|field| self.error.get(field).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string())
    }
}

impl AllDebridClient {
    /// Create a new AllDebridClient with the given configuration.
    pub fn new(config: AllDebridConfig) -> Result<Self, DebridError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| DebridError::Unreachable(format!("HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    /// Send a request and decode the JSON envelope, whatever the HTTP status.
    async fn call(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<(Envelope, Value), DebridError> {
        let start = Instant::now();
        let result = self.call_inner(request).await;
        let success = matches!(&result, Ok((envelope, _)) if envelope.is_success());
        record_external_call(SERVICE, operation, success, start.elapsed());
        result
    }

    async fn call_inner(&self, request: RequestBuilder) -> Result<(Envelope, Value), DebridError> {
        let response = request.bearer_auth(&self.config.api_key).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let body: Value = serde_json::from_str(&text).map_err(|_| {
            DebridError::ParseFailure(format!("non-JSON response (HTTP {})", status))
        })?;
        let envelope = Envelope::deserialize(&body)
            .map_err(|e| DebridError::ParseFailure(e.to_string()))?;

        Ok((envelope, body))
    }

    /// Like `call`, but a non-success envelope becomes `Rejected` with `context`.
    async fn call_success(
        &self,
        operation: &str,
        context: &str,
        request: RequestBuilder,
    ) -> Result<(Envelope, Value), DebridError> {
        let (envelope, body) = self.call(operation, request).await?;
        if !envelope.is_success() {
            return Err(DebridError::Rejected(format!(
                "{}: {}",
                context,
                envelope.reason(&body)
            )));
        }
        Ok((envelope, body))
    }
}

#[async_trait]
impl DebridService for AllDebridClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn upload_magnet(&self, magnet: &str) -> Result<Value, DebridError> {
        debug!(magnet = %magnet, "Uploading magnet");
        let request = self
            .client
            .post(self.url("/magnet/upload"))
            .json(&json!({ "magnet": magnet }));

        let (_, body) = self
            .call_success("magnet_upload", "magnet upload failed", request)
            .await?;
        Ok(body)
    }

    async fn upload_torrent_file(&self, data: Vec<u8>) -> Result<Value, DebridError> {
        debug!(bytes = data.len(), "Uploading torrent file");
        let file_part = multipart::Part::bytes(data)
            .file_name("upload.torrent")
            .mime_str("application/x-bittorrent")
            .map_err(|e| DebridError::InvalidRequest(e.to_string()))?;
        let form = multipart::Form::new().part("files[]", file_part);

        let request = self
            .client
            .post(self.url("/magnet/upload/file"))
            .multipart(form);

        let (_, body) = match self.call_success("file_upload", "file upload failed", request).await {
            Err(DebridError::ParseFailure(reason)) => {
                return Err(DebridError::ParseFailure(format!("file upload failed: {}", reason)))
            }
            other => other?,
        };
        Ok(body)
    }

    async fn list_items(&self) -> Result<Vec<DebridItem>, DebridError> {
        let request = self.client.get(self.url("/magnet/status"));
        let (envelope, body) = self.call("status", request).await?;

        if !envelope.is_success() {
            warn!(reason = %envelope.reason(&body), "Item listing not successful, returning empty");
            return Ok(Vec::new());
        }

        let items: Vec<DebridItem> = envelope
            .data
            .get("magnets")
            .and_then(Value::as_array)
            .map(|records| records.iter().map(DebridItem::from_record).collect())
            .unwrap_or_default();

        debug!(count = items.len(), "Listed debrid items");
        Ok(items)
    }

    async fn delete_item(&self, id: &str) -> Result<Value, DebridError> {
        if id.trim().is_empty() {
            return Err(DebridError::InvalidRequest("item id required".to_string()));
        }

        let form = multipart::Form::new().text("id", id.to_string());
        let request = self.client.post(self.url("/magnet/delete")).multipart(form);

        let (_, body) = self
            .call_success("delete", "delete failed", request)
            .await?;
        debug!(item_id = %id, "Deleted debrid item");
        Ok(body)
    }

    async fn item_files(&self, id: &str) -> Result<Vec<DebridFile>, DebridError> {
        if id.trim().is_empty() {
            return Err(DebridError::InvalidRequest("item id required".to_string()));
        }

        let form = multipart::Form::new().text("id[]", id.to_string());
        let request = self.client.post(self.url("/magnet/files")).multipart(form);

        let (envelope, _) = self
            .call_success("files", "could not fetch files", request)
            .await?;

        let magnet = envelope
            .data
            .get("magnets")
            .and_then(|m| m.get(0))
            .ok_or_else(|| DebridError::ParseFailure("no file listing for item".to_string()))?;

        let nodes = magnet
            .get("files")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(flatten_file_tree(nodes))
    }

    async fn unlock_link(&self, link: &str) -> Result<String, DebridError> {
        let form = multipart::Form::new().text("link", link.to_string());
        let request = self.client.post(self.url("/link/unlock")).multipart(form);

        let (envelope, _) = self
            .call_success("unlock", "unlock failed", request)
            .await?;

        envelope
            .data
            .get("link")
            .and_then(Value::as_str)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .ok_or_else(|| DebridError::ParseFailure("unlock response has no link".to_string()))
    }
}
