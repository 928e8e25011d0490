//! Debrid API handlers: submission, listing, deletion, link unlocking and
//! `.torrent` retrieval.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use debridge_core::{
    magnet_from_torrent, resolve_and_unlock, DebridError, DebridItem, DebridService,
    ExtractedMagnet, FetchedSource, RawItem, UnlockedLink,
};

use super::handlers::ErrorResponse;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Body carrying a search result's raw item.
#[derive(Debug, Default, Deserialize)]
pub struct RawRequest {
    #[serde(default)]
    pub raw: Option<RawItem>,
}

/// Body carrying a debrid item id, as a string or a number.
#[derive(Debug, Default, Deserialize)]
pub struct IdRequest {
    #[serde(default)]
    pub id: Option<Value>,
}

impl IdRequest {
    fn item_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub items: Vec<DebridItem>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub result: Value,
}

#[derive(Debug, Serialize)]
pub struct LinksResponse {
    pub success: bool,
    pub links: Vec<UnlockedLink>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// HTTP status for a failed single-target debrid operation.
pub fn error_status(e: &DebridError) -> StatusCode {
    match e {
        DebridError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        DebridError::NoUsableSource(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DebridError::EmptyResult(_) => StatusCode::NOT_FOUND,
        DebridError::Rejected(_)
        | DebridError::SourceUnavailable(_)
        | DebridError::ParseFailure(_)
        | DebridError::Unreachable(_)
        | DebridError::Timeout => StatusCode::BAD_GATEWAY,
    }
}

fn debrid_error(operation: &str, e: DebridError) -> ApiError {
    let status = error_status(&e);
    if status.is_server_error() {
        error!(operation, kind = e.kind(), error = %e, "Debrid operation failed");
    } else {
        warn!(operation, kind = e.kind(), error = %e, "Debrid operation failed");
    }
    (status, Json(ErrorResponse::new(e.to_string())))
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

fn not_configured() -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse::new("Debrid service not configured")),
    )
}

fn require_debrid(state: &AppState) -> Result<&Arc<dyn DebridService>, ApiError> {
    state.debrid().ok_or_else(not_configured)
}

fn require_raw(body: RawRequest) -> Result<RawItem, ApiError> {
    body.raw.ok_or_else(|| bad_request("missing raw item"))
}

fn require_id(body: &IdRequest) -> Result<String, ApiError> {
    body.item_id().ok_or_else(|| bad_request("missing item id"))
}

/// Download the `.torrent` a raw item points at.
async fn fetch_torrent(
    state: &AppState,
    raw: &RawItem,
    operation: &str,
) -> Result<FetchedSource, ApiError> {
    let url = raw
        .download_url()
        .ok_or_else(|| bad_request("item has no download URL"))?;
    state
        .fetcher()
        .fetch(&url)
        .await
        .map_err(|e| debrid_error(operation, e))
}

/// `<title with every non-alphanumeric replaced by _>.torrent`
pub fn torrent_filename(title: Option<&str>) -> String {
    let title = title.map(str::trim).filter(|t| !t.is_empty()).unwrap_or("torrent");
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.torrent", stem)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/add
///
/// Submit a search result to the debrid service. Responds with the
/// service's own success payload.
pub async fn add(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RawRequest>,
) -> Result<Json<Value>, ApiError> {
    let pipeline = state.pipeline().ok_or_else(not_configured)?;
    let raw = require_raw(body)?;

    let submission = pipeline
        .submit(&raw)
        .await
        .map_err(|e| debrid_error("add", e))?;

    info!(
        title = raw.title.as_deref().unwrap_or_default(),
        strategy = submission.strategy.as_str(),
        "Item submitted"
    );
    Ok(Json(submission.response))
}

/// GET /api/list
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<ListResponse>, ApiError> {
    let service = require_debrid(&state)?;
    let items = service
        .list_items()
        .await
        .map_err(|e| debrid_error("list", e))?;
    Ok(Json(ListResponse { items }))
}

/// POST /api/delete
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IdRequest>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let service = require_debrid(&state)?;
    let id = require_id(&body)?;

    let result = service
        .delete_item(&id)
        .await
        .map_err(|e| debrid_error("delete", e))?;

    info!(item_id = %id, "Item deleted");
    Ok(Json(DeleteResponse {
        success: true,
        result,
    }))
}

/// POST /api/download-links
///
/// Unlock every video file of an item. Files that fail to unlock are left
/// out of the response.
pub async fn download_links(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IdRequest>,
) -> Result<Json<LinksResponse>, ApiError> {
    let service = require_debrid(&state)?;
    let id = require_id(&body)?;

    let links = resolve_and_unlock(service.as_ref(), &id)
        .await
        .map_err(|e| debrid_error("download-links", e))?;

    Ok(Json(LinksResponse {
        success: true,
        links,
    }))
}

/// POST /api/download-torrent
///
/// Fetch an item's `.torrent` and hand it to the browser as an attachment.
pub async fn download_torrent(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RawRequest>,
) -> Result<Response, ApiError> {
    let raw = require_raw(body)?;
    let source = fetch_torrent(&state, &raw, "download-torrent").await?;
    let filename = torrent_filename(raw.title.as_deref());

    Ok((
        [
            (header::CONTENT_TYPE, "application/x-bittorrent".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        source.body,
    )
        .into_response())
}

/// POST /api/extract-magnet
///
/// Fetch an item's `.torrent` and build the equivalent magnet.
pub async fn extract_magnet(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RawRequest>,
) -> Result<Json<ExtractedMagnet>, ApiError> {
    let raw = require_raw(body)?;
    let source = fetch_torrent(&state, &raw, "extract-magnet").await?;

    let extracted = magnet_from_torrent(&source.body, raw.title.as_deref())
        .map_err(|e| debrid_error("extract-magnet", e))?;

    info!(info_hash = %extracted.info_hash, name = %extracted.name, "Extracted magnet");
    Ok(Json(extracted))
}
