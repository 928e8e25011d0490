use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::error;

use debridge_core::SanitizedConfig;

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// External panels the frontend links to. API keys are never included.
#[derive(Debug, Serialize)]
pub struct LinksResponse {
    pub jackett: Option<String>,
    pub alldebrid: Option<String>,
}

/// GET /api/health
///
/// Reachability of both providers: the indexer list must load and the
/// debrid item list must load.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    match check_providers(&state).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                ok: true,
                error: None,
            }),
        ),
        Err(e) => {
            error!(error = %e, "Health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    ok: false,
                    error: Some(e),
                }),
            )
        }
    }
}

async fn check_providers(state: &AppState) -> Result<(), String> {
    let searcher = state
        .searcher()
        .ok_or_else(|| "Search backend not configured".to_string())?;
    let debrid = state
        .debrid()
        .ok_or_else(|| "Debrid service not configured".to_string())?;

    searcher.list_indexers().await.map_err(|e| e.to_string())?;
    debrid.list_items().await.map_err(|e| e.to_string())?;
    Ok(())
}

/// GET /api/config
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /api/links
pub async fn get_links(State(state): State<Arc<AppState>>) -> Json<LinksResponse> {
    let config = state.config();
    Json(LinksResponse {
        jackett: config.jackett.as_ref().map(|j| j.url.clone()),
        alldebrid: config.alldebrid.as_ref().map(|a| a.panel_url.clone()),
    })
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
