//! Searcher API handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use debridge_core::{Indexer, SearchOptions, SearchResult, Searcher, SortOrder};

use super::handlers::ErrorResponse;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Query string of `GET /api/search`. Everything arrives as text and is
/// interpreted leniently.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    /// Comma-separated indexer ids.
    #[serde(default)]
    pub trackers: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    /// `yes` keeps only seeded results.
    #[serde(default)]
    pub only_seeded: Option<String>,
}

impl SearchParams {
    pub fn query(&self) -> String {
        self.q.as_deref().unwrap_or_default().trim().to_string()
    }

    pub fn tracker_list(&self) -> Vec<String> {
        self.trackers
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            sort: self
                .sort
                .as_deref()
                .map(SortOrder::from_param)
                .unwrap_or_default(),
            only_seeded: self
                .only_seeded
                .as_deref()
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("yes")),
            limit: self
                .limit
                .as_deref()
                .and_then(|l| l.trim().parse::<usize>().ok())
                .filter(|l| *l > 0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Serialize)]
pub struct TrackersResponse {
    pub trackers: Vec<Indexer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn require_searcher(state: &AppState) -> Result<&Arc<dyn Searcher>, ApiError> {
    state.searcher().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("Search backend not configured")),
        )
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/trackers
///
/// Indexers configured in Jackett.
pub async fn list_trackers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TrackersResponse>, (StatusCode, Json<TrackersResponse>)> {
    let searcher = require_searcher(&state).map_err(|(status, Json(body))| {
        (
            status,
            Json(TrackersResponse {
                trackers: Vec::new(),
                error: Some(body.error),
            }),
        )
    })?;

    match searcher.list_indexers().await {
        Ok(trackers) => Ok(Json(TrackersResponse {
            trackers,
            error: None,
        })),
        Err(e) => {
            error!(error = %e, "Failed to list trackers");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TrackersResponse {
                    trackers: Vec::new(),
                    error: Some(e.to_string()),
                }),
            ))
        }
    }
}

/// GET /api/search?q=&trackers=a,b&sort=&limit=&onlySeeded=
///
/// Query the selected trackers, then filter, sort and truncate the merged
/// results. An empty query or tracker list yields no results.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let searcher = require_searcher(&state)?;

    let query = params.query();
    let trackers = params.tracker_list();
    let options = params.options();

    let results = searcher.search(&query, &trackers).await;
    let merged = results.len();
    let results = options.apply(results);

    debug!(
        query = %query,
        trackers = trackers.len(),
        merged,
        returned = results.len(),
        "Search completed"
    );

    Ok(Json(SearchResponse { results }))
}
