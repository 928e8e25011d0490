use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{debrid, handlers, middleware::metrics_middleware, searcher};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/links", get(handlers::get_links))
        // Search (indexers configured in Jackett)
        .route("/trackers", get(searcher::list_trackers))
        .route("/search", get(searcher::search))
        // Debrid
        .route("/add", post(debrid::add))
        .route("/list", get(debrid::list))
        .route("/delete", post(debrid::delete))
        .route("/download-links", post(debrid::download_links))
        // .torrent retrieval
        .route("/download-torrent", post(debrid::download_torrent))
        .route("/extract-magnet", post(debrid::extract_magnet))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
