use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use debridge_core::{
    load_config, validate_config, AllDebridClient, DebridService, HttpSourceFetcher,
    JackettClient, Searcher, SourceFetcher,
};
use debridge_server::{api::create_router, state::AppState};

/// Timeout for downloading `.torrent` files and indexer pages.
const SOURCE_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("DEBRIDGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    // Create searcher if configured
    let searcher: Option<Arc<dyn Searcher>> = match &config.jackett {
        Some(jackett_config) => {
            info!("Initializing Jackett searcher at {}", jackett_config.url);
            match JackettClient::new(jackett_config.clone()) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    error!("Failed to initialize Jackett client: {}", e);
                    None
                }
            }
        }
        None => {
            info!("No Jackett configured, search disabled");
            None
        }
    };

    // Create debrid service if configured
    let debrid: Option<Arc<dyn DebridService>> = match &config.alldebrid {
        Some(alldebrid_config) => {
            info!("Initializing AllDebrid client at {}", alldebrid_config.base_url);
            match AllDebridClient::new(alldebrid_config.clone()) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    error!("Failed to initialize AllDebrid client: {}", e);
                    None
                }
            }
        }
        None => {
            info!("No AllDebrid configured, debrid routes disabled");
            None
        }
    };

    let fetcher: Arc<dyn SourceFetcher> = Arc::new(
        HttpSourceFetcher::new(SOURCE_FETCH_TIMEOUT).context("Failed to create HTTP fetcher")?,
    );

    if let Some(dir) = &config.debug.torrent_dir {
        info!("Uploaded .torrent files will be copied to {:?}", dir);
    }

    let addr = SocketAddr::new(config.server.host, config.server.port);

    // Create app state
    let state = Arc::new(AppState::new(config, searcher, debrid, fetcher));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
