//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock providers injected, so every route can be exercised without
//! Jackett or AllDebrid.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use debridge_core::{
    testing::{MockDebridService, MockSearcher, MockSourceFetcher},
    AllDebridConfig, Config, DebridService, DebugConfig, JackettConfig, Searcher, SourceFetcher,
};
use debridge_server::state::AppState;

/// Re-export fixtures for test convenience
pub use debridge_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_list() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/api/list").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock searcher - configure indexers and per-tracker items
    pub searcher: Arc<MockSearcher>,
    /// Mock debrid service - configure items, files and unlocks
    pub debrid: Arc<MockDebridService>,
    /// Mock fetcher - configure downloadable sources
    pub fetcher: Arc<MockSourceFetcher>,
    /// Scratch directory for uploaded `.torrent` copies
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub bytes: Vec<u8>,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Inject the mock searcher
    pub with_searcher: bool,
    /// Inject the mock debrid service
    pub with_debrid: bool,
    /// Copy uploaded `.torrent` files into the fixture's temp dir
    pub persist_torrents: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            with_searcher: true,
            with_debrid: true,
            persist_torrents: false,
        }
    }
}

impl TestConfig {
    /// No providers configured.
    pub fn unconfigured() -> Self {
        Self {
            with_searcher: false,
            with_debrid: false,
            persist_torrents: false,
        }
    }

    /// Both providers, with scratch persistence enabled.
    pub fn with_scratch() -> Self {
        Self {
            persist_torrents: true,
            ..Self::default()
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let searcher = Arc::new(MockSearcher::new());
        let debrid = Arc::new(MockDebridService::new());
        let fetcher = Arc::new(MockSourceFetcher::new());

        let config = Config {
            jackett: test_config.with_searcher.then(|| JackettConfig {
                url: "http://jackett.test:9117".to_string(),
                api_key: "jackett-secret".to_string(),
                timeout_secs: 30,
            }),
            alldebrid: test_config.with_debrid.then(|| AllDebridConfig {
                api_key: "debrid-secret".to_string(),
                base_url: "https://api.alldebrid.com/v4.1".to_string(),
                panel_url: "https://alldebrid.com/magnets/".to_string(),
                timeout_secs: 30,
            }),
            debug: DebugConfig {
                torrent_dir: test_config
                    .persist_torrents
                    .then(|| temp_dir.path().join("torrents")),
            },
            ..Default::default()
        };

        let state = Arc::new(AppState::new(
            config,
            test_config
                .with_searcher
                .then(|| Arc::clone(&searcher) as Arc<dyn Searcher>),
            test_config
                .with_debrid
                .then(|| Arc::clone(&debrid) as Arc<dyn DebridService>),
            Arc::clone(&fetcher) as Arc<dyn SourceFetcher>,
        ));

        let router = debridge_server::api::create_router(state);

        Self {
            router,
            searcher,
            debrid,
            fetcher,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            bytes: body_bytes.to_vec(),
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
