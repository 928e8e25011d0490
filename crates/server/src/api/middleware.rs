//! Metrics middleware for API routes.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{
    normalize_path, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION,
};

/// Metrics middleware that tracks HTTP request duration and counts.
///
/// This middleware records:
/// - Request duration (histogram)
/// - Request count (counter)
/// - Requests in flight (gauge)
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "OK"
    }

    fn app() -> Router {
        Router::new()
            .route("/api/health", get(ok_handler))
            .layer(middleware::from_fn(metrics_middleware))
    }

    async fn send(app: Router, uri: &str) -> StatusCode {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    fn count(path: &str, status: &str) -> u64 {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", path, status])
            .get()
    }

    #[tokio::test]
    async fn test_metrics_middleware_counts_static_route() {
        let before = count("/api/health", "200");
        assert_eq!(send(app(), "/api/health").await, StatusCode::OK);
        assert_eq!(count("/api/health", "200"), before + 1);
    }

    #[tokio::test]
    async fn test_unknown_paths_share_one_label() {
        let before = count("/api/items/{id}", "404");

        assert_eq!(send(app(), "/api/items/17").await, StatusCode::NOT_FOUND);
        assert_eq!(send(app(), "/api/items/18").await, StatusCode::NOT_FOUND);

        assert_eq!(count("/api/items/{id}", "404"), before + 2);
        assert_eq!(count("/api/items/17", "404"), 0);
    }
}
