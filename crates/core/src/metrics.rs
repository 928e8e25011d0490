//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - External services (Jackett, AllDebrid, candidate downloads)
//! - Search aggregation
//! - Debrid submission and link unlocking

use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "debridge_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "debridge_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Search Metrics
// =============================================================================

/// Search results returned per aggregated query.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "debridge_search_results",
            "Number of search results returned per query",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        &[],
    )
    .unwrap()
});

/// Trackers that contributed nothing because their query failed.
pub static TRACKER_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "debridge_tracker_failures_total",
            "Per-tracker search failures swallowed during aggregation",
        ),
        &["tracker"],
    )
    .unwrap()
});

// =============================================================================
// Debrid Metrics
// =============================================================================

/// Submission attempts by result. `strategy` is the strategy that
/// submitted, or the stage that failed.
pub static SUBMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("debridge_submissions_total", "Total debrid submissions"),
        &["strategy", "result"], // result: "submitted", "failed"
    )
    .unwrap()
});

/// Files whose unlock failed inside a batch.
pub static UNLOCK_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "debridge_unlock_failures_total",
        "Per-file link unlock failures swallowed during a batch",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record one external call.
pub fn record_external_call(service: &str, operation: &str, success: bool, elapsed: Duration) {
    let status = if success { "success" } else { "error" };
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, status])
        .inc();
    EXTERNAL_SERVICE_DURATION
        .with_label_values(&[service, operation])
        .observe(elapsed.as_secs_f64());
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(TRACKER_FAILURES.clone()),
        Box::new(SUBMISSIONS.clone()),
        Box::new(UNLOCK_FAILURES.clone()),
    ]
}
