//! Prometheus metrics for the shelf server.
//!
//! Covers upstream traffic, record ingestion and store hits. No request
//! parameters are recorded as labels.
//!
//! The `/metrics` endpoint is unauthenticated; restrict it at the network
//! level when the server is reachable from outside.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Upstream metrics
pub static UPSTREAM_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "shelf_upstream_requests_total",
            "Upstream history requests by outcome (success, failed, fault)",
        ),
        &["outcome"],
    )
    .expect("metric creation failed")
});

pub static UPSTREAM_FETCH_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "shelf_upstream_fetch_duration_seconds",
            "Time spent waiting on the upstream, retries included",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
    )
    .expect("metric creation failed")
});

// Ingestion metrics
pub static RECORDS_STORED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "shelf_records_stored_total",
        "Upstream records persisted with their identifiers, ranks and reviews",
    )
    .expect("metric creation failed")
});

pub static RECORDS_SKIPPED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "shelf_records_skipped_total",
        "Upstream records rejected or rolled back during ingestion",
    )
    .expect("metric creation failed")
});

pub static SERVED_FROM_STORE: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "shelf_served_from_store_total",
        "Best seller queries answered from stored records",
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent, so tests can build as many routers as they like.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(UPSTREAM_REQUESTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPSTREAM_FETCH_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(RECORDS_STORED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(RECORDS_SKIPPED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SERVED_FROM_STORE.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Count one upstream request by outcome.
pub fn record_upstream_request(outcome: &str) {
    UPSTREAM_REQUESTS.with_label_values(&[outcome]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // This would panic if any metric creation failed
        register_metrics();
        register_metrics();
    }

    #[test]
    fn test_upstream_outcomes_are_labelled() {
        register_metrics();
        let before = UPSTREAM_REQUESTS.with_label_values(&["fault"]).get();
        record_upstream_request("fault");
        assert!(UPSTREAM_REQUESTS.with_label_values(&["fault"]).get() > before);
    }
}
