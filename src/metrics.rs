//! Prometheus exposition for the engine's operational counters.
//!
//! Instruments are incremented at their call sites (`search_handler`, the
//! batch recalculation); this module owns the recorder, the metric
//! descriptions, and the `/metrics` route.

use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global recorder and describe every instrument the engine
    /// emits. Call once at startup, before the first request.
    pub fn init(cache_ttl_ms: u64) -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus recorder already installed");

        describe_counter!("search_requests_total", "Search requests received");
        describe_counter!(
            "search_cache_hits_total",
            "Search responses served from the result cache"
        );
        describe_counter!(
            "score_batch_chunk_failures_total",
            "Score upsert chunks that failed and were skipped"
        );
        describe_gauge!(
            "search_cache_ttl_ms",
            "Configured TTL of the search result cache"
        );
        // The TTL is fixed at startup; exporting it lets a cache-hit-rate
        // dashboard annotate itself without reading our config.
        gauge!("search_cache_ttl_ms").set(cache_ttl_ms as f64);

        Self { handle }
    }

    /// `GET /metrics` in Prometheus exposition format, to be merged into
    /// the main router.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            }),
        )
    }
}
