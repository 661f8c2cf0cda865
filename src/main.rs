//! Property Insight Engine — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use property_insight::config::{CacheConfig, ValuationTables};
use property_insight::metrics::Metrics;
use property_insight::recommend::NoRecommender;
use property_insight::store::InMemoryStore;
use property_insight::valuation::roi::build_roi_provider;
use property_insight::{create_router, AppState};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("property_insight=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments. This enables
    // VALUATION_CONFIG_PATH / SEARCH_CACHE_TTL_MS overrides from .env.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cache_config = CacheConfig::from_env();
    let metrics = Metrics::init(cache_config.ttl_ms);

    let state = AppState::new(
        Arc::new(InMemoryStore::new()),
        ValuationTables::load(),
        build_roi_provider(),
        Arc::new(NoRecommender),
        cache_config,
    );

    let router = create_router(state).merge(metrics.router());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "property-insight listening");
    axum::serve(listener, router).await?;
    Ok(())
}
