// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod metrics;
pub mod normalize;
pub mod property;
pub mod recommend;
pub mod scoring;
pub mod search;
pub mod signals;
pub mod store;
pub mod valuation;

#[cfg(test)]
pub(crate) mod testutil;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState, SearchResponse};
pub use crate::scoring::ScoreRecord;
pub use crate::search::{SearchQuery, SearchResult, SortBy};
pub use crate::valuation::{ValuationInput, ValuationResult};

use std::sync::Arc;

use axum::Router;

use crate::config::{CacheConfig, ValuationTables};
use crate::recommend::NoRecommender;
use crate::store::InMemoryStore;
use crate::valuation::roi::build_roi_provider;

/// Build the application router with default wiring: valuation tables from
/// config (seed fallback), ROI provider from config/env, no personalization,
/// and an empty in-memory store. Tests that need seeded data construct an
/// [`AppState`] directly and call [`create_router`].
pub async fn app() -> anyhow::Result<Router> {
    let cache_config = CacheConfig::from_env();
    let state = AppState::new(
        Arc::new(InMemoryStore::new()),
        ValuationTables::load(),
        build_roi_provider(),
        Arc::new(NoRecommender),
        cache_config,
    );
    Ok(create_router(state))
}
