use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::config::{CacheConfig, ValuationTables};
use crate::recommend::DynRecommender;
use crate::scoring;
use crate::search::{self, cache::ResultCache, SearchQuery, SearchResult};
use crate::store::PropertyStore;
use crate::valuation::{
    self,
    roi::{DynRoiProvider, RoiOutcome},
    ValidationError, ValuationInput,
};

/// Default result page size when the query does not set one.
const DEFAULT_SEARCH_LIMIT: usize = 50;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn PropertyStore>,
    tables: Arc<ValuationTables>,
    roi: DynRoiProvider,
    recommender: DynRecommender,
    search_cache: Arc<Mutex<ResultCache>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PropertyStore>,
        tables: ValuationTables,
        roi: DynRoiProvider,
        recommender: DynRecommender,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            store,
            tables: Arc::new(tables),
            roi,
            recommender,
            search_cache: Arc::new(Mutex::new(ResultCache::new(cache_config))),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", post(search_handler))
        .route("/valuation", post(valuation_handler))
        .route("/scores/recalculate", post(recalculate_handler))
        .route("/scores/{property_id}", get(score_handler))
        .route("/roi/predict", post(roi_handler))
        .route("/admin/clear-search-cache", get(clear_cache_handler))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Search response payload; also the cached value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// Count of scored candidates before the page limit.
    pub total: usize,
    pub took_ms: u64,
    pub cache_hit: bool,
}

async fn search_handler(State(state): State<AppState>, Json(query): Json<SearchQuery>) -> Response {
    metrics::counter!("search_requests_total").increment(1);
    let started = Instant::now();
    let query = query.sanitize();
    let key = query.canonical_key();

    // Cache check first; the lock is never held across an await.
    let cached = {
        let mut cache = state.search_cache.lock().expect("search cache lock");
        cache.get(&key)
    };
    if let Some(mut hit) = cached {
        metrics::counter!("search_cache_hits_total").increment(1);
        hit.cache_hit = true;
        return ([("X-Search-Cache", "HIT")], Json(hit)).into_response();
    }

    // Candidate fetch with a reduced-parameter fallback: when the
    // location-filtered path fails, retry unfiltered before giving up (the
    // location sub-score still ranks by location afterwards).
    let candidates = match state
        .store
        .fetch_active_properties(query.location.as_deref())
        .await
    {
        Ok(c) => c,
        Err(e) => {
            warn!(error = ?e, "filtered candidate fetch failed; retrying without location filter");
            match state.store.fetch_active_properties(None).await {
                Ok(c) => c,
                Err(e) => {
                    error!(error = ?e, "search candidate fetch failed");
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "search failed, try narrowing filters",
                    );
                }
            }
        }
    };

    let mut results = search::rank(candidates, &query);

    if let Some(user_id) = query.user_id.as_deref() {
        let context = query.query_text.as_deref().unwrap_or("");
        match state.recommender.recommended_ids(user_id, context).await {
            Ok(ids) => search::apply_personalization(&mut results, &ids),
            Err(e) => warn!(error = ?e, "recommender unavailable; serving unpersonalized results"),
        }
    }

    search::sort_results(&mut results, query.sort_by);

    let total = results.len();
    results.truncate(query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT));

    let response = SearchResponse {
        results,
        total,
        took_ms: started.elapsed().as_millis() as u64,
        cache_hit: false,
    };

    {
        let mut cache = state.search_cache.lock().expect("search cache lock");
        cache.insert(key, response.clone());
    }

    ([("X-Search-Cache", "MISS")], Json(response)).into_response()
}

#[derive(Debug, Deserialize)]
struct ValuationRequest {
    #[serde(default)]
    property_id: Option<String>,
    /// Inline input for not-yet-listed properties.
    #[serde(default)]
    input: Option<ValuationInput>,
    #[serde(default)]
    persist: bool,
}

async fn valuation_handler(
    State(state): State<AppState>,
    Json(req): Json<ValuationRequest>,
) -> Response {
    let (input, subject_id) = match (req.property_id, req.input) {
        (Some(id), _) => match state.store.fetch_property(&id).await {
            Ok(Some(attrs)) => (ValuationInput::from(&attrs), Some(id)),
            Ok(None) => return error_response(StatusCode::NOT_FOUND, "property not found"),
            Err(e) => {
                error!(error = ?e, "property fetch failed");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "valuation failed");
            }
        },
        (None, Some(input)) => (input, None),
        (None, None) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "either property_id or input is required",
            )
        }
    };

    match valuation::run_valuation(
        state.store.as_ref(),
        &state.tables,
        &input,
        subject_id.as_deref(),
        req.persist,
    )
    .await
    {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            if let Some(v) = e.downcast_ref::<ValidationError>() {
                return error_response(StatusCode::UNPROCESSABLE_ENTITY, v.to_string());
            }
            error!(error = ?e, "valuation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "valuation failed")
        }
    }
}

async fn recalculate_handler(State(state): State<AppState>) -> Response {
    match scoring::recalculate_all(state.store.as_ref()).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => {
            error!(error = ?e, "score recalculation failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "score recalculation failed",
            )
        }
    }
}

async fn score_handler(State(state): State<AppState>, Path(property_id): Path<String>) -> Response {
    match state.store.fetch_score(&property_id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "no score record for property"),
        Err(e) => {
            error!(error = ?e, "score fetch failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "score fetch failed")
        }
    }
}

#[derive(Debug, Deserialize)]
struct RoiRequest {
    property_id: String,
}

async fn roi_handler(State(state): State<AppState>, Json(req): Json<RoiRequest>) -> Response {
    let property = match state.store.fetch_property(&req.property_id).await {
        Ok(Some(p)) => p,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "property not found"),
        Err(e) => {
            error!(error = ?e, "property fetch failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "roi prediction failed");
        }
    };

    let outcome = state.roi.predict(&property).await;

    // Persist confident predictions; the score row keeps its other fields.
    if let RoiOutcome::Predicted { prediction } = &outcome {
        if prediction.confidence > 0.0 {
            if let Err(e) = state
                .store
                .update_roi(
                    &req.property_id,
                    prediction.predicted_roi,
                    prediction.confidence,
                )
                .await
            {
                warn!(error = ?e, "failed to persist ROI prediction");
            }
        }
    }

    Json(outcome).into_response()
}

async fn clear_cache_handler(State(state): State<AppState>) -> &'static str {
    state
        .search_cache
        .lock()
        .expect("search cache lock")
        .clear();
    "cleared"
}
