//! Integration tests for the search endpoint and its result cache.
//!
//! Covered:
//! - Neutral score 50 when no query dimension applies
//! - Price-band-only query scores an in-band property 100
//! - MISS → HIT for identical request (via `X-Search-Cache` header)
//! - Expiration/TTL driven by `SEARCH_CACHE_TTL_MS` env (short TTL)
//! - `/admin/clear-search-cache` empties the cache
//! - Reduced-parameter fallback when the filtered fetch fails
//! - Personalization boost via the recommender seam

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use serial_test::serial;
use tokio::time::sleep;
use tower::ServiceExt; // for oneshot

use property_insight::config::{CacheConfig, ValuationTables};
use property_insight::property::{Furnishing, PropertyAttributes, PropertyType};
use property_insight::recommend::{NoRecommender, StaticRecommender};
use property_insight::store::InMemoryStore;
use property_insight::valuation::roi::build_roi_provider;
use property_insight::{create_router, AppState};

fn listing(id: &str) -> PropertyAttributes {
    PropertyAttributes {
        id: id.to_string(),
        title: format!("Listing {id}"),
        description: String::new(),
        property_type: PropertyType::House,
        price: 1_000_000_000.0,
        land_area: None,
        building_area: Some(100.0),
        bedrooms: Some(3),
        bathrooms: Some(2),
        floors: Some(1),
        legal_status: None,
        foreign_eligible: false,
        roi_percentage: None,
        rental_yield: None,
        has_pool: false,
        has_garden: false,
        parking_spaces: 0,
        furnishing: Furnishing::Unfurnished,
        view_type: None,
        has_3d_model: false,
        has_vr_tour: false,
        image_count: 5,
        city: "Jakarta".to_string(),
        district: None,
        location: "Jakarta".to_string(),
        year_built: None,
        condition: None,
        features: Vec::new(),
        latitude: None,
        longitude: None,
        created_at: Utc::now(),
        view_count: 0,
        is_active: true,
    }
}

fn build_router(store: Arc<InMemoryStore>) -> Router {
    let state = AppState::new(
        store,
        ValuationTables::default_seed(),
        build_roi_provider(),
        Arc::new(NoRecommender),
        CacheConfig::from_env(),
    );
    create_router(state)
}

async fn post_search(app: &Router, payload: Value) -> (StatusCode, HeaderMap, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/search")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&payload).expect("payload")))
        .expect("request build");

    let resp = app.clone().oneshot(req).await.expect("router response");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");
    (status, headers, body)
}

fn cache_header(headers: &HeaderMap) -> &str {
    headers
        .get("X-Search-Cache")
        .expect("X-Search-Cache header must be present")
        .to_str()
        .expect("ASCII header")
}

#[tokio::test]
#[serial]
async fn default_wiring_serves_health() {
    std::env::remove_var("SEARCH_CACHE_TTL_MS");
    let app = property_insight::app().await.expect("default app wiring");
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request build");
    let resp = app.oneshot(req).await.expect("router response");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn no_filters_yield_neutral_score() {
    std::env::remove_var("SEARCH_CACHE_TTL_MS");
    std::env::remove_var("SEARCH_CACHE_CAPACITY");
    let store = Arc::new(InMemoryStore::seeded(vec![listing("p1")]));
    let app = build_router(store);

    let (status, _, body) = post_search(&app, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["results"][0]["relevance_score"], 50.0);
}

#[tokio::test]
#[serial]
async fn price_band_only_scores_in_band_property_full() {
    std::env::remove_var("SEARCH_CACHE_TTL_MS");
    let store = Arc::new(InMemoryStore::seeded(vec![listing("p1")]));
    let app = build_router(store);

    let (status, _, body) = post_search(
        &app,
        json!({ "price_min": 500_000_000.0, "price_max": 2_000_000_000.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["relevance_score"], 100.0);
}

#[tokio::test]
#[serial]
async fn cache_miss_then_hit_for_identical_request() {
    std::env::set_var("SEARCH_CACHE_TTL_MS", "30000");
    let store = Arc::new(InMemoryStore::seeded(vec![listing("p1")]));
    let app = build_router(store);

    let query = json!({ "query_text": "jakarta house" });

    let (status, headers, body) = post_search(&app, query.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_header(&headers), "MISS");
    assert_eq!(body["cache_hit"], false);

    let (status, headers, body) = post_search(&app, query).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_header(&headers), "HIT");
    assert_eq!(body["cache_hit"], true);

    // A different query is its own entry.
    let (_, headers, _) = post_search(&app, json!({ "query_text": "villa" })).await;
    assert_eq!(cache_header(&headers), "MISS");

    std::env::remove_var("SEARCH_CACHE_TTL_MS");
}

#[tokio::test]
#[serial]
async fn cache_entry_expires_after_ttl() {
    std::env::set_var("SEARCH_CACHE_TTL_MS", "50");
    let store = Arc::new(InMemoryStore::seeded(vec![listing("p1")]));
    let app = build_router(store);

    let query = json!({ "query_text": "expiring" });

    let (_, headers, _) = post_search(&app, query.clone()).await;
    assert_eq!(cache_header(&headers), "MISS");
    let (_, headers, _) = post_search(&app, query.clone()).await;
    assert_eq!(cache_header(&headers), "HIT");

    // 5x TTL gives headroom against slow CI timers.
    sleep(Duration::from_millis(250)).await;

    let (_, headers, _) = post_search(&app, query).await;
    assert_eq!(cache_header(&headers), "MISS");

    std::env::remove_var("SEARCH_CACHE_TTL_MS");
}

#[tokio::test]
#[serial]
async fn admin_endpoint_clears_the_cache() {
    std::env::set_var("SEARCH_CACHE_TTL_MS", "30000");
    let store = Arc::new(InMemoryStore::seeded(vec![listing("p1")]));
    let app = build_router(store);

    let query = json!({ "query_text": "to be cleared" });
    post_search(&app, query.clone()).await;
    let (_, headers, _) = post_search(&app, query.clone()).await;
    assert_eq!(cache_header(&headers), "HIT");

    let req = Request::builder()
        .uri("/admin/clear-search-cache")
        .body(Body::empty())
        .expect("request build");
    let resp = app.clone().oneshot(req).await.expect("router response");
    assert_eq!(resp.status(), StatusCode::OK);

    let (_, headers, _) = post_search(&app, query).await;
    assert_eq!(cache_header(&headers), "MISS");

    std::env::remove_var("SEARCH_CACHE_TTL_MS");
}

#[tokio::test]
#[serial]
async fn filtered_fetch_failure_falls_back_to_unfiltered() {
    std::env::remove_var("SEARCH_CACHE_TTL_MS");
    let store = Arc::new(InMemoryStore::seeded(vec![listing("p1")]));
    store.set_fail_filtered_fetch(true);
    let app = build_router(store.clone());

    let (status, _, body) = post_search(&app, json!({ "location": "jakarta" })).await;
    assert_eq!(status, StatusCode::OK);
    // The unfiltered retry still serves the candidate; the location
    // sub-score keeps ranking by location.
    assert_eq!(body["total"], 1);
}

#[tokio::test]
#[serial]
async fn recommended_properties_get_boosted() {
    std::env::remove_var("SEARCH_CACHE_TTL_MS");
    let mut plain = listing("plain");
    plain.title = "Listing one".to_string();
    let mut favored = listing("favored");
    favored.title = "Listing two".to_string();
    let store = Arc::new(InMemoryStore::seeded(vec![plain, favored]));

    let state = AppState::new(
        store,
        ValuationTables::default_seed(),
        build_roi_provider(),
        Arc::new(StaticRecommender {
            ids: vec!["favored".to_string()],
        }),
        CacheConfig::from_env(),
    );
    let app = create_router(state);

    let (status, _, body) = post_search(&app, json!({ "user_id": "u1" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["property"]["id"], "favored");
    // Neutral 50 boosted by 1.2.
    assert_eq!(body["results"][0]["relevance_score"], 60.0);
    assert_eq!(body["results"][1]["relevance_score"], 50.0);
    let reasons = body["results"][0]["match_reasons"]
        .as_array()
        .expect("reasons array");
    assert!(reasons.iter().any(|r| r == "recommended for you"));
}

#[tokio::test]
#[serial]
async fn personalized_responses_never_leak_across_users() {
    std::env::set_var("SEARCH_CACHE_TTL_MS", "30000");
    let store = Arc::new(InMemoryStore::seeded(vec![listing("plain"), listing("favored")]));
    let state = AppState::new(
        store,
        ValuationTables::default_seed(),
        build_roi_provider(),
        Arc::new(StaticRecommender {
            ids: vec!["favored".to_string()],
        }),
        CacheConfig::from_env(),
    );
    let app = create_router(state);

    // Personalized request populates the cache with boosted scores.
    let (_, headers, body) = post_search(&app, json!({ "user_id": "u1" })).await;
    assert_eq!(cache_header(&headers), "MISS");
    assert_eq!(body["results"][0]["relevance_score"], 60.0);

    // An anonymous caller with identical filters must get its own entry,
    // unboosted and without the recommendation reason.
    let (_, headers, body) = post_search(&app, json!({})).await;
    assert_eq!(cache_header(&headers), "MISS");
    for r in body["results"].as_array().expect("results") {
        assert_eq!(r["relevance_score"], 50.0);
        assert!(!r["match_reasons"]
            .as_array()
            .expect("reasons")
            .iter()
            .any(|m| m == "recommended for you"));
    }

    // A different user is a separate entry too.
    let (_, headers, _) = post_search(&app, json!({ "user_id": "u2" })).await;
    assert_eq!(cache_header(&headers), "MISS");

    // The original user's entry is still a HIT with the boost intact.
    let (_, headers, body) = post_search(&app, json!({ "user_id": "u1" })).await;
    assert_eq!(cache_header(&headers), "HIT");
    assert_eq!(body["results"][0]["relevance_score"], 60.0);

    std::env::remove_var("SEARCH_CACHE_TTL_MS");
}
