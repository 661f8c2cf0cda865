// src/search/mod.rs
//! Search relevance ranking: weighted multi-factor scoring, human-readable
//! match reasons, sorting strategies, and the optional personalization
//! boost.

pub mod cache;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::property::PropertyAttributes;
use crate::scoring::round2;

// Sub-score weights. A dimension whose query filter is absent drops out of
// both numerator and denominator.
pub const TEXT_WEIGHT: f64 = 0.40;
pub const LOCATION_WEIGHT: f64 = 0.25;
pub const PRICE_WEIGHT: f64 = 0.20;
pub const FEATURES_WEIGHT: f64 = 0.15;

/// Score when no dimension applies at all.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Uplift for properties the external recommender favors.
pub const PERSONALIZATION_BOOST: f64 = 1.2;

// Reason-emission thresholds.
const TEXT_REASON_THRESHOLD: f64 = 0.7;
const LOCATION_REASON_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    PriceAsc,
    Newest,
    Popularity,
}

/// Incoming search request. All filters optional; numeric filters are
/// sanitized before scoring (see [`SearchQuery::sanitize`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query_text: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    /// When true, a 3D model is a requested feature predicate.
    #[serde(default)]
    pub require_3d_model: bool,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Drop unusable filter values instead of propagating them: non-finite
    /// or negative prices become absent and empty strings become absent.
    /// An inverted price band is deliberately swapped into a valid interval
    /// rather than dropped: both bounds are individually usable, so the
    /// caller's intent survives a transposed form field.
    pub fn sanitize(mut self) -> Self {
        self.query_text = self.query_text.filter(|s| !s.trim().is_empty());
        self.location = self.location.filter(|s| !s.trim().is_empty());
        self.user_id = self.user_id.filter(|s| !s.trim().is_empty());
        self.price_min = self.price_min.filter(|p| p.is_finite() && *p >= 0.0);
        self.price_max = self.price_max.filter(|p| p.is_finite() && *p >= 0.0);
        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if min > max {
                self.price_min = Some(max);
                self.price_max = Some(min);
            }
        }
        self
    }

    fn has_price_filter(&self) -> bool {
        self.price_min.is_some() || self.price_max.is_some()
    }

    fn has_feature_filter(&self) -> bool {
        self.bedrooms.is_some() || self.bathrooms.is_some() || self.require_3d_model
    }

    /// Stable canonical form of the sanitized query; the cache key is its
    /// digest, so field order and absent-vs-null differences cannot split
    /// the cache. `user_id` is part of the key: cached responses carry the
    /// personalization boost, so a personalized entry must never be served
    /// to a different (or anonymous) caller.
    pub fn canonical_key(&self) -> String {
        let canon = format!(
            "q={}|loc={}|pmin={:?}|pmax={:?}|bed={:?}|bath={:?}|3d={}|sort={:?}|lim={:?}|user={}",
            self.query_text
                .as_deref()
                .unwrap_or("")
                .trim()
                .to_lowercase(),
            self.location
                .as_deref()
                .unwrap_or("")
                .trim()
                .to_lowercase(),
            self.price_min,
            self.price_max,
            self.bedrooms,
            self.bathrooms,
            self.require_3d_model,
            self.sort_by,
            self.limit,
            self.user_id.as_deref().unwrap_or("").trim(),
        );
        cache::digest_key(&canon)
    }
}

/// One scored candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub property: PropertyAttributes,
    /// 0-100; neutral 50 when no dimension applies.
    pub relevance_score: f64,
    pub match_reasons: Vec<String>,
}

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    // \w covers [A-Za-z0-9_]; (?u) enables Unicode
    Regex::new(r"(?u)\b\w+\b").expect("tokenizer regex")
});

fn tokenize_lower(input: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(input)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Score one property against a sanitized query.
pub fn score_property(p: &PropertyAttributes, q: &SearchQuery) -> (f64, Vec<String>) {
    let mut weighted = 0.0;
    let mut active_weight = 0.0;
    let mut reasons = Vec::new();

    if let Some(text) = q.query_text.as_deref() {
        let s = text_subscore(p, text);
        weighted += TEXT_WEIGHT * s;
        active_weight += TEXT_WEIGHT;
        if s > TEXT_REASON_THRESHOLD {
            reasons.push("matches your search terms".to_string());
        }
    }

    if let Some(loc) = q.location.as_deref() {
        let s = location_subscore(p, loc);
        weighted += LOCATION_WEIGHT * s;
        active_weight += LOCATION_WEIGHT;
        if s > LOCATION_REASON_THRESHOLD {
            reasons.push("in your preferred location".to_string());
        }
    }

    if q.has_price_filter() {
        let s = price_subscore(p.price, q.price_min, q.price_max);
        weighted += PRICE_WEIGHT * s;
        active_weight += PRICE_WEIGHT;
        if s == 1.0 {
            reasons.push("within your budget".to_string());
        }
    }

    if q.has_feature_filter() {
        let s = features_subscore(p, q);
        weighted += FEATURES_WEIGHT * s;
        active_weight += FEATURES_WEIGHT;
    }

    if q.require_3d_model && p.has_3d_model {
        reasons.push("3D tour available".to_string());
    }

    let score = if active_weight > 0.0 {
        round2((weighted / active_weight * 100.0).clamp(0.0, 100.0))
    } else {
        NEUTRAL_SCORE
    };
    (score, reasons)
}

/// Fraction of query tokens found (case-insensitive substring) in
/// title + description + location.
fn text_subscore(p: &PropertyAttributes, query: &str) -> f64 {
    let tokens = tokenize_lower(query);
    if tokens.is_empty() {
        return 0.0;
    }
    let haystack = format!("{} {} {}", p.title, p.description, p.location).to_lowercase();
    let hits = tokens.iter().filter(|t| haystack.contains(t.as_str())).count();
    hits as f64 / tokens.len() as f64
}

/// 1.0 on full substring containment, else the fraction of location tokens
/// matched.
fn location_subscore(p: &PropertyAttributes, wanted: &str) -> f64 {
    let wanted_lower = wanted.trim().to_lowercase();
    if wanted_lower.is_empty() {
        return 0.0;
    }
    let haystack = format!("{} {}", p.location, p.city).to_lowercase();
    if haystack.contains(&wanted_lower) {
        return 1.0;
    }
    let tokens = tokenize_lower(&wanted_lower);
    if tokens.is_empty() {
        return 0.0;
    }
    let hits = tokens.iter().filter(|t| haystack.contains(t.as_str())).count();
    hits as f64 / tokens.len() as f64
}

/// 1.0 inside [min,max]; outside, a linear penalty proportional to the
/// relative distance from the violated bound, floored at 0.
fn price_subscore(price: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    if let Some(min) = min {
        if price < min {
            if min <= 0.0 {
                return 1.0;
            }
            return (1.0 - (min - price) / min).max(0.0);
        }
    }
    if let Some(max) = max {
        if price > max {
            if max <= 0.0 {
                return 0.0;
            }
            return (1.0 - (price - max) / max).max(0.0);
        }
    }
    1.0
}

/// Fraction of satisfied feature predicates among those requested.
fn features_subscore(p: &PropertyAttributes, q: &SearchQuery) -> f64 {
    let mut requested = 0usize;
    let mut satisfied = 0usize;

    if let Some(min_bed) = q.bedrooms {
        requested += 1;
        if p.bedrooms.unwrap_or(0) >= min_bed {
            satisfied += 1;
        }
    }
    if let Some(min_bath) = q.bathrooms {
        requested += 1;
        if p.bathrooms.unwrap_or(0) >= min_bath {
            satisfied += 1;
        }
    }
    if q.require_3d_model {
        requested += 1;
        if p.has_3d_model {
            satisfied += 1;
        }
    }

    if requested == 0 {
        return 0.0;
    }
    satisfied as f64 / requested as f64
}

/// Score every candidate against the query.
pub fn rank(candidates: Vec<PropertyAttributes>, q: &SearchQuery) -> Vec<SearchResult> {
    candidates
        .into_iter()
        .map(|p| {
            let (relevance_score, match_reasons) = score_property(&p, q);
            SearchResult {
                property: p,
                relevance_score,
                match_reasons,
            }
        })
        .collect()
}

/// Apply the recommender uplift. Runs after base scoring and before the
/// final sort; scores stay clamped to 100.
pub fn apply_personalization(results: &mut [SearchResult], recommended_ids: &[String]) {
    if recommended_ids.is_empty() {
        return;
    }
    for r in results.iter_mut() {
        if recommended_ids.iter().any(|id| *id == r.property.id) {
            r.relevance_score =
                round2((r.relevance_score * PERSONALIZATION_BOOST).clamp(0.0, 100.0));
            r.match_reasons.push("recommended for you".to_string());
        }
    }
}

/// Pure post-processing over the scored list.
pub fn sort_results(results: &mut [SearchResult], sort_by: SortBy) {
    match sort_by {
        SortBy::Relevance => results.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortBy::PriceAsc => results.sort_by(|a, b| {
            a.property
                .price
                .partial_cmp(&b.property.price)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortBy::Newest => {
            results.sort_by(|a, b| b.property.created_at.cmp(&a.property.created_at))
        }
        SortBy::Popularity => {
            results.sort_by(|a, b| b.property.view_count.cmp(&a.property.view_count))
        }
    }
}
