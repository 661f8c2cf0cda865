//! External property-store seam.
//!
//! The marketplace's relational store is an external collaborator; the
//! engine only needs the handful of reads/writes below. `InMemoryStore`
//! backs tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::property::{PropertyAttributes, PropertyType};
use crate::scoring::ScoreRecord;
use crate::signals::{BehaviorSignal, FavoriteRow};
use crate::valuation::ValuationResult;

#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Active property snapshots. `location` is a best-effort filter hint;
    /// implementations may ignore it. Search retries with `None` when the
    /// filtered path fails.
    async fn fetch_active_properties(
        &self,
        location: Option<&str>,
    ) -> anyhow::Result<Vec<PropertyAttributes>>;

    async fn fetch_property(&self, id: &str) -> anyhow::Result<Option<PropertyAttributes>>;

    async fn fetch_signals(&self) -> anyhow::Result<Vec<BehaviorSignal>>;

    async fn fetch_favorites(&self) -> anyhow::Result<Vec<FavoriteRow>>;

    /// Upsert one chunk of score rows keyed by `property_id`. Must not
    /// touch `predicted_roi`/`roi_confidence` on existing rows; those are
    /// owned by `update_roi`.
    async fn upsert_scores(&self, records: &[ScoreRecord]) -> anyhow::Result<()>;

    async fn fetch_score(&self, property_id: &str) -> anyhow::Result<Option<ScoreRecord>>;

    /// Set only the ROI fields of an existing score row (creating a bare
    /// row when none exists yet).
    async fn update_roi(
        &self,
        property_id: &str,
        predicted_roi: f64,
        roi_confidence: f64,
    ) -> anyhow::Result<()>;

    /// Active same-type properties priced inside [min_price, max_price].
    async fn fetch_comparables(
        &self,
        property_type: PropertyType,
        min_price: f64,
        max_price: f64,
        limit: usize,
    ) -> anyhow::Result<Vec<PropertyAttributes>>;

    async fn persist_valuation(
        &self,
        property_id: &str,
        valuation: &ValuationResult,
    ) -> anyhow::Result<()>;
}

/// Process-local store used by tests and the default binary wiring.
#[derive(Default)]
pub struct InMemoryStore {
    properties: RwLock<Vec<PropertyAttributes>>,
    signals: RwLock<Vec<BehaviorSignal>>,
    favorites: RwLock<Vec<FavoriteRow>>,
    scores: RwLock<HashMap<String, ScoreRecord>>,
    valuations: RwLock<HashMap<String, ValuationResult>>,
    /// When set, the location-filtered fetch fails once per call; exercises
    /// the search fallback path.
    fail_filtered_fetch: RwLock<bool>,
    /// Number of upcoming `upsert_scores` calls to reject; exercises the
    /// batch path's skip-and-continue behavior.
    fail_next_upserts: RwLock<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(properties: Vec<PropertyAttributes>) -> Self {
        let store = Self::new();
        *store.properties.write().expect("properties lock") = properties;
        store
    }

    pub fn push_signals(&self, signals: Vec<BehaviorSignal>) {
        self.signals.write().expect("signals lock").extend(signals);
    }

    pub fn push_favorites(&self, favorites: Vec<FavoriteRow>) {
        self.favorites
            .write()
            .expect("favorites lock")
            .extend(favorites);
    }

    pub fn set_fail_filtered_fetch(&self, fail: bool) {
        *self.fail_filtered_fetch.write().expect("flag lock") = fail;
    }

    pub fn set_fail_next_upserts(&self, count: usize) {
        *self.fail_next_upserts.write().expect("flag lock") = count;
    }

    pub fn valuation_for(&self, property_id: &str) -> Option<ValuationResult> {
        self.valuations
            .read()
            .expect("valuations lock")
            .get(property_id)
            .cloned()
    }
}

#[async_trait]
impl PropertyStore for InMemoryStore {
    async fn fetch_active_properties(
        &self,
        location: Option<&str>,
    ) -> anyhow::Result<Vec<PropertyAttributes>> {
        if location.is_some() && *self.fail_filtered_fetch.read().expect("flag lock") {
            anyhow::bail!("filtered property query failed");
        }
        let props = self.properties.read().expect("properties lock");
        Ok(props
            .iter()
            .filter(|p| p.is_active)
            .filter(|p| match location {
                Some(loc) => {
                    let needle = loc.to_ascii_lowercase();
                    p.location.to_ascii_lowercase().contains(&needle)
                        || p.city.to_ascii_lowercase().contains(&needle)
                }
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn fetch_property(&self, id: &str) -> anyhow::Result<Option<PropertyAttributes>> {
        let props = self.properties.read().expect("properties lock");
        Ok(props.iter().find(|p| p.id == id).cloned())
    }

    async fn fetch_signals(&self) -> anyhow::Result<Vec<BehaviorSignal>> {
        Ok(self.signals.read().expect("signals lock").clone())
    }

    async fn fetch_favorites(&self) -> anyhow::Result<Vec<FavoriteRow>> {
        Ok(self.favorites.read().expect("favorites lock").clone())
    }

    async fn upsert_scores(&self, records: &[ScoreRecord]) -> anyhow::Result<()> {
        {
            let mut remaining = self.fail_next_upserts.write().expect("flag lock");
            if *remaining > 0 {
                *remaining -= 1;
                anyhow::bail!("score upsert rejected");
            }
        }
        let mut scores = self.scores.write().expect("scores lock");
        for r in records {
            let mut row = r.clone();
            // ROI fields survive batch overwrites.
            if let Some(existing) = scores.get(&r.property_id) {
                row.predicted_roi = existing.predicted_roi;
                row.roi_confidence = existing.roi_confidence;
            }
            scores.insert(r.property_id.clone(), row);
        }
        Ok(())
    }

    async fn fetch_score(&self, property_id: &str) -> anyhow::Result<Option<ScoreRecord>> {
        Ok(self
            .scores
            .read()
            .expect("scores lock")
            .get(property_id)
            .cloned())
    }

    async fn update_roi(
        &self,
        property_id: &str,
        predicted_roi: f64,
        roi_confidence: f64,
    ) -> anyhow::Result<()> {
        let mut scores = self.scores.write().expect("scores lock");
        let row = scores
            .entry(property_id.to_string())
            .or_insert_with(|| ScoreRecord {
                property_id: property_id.to_string(),
                views_total: 0.0,
                saves_total: 0.0,
                inquiries_total: 0.0,
                clicks_total: 0.0,
                avg_dwell_seconds: 0.0,
                engagement_score: 0.0,
                investment_score: 0.0,
                livability_score: 0.0,
                luxury_score: 0.0,
                predicted_roi: None,
                roi_confidence: None,
                last_calculated_at: chrono::Utc::now(),
            });
        row.predicted_roi = Some(predicted_roi);
        row.roi_confidence = Some(roi_confidence);
        Ok(())
    }

    async fn fetch_comparables(
        &self,
        property_type: PropertyType,
        min_price: f64,
        max_price: f64,
        limit: usize,
    ) -> anyhow::Result<Vec<PropertyAttributes>> {
        let props = self.properties.read().expect("properties lock");
        Ok(props
            .iter()
            .filter(|p| {
                p.is_active
                    && p.property_type == property_type
                    && p.price >= min_price
                    && p.price <= max_price
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn persist_valuation(
        &self,
        property_id: &str,
        valuation: &ValuationResult,
    ) -> anyhow::Result<()> {
        self.valuations
            .write()
            .expect("valuations lock")
            .insert(property_id.to_string(), valuation.clone());
        Ok(())
    }
}
