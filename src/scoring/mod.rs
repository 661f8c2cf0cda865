// src/scoring/mod.rs
//! Category scoring pipeline: per-property score records and the batch
//! recalculation that produces them.

pub mod engagement;
pub mod investment;
pub mod livability;
pub mod luxury;
pub mod weights;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::normalize::BatchMaxima;
use crate::property::PropertyAttributes;
use crate::signals::{aggregate_signals, SignalAggregate};
use crate::store::PropertyStore;

pub use engagement::engagement_score;
pub use investment::investment_score;
pub use livability::livability_score;
pub use luxury::luxury_score;

/// Upsert chunk size for batch writes. Bounds per-call payloads and
/// isolates partial failures.
pub const UPSERT_CHUNK_SIZE: usize = 500;

/// Round to 2 decimal places; all published scores go through this.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Persisted per-property score row, upserted by `property_id` (at most one
/// live row per property). `predicted_roi`/`roi_confidence` are owned by the
/// on-demand ROI prediction and are never written by the batch path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub property_id: String,
    pub views_total: f64,
    pub saves_total: f64,
    pub inquiries_total: f64,
    pub clicks_total: f64,
    pub avg_dwell_seconds: f64,
    pub engagement_score: f64,
    pub investment_score: f64,
    pub livability_score: f64,
    pub luxury_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_roi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_confidence: Option<f64>,
    pub last_calculated_at: DateTime<Utc>,
}

/// Compute one record from an attribute snapshot plus the property's signal
/// aggregate and the batch maxima. Pure; the same inputs (and maxima) yield
/// a bit-identical record after rounding.
pub fn compute_record(
    attrs: &PropertyAttributes,
    agg: &SignalAggregate,
    max: &BatchMaxima,
    now: DateTime<Utc>,
) -> ScoreRecord {
    ScoreRecord {
        property_id: attrs.id.clone(),
        views_total: agg.views,
        saves_total: agg.saves,
        inquiries_total: agg.inquiries,
        clicks_total: agg.clicks,
        avg_dwell_seconds: round2(agg.avg_dwell()),
        engagement_score: engagement_score(agg, max),
        investment_score: investment_score(attrs),
        livability_score: livability_score(attrs),
        luxury_score: luxury_score(attrs),
        predicted_roi: None,
        roi_confidence: None,
        last_calculated_at: now,
    }
}

/// Outcome of a full batch recalculation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatchOutcome {
    /// Rows actually written, not assumed-complete.
    pub processed: usize,
    /// Chunks that failed to upsert and were skipped.
    pub failed_chunks: usize,
}

/// Recalculate all four category scores for every active property and
/// upsert them in chunks. A failed chunk is logged and skipped; siblings
/// continue. Idempotent: overlapping runs over unchanged inputs converge.
pub async fn recalculate_all(store: &dyn PropertyStore) -> anyhow::Result<BatchOutcome> {
    let properties = store.fetch_active_properties(None).await?;
    let signals = store.fetch_signals().await?;
    let favorites = store.fetch_favorites().await?;

    let aggregates: HashMap<String, SignalAggregate> = aggregate_signals(&signals, &favorites);
    let maxima = BatchMaxima::from_aggregates(&aggregates);
    let now = Utc::now();

    let records: Vec<ScoreRecord> = properties
        .iter()
        .map(|p| {
            let agg = aggregates.get(&p.id).copied().unwrap_or_default();
            compute_record(p, &agg, &maxima, now)
        })
        .collect();

    let mut processed = 0usize;
    let mut failed_chunks = 0usize;
    for chunk in records.chunks(UPSERT_CHUNK_SIZE) {
        match store.upsert_scores(chunk).await {
            Ok(()) => processed += chunk.len(),
            Err(e) => {
                failed_chunks += 1;
                metrics::counter!("score_batch_chunk_failures_total").increment(1);
                error!(error = ?e, chunk_len = chunk.len(), "score upsert chunk failed; skipping");
            }
        }
    }

    info!(
        properties = properties.len(),
        processed, failed_chunks, "score recalculation finished"
    );
    Ok(BatchOutcome {
        processed,
        failed_chunks,
    })
}
