//! Engagement score: how much attention a property is getting, relative to
//! the most-engaged property in the current batch.

use crate::normalize::{normalize0, BatchMaxima};
use crate::scoring::{round2, weights::engagement as w};
use crate::signals::SignalAggregate;

/// Weighted composite of batch-normalized behavior signals, 0-100.
pub fn engagement_score(agg: &SignalAggregate, max: &BatchMaxima) -> f64 {
    let score = w::VIEWS * normalize0(agg.views, max.views)
        + w::SAVES * normalize0(agg.saves, max.saves)
        + w::INQUIRIES * normalize0(agg.inquiries, max.inquiries)
        + w::CLICKS * normalize0(agg.clicks, max.clicks)
        + w::AVG_DWELL * normalize0(agg.avg_dwell(), max.avg_dwell);
    round2((score * 100.0).clamp(0.0, 100.0))
}
