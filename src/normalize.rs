//! Linear normalization into [0,1] and batch-wide maxima.

use std::collections::HashMap;

use crate::signals::SignalAggregate;

/// `clamp((value - min) / (max - min), 0, 1)`. Degenerate ranges
/// (`max <= min`) normalize to 0 so a bad denominator can never produce
/// NaN or infinity downstream.
pub fn normalize(value: f64, max: f64, min: f64) -> f64 {
    if max <= min {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Convenience for the common zero-floored case.
pub fn normalize0(value: f64, max: f64) -> f64 {
    normalize(value, max, 0.0)
}

/// Per-metric maxima over one batch of aggregates. Each maximum is floored
/// at 1.0 so a property with zero activity always normalizes to 0 and the
/// denominator is never zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchMaxima {
    pub views: f64,
    pub clicks: f64,
    pub saves: f64,
    pub inquiries: f64,
    pub avg_dwell: f64,
}

impl Default for BatchMaxima {
    fn default() -> Self {
        Self {
            views: 1.0,
            clicks: 1.0,
            saves: 1.0,
            inquiries: 1.0,
            avg_dwell: 1.0,
        }
    }
}

impl BatchMaxima {
    /// Computed once per batch run over all aggregates.
    pub fn from_aggregates(aggregates: &HashMap<String, SignalAggregate>) -> Self {
        let mut max = Self::default();
        for agg in aggregates.values() {
            max.views = max.views.max(agg.views);
            max.clicks = max.clicks.max(agg.clicks);
            max.saves = max.saves.max(agg.saves);
            max.inquiries = max.inquiries.max(agg.inquiries);
            max.avg_dwell = max.avg_dwell.max(agg.avg_dwell());
        }
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_into_unit_interval() {
        assert_eq!(normalize0(50.0, 100.0), 0.5);
        assert_eq!(normalize0(150.0, 100.0), 1.0);
        assert_eq!(normalize0(-10.0, 100.0), 0.0);
    }

    #[test]
    fn degenerate_range_yields_zero() {
        assert_eq!(normalize0(5.0, 0.0), 0.0);
        assert_eq!(normalize0(5.0, -1.0), 0.0);
        assert_eq!(normalize(5.0, 10.0, 10.0), 0.0);
        assert_eq!(normalize(5.0, 1.0, 10.0), 0.0);
    }

    #[test]
    fn floored_min_shifts_scale() {
        // 50..500 band used by the livability area factor
        assert_eq!(normalize(275.0, 500.0, 50.0), 0.5);
        assert_eq!(normalize(40.0, 500.0, 50.0), 0.0);
    }

    #[test]
    fn maxima_floor_at_one() {
        let empty: HashMap<String, SignalAggregate> = HashMap::new();
        let max = BatchMaxima::from_aggregates(&empty);
        assert_eq!(max.views, 1.0);
        assert_eq!(max.avg_dwell, 1.0);
    }

    #[test]
    fn maxima_track_the_largest_aggregate() {
        let mut aggs: HashMap<String, SignalAggregate> = HashMap::new();
        aggs.insert(
            "a".into(),
            SignalAggregate {
                views: 100.0,
                clicks: 10.0,
                saves: 20.0,
                inquiries: 4.0,
                dwell_sum: 120.0,
                dwell_count: 2,
            },
        );
        aggs.insert(
            "b".into(),
            SignalAggregate {
                views: 40.0,
                clicks: 30.0,
                ..Default::default()
            },
        );
        let max = BatchMaxima::from_aggregates(&aggs);
        assert_eq!(max.views, 100.0);
        assert_eq!(max.clicks, 30.0);
        assert_eq!(max.avg_dwell, 60.0);
    }
}
