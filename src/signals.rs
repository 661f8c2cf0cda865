//! User-behavior signals and their per-property aggregation.
//!
//! One `BehaviorSignal` is a single recorded event (view, click, save,
//! inquiry, dwell-time) tied to one property. The aggregator is a pure
//! reduction: no I/O, safe to re-run, rows without a property id are
//! skipped rather than errored.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    View,
    Click,
    Save,
    Inquiry,
    DwellTime,
}

/// A single recorded behavior event. Immutable once recorded; the engine
/// only ever reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorSignal {
    pub property_id: String,
    pub signal_type: SignalType,
    /// Count-like signals carry 1.0 per event; dwell carries seconds.
    pub signal_value: f64,
    pub timestamp: DateTime<Utc>,
}

/// A favorite row from the external store; each one counts as one implicit
/// save signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteRow {
    pub property_id: String,
    pub user_id: String,
}

/// Summed/counted signals for one property over the current batch window.
/// Transient: recomputed each batch run, only its normalized outputs are
/// persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalAggregate {
    pub views: f64,
    pub clicks: f64,
    pub saves: f64,
    pub inquiries: f64,
    pub dwell_sum: f64,
    pub dwell_count: u64,
}

impl SignalAggregate {
    /// True average dwell time in seconds; 0 when no dwell events exist.
    pub fn avg_dwell(&self) -> f64 {
        if self.dwell_count == 0 {
            0.0
        } else {
            self.dwell_sum / self.dwell_count as f64
        }
    }
}

/// Reduce raw signals plus the favorites relation into one aggregate per
/// property id that appears in either source.
pub fn aggregate_signals(
    signals: &[BehaviorSignal],
    favorites: &[FavoriteRow],
) -> HashMap<String, SignalAggregate> {
    let mut out: HashMap<String, SignalAggregate> = HashMap::new();

    for s in signals {
        if s.property_id.is_empty() {
            continue;
        }
        let agg = out.entry(s.property_id.clone()).or_default();
        match s.signal_type {
            SignalType::View => agg.views += s.signal_value,
            SignalType::Click => agg.clicks += s.signal_value,
            SignalType::Save => agg.saves += s.signal_value,
            SignalType::Inquiry => agg.inquiries += s.signal_value,
            SignalType::DwellTime => {
                agg.dwell_sum += s.signal_value;
                agg.dwell_count += 1;
            }
        }
    }

    for f in favorites {
        if f.property_id.is_empty() {
            continue;
        }
        out.entry(f.property_id.clone()).or_default().saves += 1.0;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sig(id: &str, ty: SignalType, value: f64) -> BehaviorSignal {
        BehaviorSignal {
            property_id: id.to_string(),
            signal_type: ty,
            signal_value: value,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn sums_per_type_and_counts_dwell() {
        let signals = vec![
            sig("a", SignalType::View, 1.0),
            sig("a", SignalType::View, 1.0),
            sig("a", SignalType::Click, 1.0),
            sig("a", SignalType::DwellTime, 40.0),
            sig("a", SignalType::DwellTime, 20.0),
            sig("b", SignalType::Inquiry, 1.0),
        ];
        let out = aggregate_signals(&signals, &[]);
        let a = &out["a"];
        assert_eq!(a.views, 2.0);
        assert_eq!(a.clicks, 1.0);
        assert_eq!(a.dwell_sum, 60.0);
        assert_eq!(a.dwell_count, 2);
        assert_eq!(a.avg_dwell(), 30.0);
        assert_eq!(out["b"].inquiries, 1.0);
    }

    #[test]
    fn favorites_count_as_saves() {
        let favs = vec![
            FavoriteRow {
                property_id: "a".into(),
                user_id: "u1".into(),
            },
            FavoriteRow {
                property_id: "a".into(),
                user_id: "u2".into(),
            },
        ];
        let out = aggregate_signals(&[], &favs);
        assert_eq!(out["a"].saves, 2.0);
    }

    #[test]
    fn skips_rows_without_property_id() {
        let signals = vec![sig("", SignalType::View, 1.0)];
        let favs = vec![FavoriteRow {
            property_id: "".into(),
            user_id: "u".into(),
        }];
        let out = aggregate_signals(&signals, &favs);
        assert!(out.is_empty());
    }

    #[test]
    fn avg_dwell_is_zero_without_events() {
        assert_eq!(SignalAggregate::default().avg_dwell(), 0.0);
    }
}
