//! Comparable retrieval and annotation.
//!
//! Similarity and distance here are *approximate presentation values*, not
//! ground truth: they are derived from how close a candidate's price sits to
//! the reference price, mapped into the documented 0.70-0.95 / 0-5 km
//! ranges. No geographic or feature distance is computed.

use serde::{Deserialize, Serialize};

use crate::property::PropertyType;
use crate::store::PropertyStore;

/// Price band around the reference price that qualifies a comparable.
pub const COMPARABLE_PRICE_BAND: f64 = 0.5;
/// At most this many comparables are attached to a valuation.
pub const MAX_COMPARABLES: usize = 5;

const SIMILARITY_MAX: f64 = 0.95;
const SIMILARITY_MIN: f64 = 0.70;
const DISTANCE_MAX_KM: f64 = 5.0;

/// A reference property annotated for display next to a valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableProperty {
    pub id: String,
    pub price: f64,
    /// Approximate, price-derived; 0.70-0.95.
    pub similarity: f64,
    /// Approximate, price-derived; 0-5.
    pub distance_km: f64,
}

/// Fetch up to 5 same-type properties within +-50% of the reference price
/// and annotate them.
pub async fn fetch_comparables(
    store: &dyn PropertyStore,
    property_type: PropertyType,
    reference_price: f64,
    exclude_id: Option<&str>,
) -> anyhow::Result<Vec<ComparableProperty>> {
    if reference_price <= 0.0 {
        return Ok(Vec::new());
    }
    let min = reference_price * (1.0 - COMPARABLE_PRICE_BAND);
    let max = reference_price * (1.0 + COMPARABLE_PRICE_BAND);

    let candidates = store
        .fetch_comparables(property_type, min, max, MAX_COMPARABLES + 1)
        .await?;

    Ok(candidates
        .into_iter()
        .filter(|p| Some(p.id.as_str()) != exclude_id)
        .take(MAX_COMPARABLES)
        .map(|p| annotate(&p.id, p.price, reference_price))
        .collect())
}

/// Deterministic annotation: the further the candidate price is from the
/// reference within the +-50% band, the lower the similarity and the larger
/// the nominal distance.
fn annotate(id: &str, price: f64, reference_price: f64) -> ComparableProperty {
    let spread = (price - reference_price).abs() / (reference_price * COMPARABLE_PRICE_BAND);
    let spread = spread.clamp(0.0, 1.0);
    ComparableProperty {
        id: id.to_string(),
        price,
        similarity: SIMILARITY_MAX - (SIMILARITY_MAX - SIMILARITY_MIN) * spread,
        distance_km: DISTANCE_MAX_KM * spread,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_price_is_most_similar() {
        let c = annotate("x", 1_000_000.0, 1_000_000.0);
        assert_eq!(c.similarity, SIMILARITY_MAX);
        assert_eq!(c.distance_km, 0.0);
    }

    #[test]
    fn band_edge_is_least_similar() {
        let c = annotate("x", 1_500_000.0, 1_000_000.0);
        assert!((c.similarity - SIMILARITY_MIN).abs() < 1e-9);
        assert!((c.distance_km - DISTANCE_MAX_KM).abs() < 1e-9);
    }

    #[test]
    fn annotation_stays_in_documented_ranges() {
        for price in [600_000.0, 900_000.0, 1_100_000.0, 1_400_000.0, 9_999_999.0] {
            let c = annotate("x", price, 1_000_000.0);
            assert!((SIMILARITY_MIN..=SIMILARITY_MAX).contains(&c.similarity));
            assert!((0.0..=DISTANCE_MAX_KM).contains(&c.distance_km));
        }
    }
}
