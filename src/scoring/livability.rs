//! Livability score: day-to-day comfort factors.

use crate::normalize::{normalize, normalize0};
use crate::property::{Furnishing, PropertyAttributes};
use crate::scoring::{round2, weights::livability as w};

/// Weighted composite over a property attribute snapshot, 0-100.
pub fn livability_score(p: &PropertyAttributes) -> f64 {
    let amenities = amenity_ratio(&[p.has_pool, p.has_garden, p.parking_spaces > 0]);

    let area = p.building_area.or(p.land_area).unwrap_or(0.0);
    let area_factor = normalize(area, w::AREA_CAP, w::AREA_FLOOR);

    let bedroom_fit = match p.bedrooms {
        Some(n) if (w::BEDROOM_OPTIMAL_MIN..=w::BEDROOM_OPTIMAL_MAX).contains(&n) => 1.0,
        Some(n) => normalize0(n as f64, w::BEDROOM_NORM_CAP),
        None => 0.0,
    };

    let furnishing = match p.furnishing {
        Furnishing::Furnished => w::FURNISHED,
        Furnishing::SemiFurnished => w::SEMI_FURNISHED,
        Furnishing::Unfurnished => w::UNFURNISHED,
    };

    let view = match p.view_type {
        Some(v) if v.is_premium() => 1.0,
        _ => w::VIEW_STANDARD,
    };

    let score = w::AMENITIES * amenities
        + w::AREA * area_factor
        + w::BEDROOM_FIT * bedroom_fit
        + w::FURNISHING * furnishing
        + w::VIEW * view;
    round2((score * 100.0).clamp(0.0, 100.0))
}

/// Fraction of present amenities.
pub(crate) fn amenity_ratio(present: &[bool]) -> f64 {
    if present.is_empty() {
        return 0.0;
    }
    present.iter().filter(|b| **b).count() as f64 / present.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::ViewType;
    use crate::testutil::property;

    #[test]
    fn full_comfort_scores_one_hundred() {
        let mut p = property("p1");
        p.has_pool = true;
        p.has_garden = true;
        p.parking_spaces = 2;
        p.building_area = Some(500.0);
        p.bedrooms = Some(4);
        p.furnishing = Furnishing::Furnished;
        p.view_type = Some(ViewType::Sea);
        assert_eq!(livability_score(&p), 100.0);
    }

    #[test]
    fn bedroom_fit_outside_optimal_band_normalizes() {
        let mut six = property("a");
        six.bedrooms = Some(6);
        let mut four = property("b");
        four.bedrooms = Some(4);
        // 6 bedrooms caps the norm at 1.0, so it ties the optimal band.
        assert_eq!(livability_score(&six), livability_score(&four));

        let mut two = property("c");
        two.bedrooms = Some(2);
        assert!(livability_score(&two) < livability_score(&four));
    }

    #[test]
    fn bare_listing_gets_floor_factors_only() {
        let p = property("p1");
        let expected = (w::FURNISHING * w::UNFURNISHED + w::VIEW * w::VIEW_STANDARD) * 100.0;
        assert_eq!(livability_score(&p), round2(expected));
    }

    #[test]
    fn amenity_ratio_counts_fractions() {
        assert_eq!(amenity_ratio(&[true, false, false]), 1.0 / 3.0);
        assert_eq!(amenity_ratio(&[]), 0.0);
    }
}
