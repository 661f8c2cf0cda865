//! Investment-potential score: yield, title strength, price efficiency and
//! ownership eligibility.

use crate::normalize::{normalize, normalize0};
use crate::property::{LegalStatus, PropertyAttributes};
use crate::scoring::{round2, weights::investment as w};

/// Weighted composite over a property attribute snapshot, 0-100.
/// Missing ROI/yield figures contribute 0; a missing title defaults to the
/// weak-title factor rather than zero.
pub fn investment_score(p: &PropertyAttributes) -> f64 {
    let roi = normalize0(p.roi_percentage.unwrap_or(0.0), w::ROI_CAP_PCT);
    let yield_ = normalize0(p.rental_yield.unwrap_or(0.0), w::YIELD_CAP_PCT);

    let legal = match p.legal_status {
        Some(LegalStatus::Freehold) | Some(LegalStatus::BuildingRights) => 1.0,
        _ => w::LEGAL_WEAK,
    };

    // Cheaper per sqm is better for an investor, hence the inversion.
    let affordability = match p.price_per_area() {
        Some(ppa) => 1.0 - normalize(ppa, w::PRICE_PER_AREA_CAP, w::PRICE_PER_AREA_FLOOR),
        None => 0.0,
    };

    let ownership = if p.foreign_eligible {
        1.0
    } else {
        w::OWNERSHIP_RESTRICTED
    };

    let score = w::ROI * roi
        + w::RENTAL_YIELD * yield_
        + w::LEGAL * legal
        + w::AFFORDABILITY * affordability
        + w::OWNERSHIP * ownership;
    round2((score * 100.0).clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::property;

    #[test]
    fn strong_title_and_yield_score_high() {
        let mut p = property("p1");
        p.roi_percentage = Some(20.0);
        p.rental_yield = Some(15.0);
        p.legal_status = Some(LegalStatus::Freehold);
        p.foreign_eligible = true;
        p.price = 100_000_000.0;
        p.building_area = Some(100.0); // 1M per sqm, the cheap floor
        let s = investment_score(&p);
        assert_eq!(s, 100.0);
    }

    #[test]
    fn missing_fields_default_per_contract() {
        // No ROI, no yield, no title, no area: only the weak-title and
        // restricted-ownership factors contribute.
        let p = property("p1");
        let expected = (w::LEGAL * w::LEGAL_WEAK + w::OWNERSHIP * w::OWNERSHIP_RESTRICTED) * 100.0;
        assert_eq!(investment_score(&p), round2(expected));
    }

    #[test]
    fn leasehold_counts_as_weak_title() {
        let mut strong = property("a");
        strong.legal_status = Some(LegalStatus::BuildingRights);
        let mut weak = property("b");
        weak.legal_status = Some(LegalStatus::Leasehold);
        assert!(investment_score(&strong) > investment_score(&weak));
    }

    #[test]
    fn score_stays_in_bounds() {
        let mut p = property("p1");
        p.roi_percentage = Some(1_000.0);
        p.rental_yield = Some(1_000.0);
        let s = investment_score(&p);
        assert!((0.0..=100.0).contains(&s));
    }
}
