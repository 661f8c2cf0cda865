//! Luxury score: price band, tech amenities, land size, outlook and
//! presentation quality.

use crate::normalize::normalize;
use crate::property::PropertyAttributes;
use crate::scoring::livability::amenity_ratio;
use crate::scoring::{round2, weights::luxury as w};

/// Weighted composite over a property attribute snapshot, 0-100.
pub fn luxury_score(p: &PropertyAttributes) -> f64 {
    let price_factor = (p.price / w::PRICE_CAP).min(1.0).max(0.0);

    let tech = amenity_ratio(&[p.has_pool, p.has_3d_model, p.has_vr_tour]);

    let land = p.land_area.or(p.building_area).unwrap_or(0.0);
    let land_factor = normalize(land, w::LAND_CAP, w::LAND_FLOOR);

    let view = match p.view_type {
        Some(v) if v.is_premium() => 1.0,
        _ => w::VIEW_STANDARD,
    };

    let images = normalize(p.image_count as f64, w::IMAGES_CAP, w::IMAGES_FLOOR);

    let score = w::PRICE * price_factor
        + w::TECH_AMENITIES * tech
        + w::LAND * land_factor
        + w::VIEW * view
        + w::IMAGES * images;
    round2((score * 100.0).clamp(0.0, 100.0))
}
