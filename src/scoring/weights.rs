//! Scoring weights, grouped per category so each scorer is independently
//! tunable and testable without touching the aggregation logic.
//!
//! Each group sums to 1.0 before the x100 scale; `assert_unit_sums` guards
//! that in tests.

/// Engagement: behavior-signal composite.
pub mod engagement {
    pub const VIEWS: f64 = 0.30;
    pub const SAVES: f64 = 0.25;
    pub const INQUIRIES: f64 = 0.25;
    pub const CLICKS: f64 = 0.10;
    pub const AVG_DWELL: f64 = 0.10;
}

/// Investment potential.
pub mod investment {
    pub const ROI: f64 = 0.30;
    pub const RENTAL_YIELD: f64 = 0.25;
    pub const LEGAL: f64 = 0.15;
    pub const AFFORDABILITY: f64 = 0.15;
    pub const OWNERSHIP: f64 = 0.15;

    /// Normalization caps for the raw inputs.
    pub const ROI_CAP_PCT: f64 = 20.0;
    pub const YIELD_CAP_PCT: f64 = 15.0;
    pub const PRICE_PER_AREA_FLOOR: f64 = 1_000_000.0;
    pub const PRICE_PER_AREA_CAP: f64 = 100_000_000.0;

    /// Factor values when the underlying attribute is weak or missing.
    pub const LEGAL_WEAK: f64 = 0.5;
    pub const OWNERSHIP_RESTRICTED: f64 = 0.7;
}

/// Livability.
pub mod livability {
    pub const AMENITIES: f64 = 0.25;
    pub const AREA: f64 = 0.20;
    pub const BEDROOM_FIT: f64 = 0.20;
    pub const FURNISHING: f64 = 0.20;
    pub const VIEW: f64 = 0.15;

    pub const AREA_FLOOR: f64 = 50.0;
    pub const AREA_CAP: f64 = 500.0;
    pub const BEDROOM_OPTIMAL_MIN: u32 = 3;
    pub const BEDROOM_OPTIMAL_MAX: u32 = 5;
    pub const BEDROOM_NORM_CAP: f64 = 5.0;

    pub const FURNISHED: f64 = 1.0;
    pub const SEMI_FURNISHED: f64 = 0.75;
    pub const UNFURNISHED: f64 = 0.5;
    pub const VIEW_STANDARD: f64 = 0.6;
}

/// Luxury.
pub mod luxury {
    pub const PRICE: f64 = 0.25;
    pub const TECH_AMENITIES: f64 = 0.20;
    pub const LAND: f64 = 0.20;
    pub const VIEW: f64 = 0.15;
    pub const IMAGES: f64 = 0.20;

    /// Price at which the price component saturates.
    pub const PRICE_CAP: f64 = 5_000_000_000.0;
    pub const LAND_FLOOR: f64 = 500.0;
    pub const LAND_CAP: f64 = 2_000.0;
    pub const IMAGES_FLOOR: f64 = 3.0;
    pub const IMAGES_CAP: f64 = 20.0;
    pub const VIEW_STANDARD: f64 = 0.5;
}
