//! Shared fixtures for unit tests.

use chrono::{TimeZone, Utc};

use crate::property::{Furnishing, PropertyAttributes, PropertyType};

/// Minimal active house in Jakarta with every optional field empty.
/// Tests override only the fields they exercise.
pub fn property(id: &str) -> PropertyAttributes {
    PropertyAttributes {
        id: id.to_string(),
        title: String::new(),
        description: String::new(),
        property_type: PropertyType::House,
        price: 0.0,
        land_area: None,
        building_area: None,
        bedrooms: None,
        bathrooms: None,
        floors: None,
        legal_status: None,
        foreign_eligible: false,
        roi_percentage: None,
        rental_yield: None,
        has_pool: false,
        has_garden: false,
        parking_spaces: 0,
        furnishing: Furnishing::Unfurnished,
        view_type: None,
        has_3d_model: false,
        has_vr_tour: false,
        image_count: 0,
        city: "jakarta".to_string(),
        district: None,
        location: String::new(),
        year_built: None,
        condition: None,
        features: Vec::new(),
        latitude: None,
        longitude: None,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        view_count: 0,
        is_active: true,
    }
}
