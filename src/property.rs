//! Typed snapshot of a listed property as read from the external store.
//!
//! The engine never mutates these rows; scorers and the valuation pipeline
//! take them by reference. Optional fields are explicit so missing-value
//! defaults are a visible decision in the scorers, not a silent coercion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Listing category; drives the base price-per-sqm lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    House,
    Apartment,
    Villa,
    Land,
    Commercial,
}

impl PropertyType {
    /// Stable key used by the valuation config tables.
    pub fn as_key(&self) -> &'static str {
        match self {
            PropertyType::House => "house",
            PropertyType::Apartment => "apartment",
            PropertyType::Villa => "villa",
            PropertyType::Land => "land",
            PropertyType::Commercial => "commercial",
        }
    }
}

/// Land-title class. `Freehold` (SHM-equivalent) and `BuildingRights`
/// (HGB-equivalent) are the strong titles for investment scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalStatus {
    Freehold,
    BuildingRights,
    Leasehold,
    UsageRights,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Furnishing {
    Furnished,
    SemiFurnished,
    Unfurnished,
}

/// Outlook from the unit. The premium categories carry a livability and
/// luxury uplift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    Sea,
    Mountain,
    Golf,
    City,
    Garden,
    Street,
}

impl ViewType {
    pub fn is_premium(&self) -> bool {
        matches!(self, ViewType::Sea | ViewType::Mountain | ViewType::Golf)
    }
}

/// Read-only attribute snapshot consumed by the scorers, the valuation
/// estimator and the search ranker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyAttributes {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub property_type: PropertyType,
    /// Listing price in the marketplace currency.
    pub price: f64,
    #[serde(default)]
    pub land_area: Option<f64>,
    #[serde(default)]
    pub building_area: Option<f64>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(default)]
    pub floors: Option<u32>,
    #[serde(default)]
    pub legal_status: Option<LegalStatus>,
    #[serde(default)]
    pub foreign_eligible: bool,
    /// Advertised return-on-investment, percent per year.
    #[serde(default)]
    pub roi_percentage: Option<f64>,
    /// Advertised rental yield, percent per year.
    #[serde(default)]
    pub rental_yield: Option<f64>,
    #[serde(default)]
    pub has_pool: bool,
    #[serde(default)]
    pub has_garden: bool,
    #[serde(default)]
    pub parking_spaces: u32,
    pub furnishing: Furnishing,
    #[serde(default)]
    pub view_type: Option<ViewType>,
    #[serde(default)]
    pub has_3d_model: bool,
    #[serde(default)]
    pub has_vr_tour: bool,
    #[serde(default)]
    pub image_count: u32,
    pub city: String,
    #[serde(default)]
    pub district: Option<String>,
    /// Display address used by the search location match.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub year_built: Option<i32>,
    /// Free-form condition label ("excellent", "good", "fair", "poor", "new").
    #[serde(default)]
    pub condition: Option<String>,
    /// Free-form feature keywords ("pool", "sea_view", "smart_home", ...).
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    /// Lifetime view counter, used by the popularity sort.
    #[serde(default)]
    pub view_count: u64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl PropertyAttributes {
    /// Area used for per-sqm pricing: building area preferred, land as
    /// fallback.
    pub fn effective_area(&self) -> Option<f64> {
        self.building_area.or(self.land_area)
    }

    /// Price per effective square meter, when an area is known.
    pub fn price_per_area(&self) -> Option<f64> {
        match self.effective_area() {
            Some(a) if a > 0.0 => Some(self.price / a),
            _ => None,
        }
    }
}
