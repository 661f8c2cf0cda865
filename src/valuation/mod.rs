// src/valuation/mod.rs
//! Automated property valuation: base per-sqm value, multiplicative
//! adjustments with recorded rationale, market trend, confidence and price
//! range, plus comparable retrieval.

pub mod comparables;
pub mod roi;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ValuationTables;
use crate::property::{PropertyAttributes, PropertyType};
use crate::scoring::round2;
use crate::store::PropertyStore;

pub use comparables::ComparableProperty;

/// How long a valuation stays citable.
pub const VALUATION_VALIDITY_DAYS: i64 = 30;

/// Land priced beyond this ratio of the building footprint earns an extra
/// land-value term.
const EXCESS_LAND_RATIO: f64 = 1.5;
const EXCESS_LAND_VALUE_SHARE: f64 = 0.3;

const CONFIDENCE_BASE: f64 = 60.0;
const CONFIDENCE_CAP: f64 = 95.0;
const TREND_ADJUSTMENT_PCT: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketTrend {
    Rising,
    Stable,
    Declining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorImpact {
    Positive,
    Neutral,
    Negative,
}

/// One applied adjustment, kept for explainability (what moved the number
/// and by how much).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationFactor {
    pub name: String,
    pub impact: FactorImpact,
    /// The multiplier that was applied.
    pub weight: f64,
    pub description: String,
}

impl ValuationFactor {
    fn applied(name: impl Into<String>, multiplier: f64, description: impl Into<String>) -> Self {
        let impact = if multiplier > 1.0 {
            FactorImpact::Positive
        } else if multiplier < 1.0 {
            FactorImpact::Negative
        } else {
            FactorImpact::Neutral
        };
        Self {
            name: name.into(),
            impact,
            weight: multiplier,
            description: description.into(),
        }
    }
}

/// Explicit valuation input; required vs. optional fields are visible here
/// instead of being an implicit missing-key coercion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationInput {
    pub property_type: PropertyType,
    pub city: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub land_area: Option<f64>,
    #[serde(default)]
    pub building_area: Option<f64>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub floors: Option<u32>,
    #[serde(default)]
    pub year_built: Option<i32>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Asking price, when the property is already listed.
    #[serde(default)]
    pub current_price: Option<f64>,
}

impl From<&PropertyAttributes> for ValuationInput {
    fn from(p: &PropertyAttributes) -> Self {
        Self {
            property_type: p.property_type,
            city: p.city.clone(),
            district: p.district.clone(),
            land_area: p.land_area,
            building_area: p.building_area,
            bedrooms: p.bedrooms,
            floors: p.floors,
            year_built: p.year_built,
            condition: p.condition.clone(),
            features: p.features.clone(),
            latitude: p.latitude,
            longitude: p.longitude,
            current_price: if p.price > 0.0 { Some(p.price) } else { None },
        }
    }
}

/// The full valuation output, valid for 30 days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub estimated_value: f64,
    /// In [0, 95]; more supplied optional fields never decrease it.
    pub confidence_score: f64,
    pub price_range_low: f64,
    pub price_range_high: f64,
    pub market_trend: MarketTrend,
    #[serde(default)]
    pub comparable_properties: Vec<ComparableProperty>,
    pub valuation_factors: Vec<ValuationFactor>,
    pub methodology: String,
    pub valid_until: DateTime<Utc>,
}

/// Incomplete-input failure; the handler surfaces the named field instead of
/// a generic message.
#[derive(Debug)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid valuation input: {}", self.0)
    }
}

impl std::error::Error for ValidationError {}

/// Run the deterministic valuation pipeline. Comparables are attached
/// separately (they need the store); `comparable_properties` is empty here.
pub fn estimate(
    input: &ValuationInput,
    tables: &ValuationTables,
    now: DateTime<Utc>,
) -> anyhow::Result<ValuationResult> {
    let effective_area = input.building_area.or(input.land_area).filter(|a| *a > 0.0);
    let Some(area) = effective_area else {
        return Err(ValidationError("building_area or land_area is required".into()).into());
    };
    if input.city.trim().is_empty() {
        return Err(ValidationError("city is required".into()).into());
    }
    let base_price = tables.base_price_for(input.property_type.as_key());
    if base_price <= 0.0 {
        return Err(ValidationError(format!(
            "no base price configured for property type '{}'",
            input.property_type.as_key()
        ))
        .into());
    }

    let city_index = tables.city_index_for(&input.city);

    // 1) Base value, with an extra land term for oversized plots.
    let mut value = area * base_price * city_index;
    if let (Some(land), Some(building)) = (input.land_area, input.building_area) {
        if land > EXCESS_LAND_RATIO * building {
            value += (land - building) * EXCESS_LAND_VALUE_SHARE * base_price * city_index;
        }
    }

    // 2) Multiplicative adjustments, each recorded as a factor.
    let mut factors = Vec::new();
    let mut multiplier = 1.0;
    let mut apply = |m: f64, name: &str, desc: String, factors: &mut Vec<ValuationFactor>| {
        multiplier *= m;
        factors.push(ValuationFactor::applied(name, m, desc));
    };

    if let Some(year) = input.year_built {
        let age = (now.year() - year).max(0);
        let (m, desc) = match age {
            0..=2 => (1.10, "nearly new construction"),
            3..=5 => (1.05, "recent construction"),
            a if a > 20 => (0.85, "aging building stock"),
            _ => (1.0, "typical building age"),
        };
        apply(m, "age", format!("{desc} ({age} years)"), &mut factors);
    }

    if let Some(bedrooms) = input.bedrooms {
        if bedrooms >= 4 {
            apply(
                1.08,
                "bedrooms",
                format!("family-sized layout ({bedrooms} bedrooms)"),
                &mut factors,
            );
        } else if bedrooms == 1 {
            apply(
                0.95,
                "bedrooms",
                "single-bedroom layout".to_string(),
                &mut factors,
            );
        }
    }

    if input.floors.unwrap_or(0) >= 2 {
        apply(
            1.05,
            "floors",
            "multi-floor building".to_string(),
            &mut factors,
        );
    }

    if let Some(cond) = input.condition.as_deref() {
        let key = cond.trim().to_ascii_lowercase();
        let (m, desc) = match key.as_str() {
            "excellent" | "new" => (1.10, "excellent condition"),
            "good" => (1.02, "good condition"),
            "fair" => (0.95, "fair condition"),
            "poor" => (0.80, "poor condition"),
            _ => (1.0, "unclassified condition"),
        };
        apply(m, "condition", desc.to_string(), &mut factors);
    }

    for feature in &input.features {
        if let Some(m) = tables.feature_multiplier(feature) {
            apply(
                m,
                feature.trim().to_ascii_lowercase().as_str(),
                format!("listed feature: {}", feature.trim().to_ascii_lowercase()),
                &mut factors,
            );
        }
    }

    value *= multiplier;

    // 3) Market trend, +-3% by static city classification.
    let trend = tables.trend_for(&input.city);
    value *= match trend {
        MarketTrend::Rising => 1.0 + TREND_ADJUSTMENT_PCT,
        MarketTrend::Stable => 1.0,
        MarketTrend::Declining => 1.0 - TREND_ADJUSTMENT_PCT,
    };

    // 4) Confidence grows with every optional field supplied, capped.
    let mut confidence = CONFIDENCE_BASE;
    if input.year_built.is_some() {
        confidence += 5.0;
    }
    if input.condition.is_some() {
        confidence += 5.0;
    }
    if !input.features.is_empty() {
        confidence += 5.0;
    }
    if input.district.is_some() {
        confidence += 5.0;
    }
    if input.latitude.is_some() && input.longitude.is_some() {
        confidence += 10.0;
    }
    if input.current_price.is_some() {
        confidence += 5.0;
    }
    let confidence = confidence.min(CONFIDENCE_CAP);

    // 5) Range widens as confidence drops; low <= value <= high holds by
    // construction.
    let range_pct = (100.0 - confidence) / 100.0 * 0.15 + 0.10;
    let value = round2(value);

    Ok(ValuationResult {
        estimated_value: value,
        confidence_score: confidence,
        price_range_low: round2(value * (1.0 - range_pct)),
        price_range_high: round2(value * (1.0 + range_pct)),
        market_trend: trend,
        comparable_properties: Vec::new(),
        valuation_factors: factors,
        methodology: "heuristic model: base price per sqm x city index, attribute adjustments, static city trend".to_string(),
        valid_until: now + Duration::days(VALUATION_VALIDITY_DAYS),
    })
}

/// Full valuation for one request: estimate, then attach up to 5 comparables
/// from the store (excluding the subject when it is a listed property), and
/// optionally persist the result keyed by property id.
pub async fn run_valuation(
    store: &dyn PropertyStore,
    tables: &ValuationTables,
    input: &ValuationInput,
    subject_id: Option<&str>,
    persist: bool,
) -> anyhow::Result<ValuationResult> {
    let mut result = estimate(input, tables, Utc::now())?;

    let reference_price = input.current_price.unwrap_or(result.estimated_value);
    result.comparable_properties =
        comparables::fetch_comparables(store, input.property_type, reference_price, subject_id)
            .await?;

    if persist {
        if let Some(property_id) = subject_id {
            store.persist_valuation(property_id, &result).await?;
        }
    }
    Ok(result)
}
