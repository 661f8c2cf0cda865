//! # Valuation tables & engine configuration
//!
//! Immutable lookup tables injected into the valuation estimator:
//! base price per sqm by property type, city price index, city market
//! trend, and per-feature adjustment multipliers.
//!
//! - Loads from TOML config (`config/valuation.toml` by default).
//! - Case-insensitive city lookup with whitespace normalization.
//! - Unknown keys resolve to documented defaults (city index 0.5,
//!   stable trend), never errors.
//! - Includes a built-in `default_seed()` used when no config is found.

use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

use crate::valuation::MarketTrend;

pub const DEFAULT_VALUATION_CONFIG_PATH: &str = "config/valuation.toml";
pub const ENV_VALUATION_CONFIG_PATH: &str = "VALUATION_CONFIG_PATH";

/// Index applied to cities absent from the table.
pub const DEFAULT_CITY_INDEX: f64 = 0.5;

/// Valuation lookup tables, loaded from TOML or seeded.
#[derive(Debug, Clone, Deserialize)]
pub struct ValuationTables {
    /// Base price per square meter keyed by property type.
    #[serde(default)]
    pub base_price_per_sqm: HashMap<String, f64>,
    /// Relative price level per city (Jakarta = 1.0).
    #[serde(default)]
    pub city_index: HashMap<String, f64>,
    /// Static city → trend classification.
    #[serde(default)]
    pub city_trend: HashMap<String, MarketTrend>,
    /// Multiplier per recognized feature keyword.
    #[serde(default)]
    pub feature_multipliers: HashMap<String, f64>,
}

impl ValuationTables {
    /// Load tables from a TOML file, falling back to `default_seed()` when
    /// the file is missing or malformed.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s).unwrap_or_else(|_| Self::default_seed()),
            Err(_) => Self::default_seed(),
        }
    }

    /// Resolve the config path from `VALUATION_CONFIG_PATH` or the default.
    pub fn load() -> Self {
        let path = std::env::var(ENV_VALUATION_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_VALUATION_CONFIG_PATH.to_string());
        Self::load_from_file(path)
    }

    /// Base per-sqm price for a property type; 0 when the type is unknown
    /// (an unknown type then fails valuation validation upstream, not here).
    pub fn base_price_for(&self, type_key: &str) -> f64 {
        self.base_price_per_sqm
            .get(&normalize_key(type_key))
            .copied()
            .unwrap_or(0.0)
    }

    /// City price index; unknown cities resolve to `DEFAULT_CITY_INDEX`.
    pub fn city_index_for(&self, city: &str) -> f64 {
        self.city_index
            .get(&normalize_key(city))
            .copied()
            .unwrap_or(DEFAULT_CITY_INDEX)
    }

    /// Market trend for a city; unknown cities are `Stable`.
    pub fn trend_for(&self, city: &str) -> MarketTrend {
        self.city_trend
            .get(&normalize_key(city))
            .copied()
            .unwrap_or(MarketTrend::Stable)
    }

    /// Multiplier for a feature keyword, if it is one we recognize.
    pub fn feature_multiplier(&self, feature: &str) -> Option<f64> {
        self.feature_multipliers
            .get(&normalize_key(feature))
            .copied()
    }

    /// Built-in seed covering the marketplace's launch cities and the
    /// recognized feature keywords. Used as fallback if no config is found.
    pub fn default_seed() -> Self {
        let mut base_price_per_sqm = HashMap::new();
        for (k, v) in [
            ("house", 12_000_000.0),
            ("apartment", 15_000_000.0),
            ("villa", 18_000_000.0),
            ("land", 8_000_000.0),
            ("commercial", 20_000_000.0),
        ] {
            base_price_per_sqm.insert(k.to_string(), v);
        }

        let mut city_index = HashMap::new();
        for (k, v) in [
            ("jakarta", 1.0),
            ("denpasar", 0.9),
            ("badung", 0.95),
            ("surabaya", 0.8),
            ("bandung", 0.75),
            ("tangerang", 0.85),
            ("bekasi", 0.7),
            ("yogyakarta", 0.65),
            ("semarang", 0.6),
            ("medan", 0.6),
        ] {
            city_index.insert(k.to_string(), v);
        }

        let mut city_trend = HashMap::new();
        for (k, v) in [
            ("jakarta", MarketTrend::Rising),
            ("badung", MarketTrend::Rising),
            ("denpasar", MarketTrend::Rising),
            ("tangerang", MarketTrend::Rising),
            ("surabaya", MarketTrend::Stable),
            ("bandung", MarketTrend::Stable),
            ("bekasi", MarketTrend::Declining),
            ("semarang", MarketTrend::Declining),
        ] {
            city_trend.insert(k.to_string(), v);
        }

        let mut feature_multipliers = HashMap::new();
        for (k, v) in [
            ("pool", 1.08),
            ("garden", 1.03),
            ("garage", 1.04),
            ("security", 1.03),
            ("furnished", 1.05),
            ("air_conditioning", 1.02),
            ("gym", 1.03),
            ("rooftop", 1.04),
            ("smart_home", 1.05),
            ("sea_view", 1.12),
            ("mountain_view", 1.06),
            ("golf_view", 1.08),
        ] {
            feature_multipliers.insert(k.to_string(), v);
        }

        Self {
            base_price_per_sqm,
            city_index,
            city_trend,
            feature_multipliers,
        }
    }
}

/// Lowercase, trimmed lookup key.
fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

// --- Search cache knobs ---

pub const DEFAULT_SEARCH_CACHE_TTL_MS: u64 = 300_000;
pub const DEFAULT_SEARCH_CACHE_CAPACITY: usize = 256;

pub const ENV_SEARCH_CACHE_TTL_MS: &str = "SEARCH_CACHE_TTL_MS";
pub const ENV_SEARCH_CACHE_CAPACITY: &str = "SEARCH_CACHE_CAPACITY";

/// Runtime knobs for the process-local search result cache.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub ttl_ms: u64,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_SEARCH_CACHE_TTL_MS,
            capacity: DEFAULT_SEARCH_CACHE_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Read TTL/capacity overrides from the environment; bad values keep
    /// the defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(ttl) = std::env::var(ENV_SEARCH_CACHE_TTL_MS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            if ttl > 0 {
                cfg.ttl_ms = ttl;
            }
        }
        if let Some(cap) = std::env::var(ENV_SEARCH_CACHE_CAPACITY)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            if cap > 0 {
                cfg.capacity = cap;
            }
        }
        cfg
    }
}
