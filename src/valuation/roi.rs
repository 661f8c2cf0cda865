//! AI ROI prediction: provider abstraction over an external text-generation
//! collaborator with a structured-output contract.
//!
//! Provider rate-limit (429) and quota (402) failures surface as typed
//! outcomes; every other failure degrades to a neutral zero-confidence
//! prediction. The engine never fabricates a confident number.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::property::PropertyAttributes;
use crate::valuation::MarketTrend;

/// Structured prediction returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiPrediction {
    /// Percent per year.
    pub predicted_roi: f64,
    /// In [0, 1].
    pub confidence: f64,
    pub trend: MarketTrend,
    pub explanation: String,
}

impl RoiPrediction {
    /// Zero-confidence fallback used for any non-quota provider failure.
    pub fn neutral() -> Self {
        Self {
            predicted_roi: 0.0,
            confidence: 0.0,
            trend: MarketTrend::Stable,
            explanation: "prediction unavailable".to_string(),
        }
    }
}

/// Typed result of one prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoiOutcome {
    Predicted {
        #[serde(flatten)]
        prediction: RoiPrediction,
    },
    RateLimited,
    QuotaExceeded,
}

impl RoiOutcome {
    pub fn neutral() -> Self {
        RoiOutcome::Predicted {
            prediction: RoiPrediction::neutral(),
        }
    }
}

/// Low-level provider seam: does the real remote call. Separated so the
/// same wiring serves production, disabled, and test runs.
#[async_trait]
pub trait RoiProvider: Send + Sync {
    async fn predict(&self, property: &PropertyAttributes) -> RoiOutcome;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynRoiProvider = Arc<dyn RoiProvider>;

/// Build-time config loaded from `config/roi.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiConfig {
    pub enabled: bool,
    /// "openai" is the only real provider for now.
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: None,
            model: None,
        }
    }
}

/// Load config from `config/roi.json`; reading/parsing failures fall back
/// to the disabled default.
pub fn load_roi_config() -> RoiConfig {
    let path = Path::new("config/roi.json");
    match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
        Err(_) => RoiConfig::default(),
    }
}

/// Factory: build a provider according to config and environment.
///
/// * `AI_TEST_MODE=mock` returns a deterministic mock.
/// * `enabled == false` returns the disabled provider.
/// * Otherwise the configured real provider.
pub fn build_provider_from_config(config: &RoiConfig) -> DynRoiProvider {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockRoiProvider {
            fixed: RoiPrediction {
                predicted_roi: 7.5,
                confidence: 0.8,
                trend: MarketTrend::Rising,
                explanation: "mock prediction".to_string(),
            },
        });
    }

    if !config.enabled {
        return Arc::new(DisabledRoiProvider);
    }

    match config.provider.as_deref() {
        Some("openai") => Arc::new(OpenAiRoiProvider::new(config.model.as_deref())),
        _ => Arc::new(DisabledRoiProvider),
    }
}

pub fn build_roi_provider() -> DynRoiProvider {
    build_provider_from_config(&load_roi_config())
}

/// OpenAI-backed provider (Chat Completions, strict JSON output).
/// Requires `OPENAI_API_KEY`.
pub struct OpenAiRoiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiRoiProvider {
    pub fn new(model_override: Option<&str>) -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .user_agent("property-insight/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        let model = model_override.unwrap_or("gpt-4o-mini").to_string();
        Self {
            http,
            api_key,
            model,
        }
    }

    fn prompt_for(property: &PropertyAttributes) -> String {
        format!(
            "Estimate the yearly ROI percentage for this property and answer ONLY with JSON \
             {{\"predicted_roi\": number, \"confidence\": number 0..1, \"trend\": \"rising\"|\"stable\"|\"declining\", \"explanation\": string}}. \
             Property: type={}, city={}, price={}, bedrooms={:?}, building_area={:?}, land_area={:?}, rental_yield={:?}",
            property.property_type.as_key(),
            property.city,
            property.price,
            property.bedrooms,
            property.building_area,
            property.land_area,
            property.rental_yield,
        )
    }
}

/// Wire shape we ask the model for; trend arrives as free text and is
/// normalized defensively.
#[derive(Deserialize)]
struct WirePrediction {
    predicted_roi: f64,
    confidence: f64,
    #[serde(default)]
    trend: String,
    #[serde(default)]
    explanation: String,
}

impl WirePrediction {
    fn into_prediction(self) -> RoiPrediction {
        let trend = match self.trend.trim().to_ascii_lowercase().as_str() {
            "rising" => MarketTrend::Rising,
            "declining" => MarketTrend::Declining,
            _ => MarketTrend::Stable,
        };
        RoiPrediction {
            predicted_roi: self.predicted_roi,
            confidence: self.confidence.clamp(0.0, 1.0),
            trend,
            explanation: self.explanation,
        }
    }
}

#[async_trait]
impl RoiProvider for OpenAiRoiProvider {
    async fn predict(&self, property: &PropertyAttributes) -> RoiOutcome {
        if self.api_key.is_empty() {
            return RoiOutcome::neutral();
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let prompt = Self::prompt_for(property);
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: "You are a cautious real-estate analyst. Answer with strict JSON only.",
                },
                Msg {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.2,
            max_tokens: 200,
        };

        let resp = match self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = ?e, "ROI provider request failed");
                return RoiOutcome::neutral();
            }
        };

        match resp.status().as_u16() {
            429 => return RoiOutcome::RateLimited,
            402 => return RoiOutcome::QuotaExceeded,
            s if !(200..300).contains(&s) => {
                warn!(status = s, "ROI provider returned non-success status");
                return RoiOutcome::neutral();
            }
            _ => {}
        }

        let body: Resp = match resp.json().await {
            Ok(b) => b,
            Err(_) => return RoiOutcome::neutral(),
        };
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("");

        match serde_json::from_str::<WirePrediction>(content) {
            Ok(wire) => RoiOutcome::Predicted {
                prediction: wire.into_prediction(),
            },
            Err(_) => RoiOutcome::neutral(),
        }
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Always neutral; used when ROI prediction is disabled.
pub struct DisabledRoiProvider;

#[async_trait]
impl RoiProvider for DisabledRoiProvider {
    async fn predict(&self, _property: &PropertyAttributes) -> RoiOutcome {
        RoiOutcome::neutral()
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic provider for tests/local runs.
#[derive(Clone)]
pub struct MockRoiProvider {
    pub fixed: RoiPrediction,
}

#[async_trait]
impl RoiProvider for MockRoiProvider {
    async fn predict(&self, _property: &PropertyAttributes) -> RoiOutcome {
        RoiOutcome::Predicted {
            prediction: self.fixed.clone(),
        }
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}
