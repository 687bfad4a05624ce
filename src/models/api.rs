//! Request and response bodies of the public REST API.

// Author: kelexine (https://github.com/kelexine)

use super::nutrition::Extraction;
use super::report::{HealthReport, MealAnalysis, UserProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `POST /api/analyze` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64 image, optionally with a `data:image/...;base64,` prefix.
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub profile: UserProfile,
}

/// `POST /api/analyze` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub confidence: f64,
    pub detected_language: String,
    pub extraction: Extraction,
    pub health_report: HealthReport,
    pub performance: AnalysisPerformance,
}

/// Timing summary attached to an analysis response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPerformance {
    pub total_ms: f64,
    pub cached: bool,
}

/// `POST /api/meal` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealRequest {
    #[serde(default)]
    pub image: Option<String>,
}

/// `POST /api/meal` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealResponse {
    pub success: bool,
    pub analyzed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub meal: MealAnalysis,
}

/// `POST /api/localize` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizeRequest {
    #[serde(default)]
    pub health_report: Option<HealthReport>,

    #[serde(default)]
    pub target_language: Option<String>,

    #[serde(default)]
    pub profile: UserProfile,
}

/// `POST /api/tts` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default = "default_language")]
    pub language: String,
}

/// Query string of `GET /api/cache/keys`.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyPatternQuery {
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_pattern() -> String {
    "*".to_string()
}
