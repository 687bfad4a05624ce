// Error types for the nutralingo backend
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Could not reliably extract label. Please retake photo with better lighting.")]
    LowConfidence { confidence: f64, errors: Vec<String> },

    #[error("{message}")]
    InvalidRequest { code: &'static str, message: String },

    #[error("Image analysis failed: {0}")]
    Vision(String),

    #[error("Failed to parse extraction results: {0}")]
    ExtractionParse(String),

    #[error("Health analysis failed: {0}")]
    HealthAnalysis(String),

    #[error("Meal analysis failed: {0}")]
    MealAnalysis(String),

    #[error("Translation service unavailable: {0}")]
    Localization(String),

    #[error("Voice generation failed: {0}")]
    Tts(String),

    #[error("Voice generation is not configured on this server")]
    TtsUnavailable,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a 400 response with a machine-readable code.
    pub fn invalid_request(code: &'static str, message: impl Into<String>) -> Self {
        AppError::InvalidRequest {
            code,
            message: message.into(),
        }
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidImage(_) | AppError::LowConfidence { .. } | AppError::ExtractionParse(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Vision(_)
            | AppError::HealthAnalysis(_)
            | AppError::MealAnalysis(_)
            | AppError::Localization(_)
            | AppError::Tts(_)
            | AppError::Http(_) => StatusCode::BAD_GATEWAY,
            AppError::TtsUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code returned to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidImage(_) => "INVALID_IMAGE",
            AppError::LowConfidence { .. } => "LOW_CONFIDENCE",
            AppError::InvalidRequest { code, .. } => *code,
            AppError::Vision(_) => "VISION_ERROR",
            AppError::ExtractionParse(_) => "EXTRACTION_PARSE_ERROR",
            AppError::HealthAnalysis(_) => "HEALTH_ANALYSIS_ERROR",
            AppError::MealAnalysis(_) => "MEAL_ANALYSIS_ERROR",
            AppError::Localization(_) => "LOCALIZATION_ERROR",
            AppError::Tts(_) => "TTS_ERROR",
            AppError::TtsUnavailable => "TTS_UNAVAILABLE",
            AppError::Http(_) => "UPSTREAM_ERROR",
            AppError::Config(_) | AppError::ConfigParsing(_) => "CONFIGURATION_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Whether the message is safe to show to clients verbatim.
    fn is_client_visible(&self) -> bool {
        !matches!(
            self,
            AppError::Io(_) | AppError::Json(_) | AppError::Internal(_) | AppError::Config(_) | AppError::ConfigParsing(_)
        )
    }
}

// Convert AppError to HTTP responses for Axum
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.code(), "Request failed: {}", self);
        } else {
            tracing::warn!(code = self.code(), "Request rejected: {}", self);
        }

        let message = if self.is_client_visible() {
            self.to_string()
        } else {
            "Something went wrong. Please try again.".to_string()
        };

        let body = match &self {
            AppError::LowConfidence { confidence, errors } => json!({
                "error": self.code(),
                "message": message,
                "confidence": confidence,
                "validationErrors": errors,
            }),
            AppError::TtsUnavailable => json!({
                "error": self.code(),
                "message": message,
                "fallback": "browser-speech-synthesis",
            }),
            _ => json!({
                "error": self.code(),
                "message": message,
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
