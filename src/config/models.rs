//! Configuration data structures for the nutralingo backend.
//!
//! This module defines the schema for the application settings, including
//! server parameters, cache sizing and the upstream AI service endpoints.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::cache::{CacheConfig, LlmCacheConfig};
use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, CORS origin).
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Generic response cache sizing.
    #[serde(default)]
    pub response_cache: CacheConfig,

    /// Similarity-based LLM response cache sizing and matching.
    #[serde(default)]
    pub llm_cache: LlmCacheConfig,

    /// Upstream AI service endpoints.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `5000`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origin allowed by CORS (the web front end).
    /// Default: `http://localhost:3000`
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    /// Maximum accepted request body size in bytes.
    /// Default: 15 MiB (a 10 MiB image grows by a third when base64 encoded)
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Whether to gzip-compress HTTP responses.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub enable_compression: bool,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Whether to mask API keys in logged upstream errors.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub sanitize_tokens: bool,
}

/// Settings shared by all upstream AI calls plus one endpoint per capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Request timeout in seconds for every upstream call.
    /// Default: `60`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of attempts for retryable upstream failures.
    /// Default: `3`
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Label image → structured extraction.
    #[serde(default = "default_vision_endpoint")]
    pub vision: ModelEndpoint,

    /// Extraction + profile → health report.
    #[serde(default = "default_health_endpoint")]
    pub health: ModelEndpoint,

    /// Meal photo → nutritional breakdown.
    #[serde(default = "default_meal_endpoint")]
    pub meal: ModelEndpoint,

    /// Report localization and label language detection.
    #[serde(default = "default_translation_endpoint")]
    pub translation: ModelEndpoint,

    /// Text-to-speech. Leave the key unset to run without voice output.
    #[serde(default)]
    pub speech: SpeechConfig,
}

/// An OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEndpoint {
    /// Base URL up to and including the API version, e.g. `https://api.openai.com/v1`.
    pub base_url: String,

    /// Model identifier sent with each request.
    pub model: String,

    /// API key. Falls back to the environment variable named by `api_key_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is unset.
    #[serde(default)]
    pub api_key_env: String,
}

/// Settings for the optional text-to-speech capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_speech_endpoint")]
    pub endpoint: ModelEndpoint,

    /// Voice preset.
    /// Default: `nova`
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Playback speed; slightly slow by default for medical content.
    /// Default: `0.95`
    #[serde(default = "default_speed")]
    pub speed: f32,
}

impl ModelEndpoint {
    fn new(base_url: &str, model: &str, api_key_env: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            model: model.to_string(),
            api_key: None,
            api_key_env: api_key_env.to_string(),
        }
    }

    /// The configured API key, or the one in `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                if self.api_key_env.is_empty() {
                    return None;
                }
                std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty())
            })
    }
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            frontend_url: default_frontend_url(),
            body_limit_bytes: default_body_limit(),
            enable_compression: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            sanitize_tokens: true,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            vision: default_vision_endpoint(),
            health: default_health_endpoint(),
            meal: default_meal_endpoint(),
            translation: default_translation_endpoint(),
            speech: SpeechConfig::default(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_speech_endpoint(),
            voice: default_voice(),
            speed: default_speed(),
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_body_limit() -> usize {
    15 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

fn default_vision_endpoint() -> ModelEndpoint {
    ModelEndpoint::new(OPENAI_BASE_URL, "gpt-4o", "OPENAI_API_KEY")
}

fn default_health_endpoint() -> ModelEndpoint {
    ModelEndpoint::new("https://api.groq.com/openai/v1", "llama-3.3-70b-versatile", "GROQ_API_KEY")
}

fn default_meal_endpoint() -> ModelEndpoint {
    ModelEndpoint::new(
        "https://generativelanguage.googleapis.com/v1beta/openai",
        "gemini-2.5-flash",
        "GEMINI_API_KEY",
    )
}

fn default_translation_endpoint() -> ModelEndpoint {
    ModelEndpoint::new(OPENAI_BASE_URL, "gpt-4o-mini", "OPENAI_API_KEY")
}

fn default_speech_endpoint() -> ModelEndpoint {
    ModelEndpoint::new(OPENAI_BASE_URL, "tts-1", "OPENAI_API_KEY")
}

fn default_voice() -> String {
    "nova".to_string()
}

fn default_speed() -> f32 {
    0.95
}
