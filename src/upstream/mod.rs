//! Upstream AI collaborators.
//!
//! Each capability the analysis pipeline needs is a separate trait so the
//! pipeline can be driven by real HTTP clients in production and by
//! in-memory fakes in tests:
//!
//! - [`LabelExtractor`]: label photo → structured [`Extraction`]
//! - [`HealthAnalyzer`]: extraction + profile → [`HealthReport`]
//! - [`MealAnalyzer`]: meal photo → [`MealAnalysis`]
//! - [`LanguageDetector`]: text → ISO language code
//! - [`ReportLocalizer`]: report → [`LocalizedReport`]
//! - [`SpeechSynthesizer`]: text → MP3 audio (optional capability)
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod fallback;
pub mod openai;
pub mod prompts;
pub mod speech;

pub use fallback::{TaggingLocalizer, UnknownLanguageDetector};
pub use openai::OpenAiClient;
pub use speech::OpenAiSpeech;

use crate::config::UpstreamConfig;
use crate::error::{AppError, Result};
use crate::models::{Extraction, HealthReport, LocalizedReport, MealAnalysis, UserProfile};
use crate::utils::logging::sanitize;
use crate::utils::retry::{parse_retry_after, with_retry, UpstreamFailure};
use crate::vision::DecodedImage;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A model response together with its usage accounting.
#[derive(Debug, Clone)]
pub struct Completion<T> {
    pub value: T,
    pub model: String,
    pub total_tokens: u64,
}

#[async_trait]
pub trait LabelExtractor: Send + Sync {
    async fn extract_from_image(&self, image: &DecodedImage) -> Result<Completion<Extraction>>;
}

#[async_trait]
pub trait HealthAnalyzer: Send + Sync {
    /// Model identifier, used to attribute cache hits.
    fn model(&self) -> &str;

    async fn analyze_health(&self, extraction: &Extraction, profile: &UserProfile) -> Result<Completion<HealthReport>>;
}

#[async_trait]
pub trait MealAnalyzer: Send + Sync {
    async fn analyze_meal(&self, image: &DecodedImage) -> Result<Completion<MealAnalysis>>;
}

#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// ISO 639-1 code of `text`, or `"unknown"`.
    async fn detect_language(&self, text: &str) -> Result<String>;
}

#[async_trait]
pub trait ReportLocalizer: Send + Sync {
    async fn localize_report(
        &self,
        report: &HealthReport,
        target_language: &str,
        profile: &UserProfile,
    ) -> Result<LocalizedReport>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// MP3 audio for `text`.
    async fn generate_speech(&self, text: &str, language: &str) -> Result<Bytes>;
}

/// The full set of collaborators the analysis pipeline calls.
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn LabelExtractor>,
    pub health: Arc<dyn HealthAnalyzer>,
    pub meal: Arc<dyn MealAnalyzer>,
    pub language: Arc<dyn LanguageDetector>,
    pub localizer: Arc<dyn ReportLocalizer>,
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl Collaborators {
    /// Build HTTP-backed collaborators from configuration.
    ///
    /// Localization and language detection fall back to offline
    /// implementations when the translation endpoint has no API key, and
    /// speech is disabled when its endpoint has none.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        let http = build_http_client(config.timeout_seconds)?;

        for (name, endpoint) in [("vision", &config.vision), ("health", &config.health), ("meal", &config.meal)] {
            if endpoint.resolve_api_key().is_none() {
                warn!(
                    "No API key for the {} endpoint (set {}); calls will be rejected upstream",
                    name, endpoint.api_key_env
                );
            }
        }

        let (language, localizer): (Arc<dyn LanguageDetector>, Arc<dyn ReportLocalizer>) =
            if config.translation.resolve_api_key().is_some() {
                let client = Arc::new(OpenAiClient::new(http.clone(), &config.translation, config.max_retries));
                (
                    client.clone() as Arc<dyn LanguageDetector>,
                    client as Arc<dyn ReportLocalizer>,
                )
            } else {
                info!("No translation API key configured, using offline localization fallback");
                (
                    Arc::new(UnknownLanguageDetector) as Arc<dyn LanguageDetector>,
                    Arc::new(TaggingLocalizer) as Arc<dyn ReportLocalizer>,
                )
            };

        let speech: Option<Arc<dyn SpeechSynthesizer>> = match OpenAiSpeech::from_config(http.clone(), config) {
            Some(speech) => Some(Arc::new(speech)),
            None => {
                info!("Text-to-speech disabled");
                None
            }
        };

        Ok(Self {
            extractor: Arc::new(OpenAiClient::new(http.clone(), &config.vision, config.max_retries)),
            health: Arc::new(OpenAiClient::new(http.clone(), &config.health, config.max_retries)),
            meal: Arc::new(OpenAiClient::new(http, &config.meal, config.max_retries)),
            language,
            localizer,
            speech,
        })
    }
}

/// Shared HTTP client with connection pooling.
pub fn build_http_client(timeout_seconds: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .use_rustls_tls()
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

    debug!("Created HTTP client with connection pooling and keep-alive");
    Ok(client)
}

/// POST a JSON body, retrying rate limits and server errors.
pub(crate) async fn post_json_with_retry<B: Serialize + Sync + ?Sized>(
    http: &Client,
    url: &str,
    api_key: Option<&str>,
    body: &B,
    max_attempts: u32,
    operation_name: &str,
) -> std::result::Result<reqwest::Response, UpstreamFailure> {
    with_retry(operation_name, max_attempts, move || async move {
        let mut request = http.post(url).json(body);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamFailure::transport(format!("HTTP error: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let text = response.text().await.unwrap_or_default();
        let message = extract_error_message(&text).unwrap_or(text);

        Err(UpstreamFailure::new(status.as_u16(), message).with_retry_after(retry_after))
    })
    .await
}

/// Log a failed upstream call and describe it for the client.
pub(crate) fn describe_failure(service: &str, failure: &UpstreamFailure) -> String {
    crate::metrics::record_upstream_error(service);
    let body = sanitize(&failure.body);
    warn!(service, status = failure.status, "Upstream call failed: {}", body);
    if failure.status == 0 {
        format!("{} service unreachable", service)
    } else {
        format!("{} service returned HTTP {}", service, failure.status)
    }
}

/// Extract error message from an OpenAI-style `{"error": {"message": ...}}` body
fn extract_error_message(response_text: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorResponse>(response_text)
        .ok()?
        .error?
        .message
}
