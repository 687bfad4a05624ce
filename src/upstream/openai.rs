// OpenAI-compatible chat completions client
// Author: kelexine (https://github.com/kelexine)

use super::fallback::{english_report, is_english};
use super::prompts::{
    health_user_prompt, localization_user_prompt, EXTRACTION_PROMPT, EXTRACTION_SYSTEM_PROMPT,
    HEALTH_REASONING_PROMPT, LANGUAGE_DETECTION_PROMPT, LOCALIZATION_SYSTEM_PROMPT, MEAL_ANALYSIS_PROMPT,
};
use super::{
    describe_failure, post_json_with_retry, Completion, HealthAnalyzer, LabelExtractor, LanguageDetector,
    MealAnalyzer, ReportLocalizer,
};
use crate::config::ModelEndpoint;
use crate::error::{AppError, Result};
use crate::models::{language_name, Extraction, HealthReport, LocalizedReport, MealAnalysis, UserProfile};
use crate::utils::retry::UpstreamFailure;
use crate::vision::DecodedImage;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Client for one OpenAI-compatible `chat/completions` endpoint.
///
/// OpenAI, Groq and Gemini's OpenAI surface all speak this protocol, so a
/// single implementation serves every text and vision capability; which
/// model answers is decided by the [`ModelEndpoint`] it was built from.
pub struct OpenAiClient {
    http_client: Client,
    endpoint: ModelEndpoint,
    api_key: Option<String>,
    max_retries: u32,
}

impl OpenAiClient {
    pub fn new(http_client: Client, endpoint: &ModelEndpoint, max_retries: u32) -> Self {
        Self {
            http_client,
            api_key: endpoint.resolve_api_key(),
            endpoint: endpoint.clone(),
            max_retries,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.base_url.trim_end_matches('/'))
    }

    /// Send a chat request and parse the first choice's content as JSON.
    async fn chat_json<T: DeserializeOwned>(
        &self,
        operation_name: &str,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> std::result::Result<Completion<T>, ChatError> {
        let request = ChatRequest {
            model: &self.endpoint.model,
            messages,
            temperature,
            max_tokens,
            response_format: ResponseFormat::json_object(),
        };

        debug!("Calling {} on model {}", operation_name, self.endpoint.model);

        let response = post_json_with_retry(
            &self.http_client,
            &self.completions_url(),
            self.api_key.as_deref(),
            &request,
            self.max_retries,
            operation_name,
        )
        .await
        .map_err(ChatError::Upstream)?;

        let response_text = response
            .text()
            .await
            .map_err(|e| ChatError::Upstream(UpstreamFailure::transport(format!("Failed to read body: {}", e))))?;

        let envelope: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| ChatError::Malformed(format!("Invalid completion envelope: {}", e)))?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ChatError::Malformed("Empty response from model".to_string()))?;

        let value = serde_json::from_str(strip_code_fences(&content))
            .map_err(|e| ChatError::Malformed(format!("Response is not the expected JSON: {}", e)))?;

        Ok(Completion {
            value,
            model: self.endpoint.model.clone(),
            total_tokens: envelope.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }
}

#[async_trait]
impl LabelExtractor for OpenAiClient {
    async fn extract_from_image(&self, image: &DecodedImage) -> Result<Completion<Extraction>> {
        info!("Starting label extraction via {}", self.endpoint.model);
        let messages = vec![
            ChatMessage::text("system", EXTRACTION_SYSTEM_PROMPT),
            ChatMessage::parts(
                "user",
                vec![ContentPart::image(image.to_data_url()), ContentPart::text(EXTRACTION_PROMPT)],
            ),
        ];

        self.chat_json("Label extraction", messages, 0.1, 2000)
            .await
            .map_err(|e| match e {
                ChatError::Upstream(failure) => AppError::Vision(describe_failure("vision", &failure)),
                ChatError::Malformed(msg) => {
                    crate::metrics::record_upstream_error("vision");
                    warn!("Extraction response could not be parsed: {}", msg);
                    AppError::ExtractionParse(msg)
                }
            })
    }
}

#[async_trait]
impl HealthAnalyzer for OpenAiClient {
    fn model(&self) -> &str {
        &self.endpoint.model
    }

    async fn analyze_health(&self, extraction: &Extraction, profile: &UserProfile) -> Result<Completion<HealthReport>> {
        info!(conditions = ?profile.effective_conditions(), "Starting health analysis via {}", self.endpoint.model);
        let messages = vec![
            ChatMessage::text("system", HEALTH_REASONING_PROMPT),
            ChatMessage::text("user", health_user_prompt(extraction, profile)),
        ];

        let completion: Completion<HealthReport> = self
            .chat_json("Health analysis", messages, 0.2, 2000)
            .await
            .map_err(|e| AppError::HealthAnalysis(e.describe("health")))?;

        debug!(
            score = completion.value.score,
            warnings = completion.value.warnings.len(),
            "Health analysis complete"
        );
        Ok(completion)
    }
}

#[async_trait]
impl MealAnalyzer for OpenAiClient {
    async fn analyze_meal(&self, image: &DecodedImage) -> Result<Completion<MealAnalysis>> {
        info!("Starting meal analysis via {}", self.endpoint.model);
        let messages = vec![ChatMessage::parts(
            "user",
            vec![ContentPart::text(MEAL_ANALYSIS_PROMPT), ContentPart::image(image.to_data_url())],
        )];

        self.chat_json("Meal analysis", messages, 0.2, 2000)
            .await
            .map_err(|e| AppError::MealAnalysis(e.describe("meal")))
    }
}

#[async_trait]
impl LanguageDetector for OpenAiClient {
    async fn detect_language(&self, text: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Detected {
            #[serde(default)]
            locale: Option<String>,
        }

        let messages = vec![
            ChatMessage::text("system", LANGUAGE_DETECTION_PROMPT),
            ChatMessage::text("user", text),
        ];
        let completion: Completion<Detected> = self
            .chat_json("Language detection", messages, 0.0, 20)
            .await
            .map_err(|e| AppError::Localization(e.describe("language")))?;

        Ok(completion
            .value
            .locale
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| "unknown".to_string()))
    }
}

#[async_trait]
impl ReportLocalizer for OpenAiClient {
    async fn localize_report(
        &self,
        report: &HealthReport,
        target_language: &str,
        profile: &UserProfile,
    ) -> Result<LocalizedReport> {
        if is_english(target_language) {
            return Ok(english_report(report));
        }

        let display_name = language_name(target_language);
        info!(target_language, "Localizing health report via {}", self.endpoint.model);

        let texts = serde_json::to_string_pretty(&ReportTexts::from_report(report))?;
        let messages = vec![
            ChatMessage::text("system", LOCALIZATION_SYSTEM_PROMPT),
            ChatMessage::text("user", localization_user_prompt(&texts, &display_name, profile)),
        ];

        let completion: Completion<ReportTexts> = self
            .chat_json("Report localization", messages, 0.2, 2000)
            .await
            .map_err(|e| AppError::Localization(e.describe("localization")))?;

        Ok(LocalizedReport {
            localized_report: completion.value.apply_to(report),
            language: target_language.to_string(),
            language_name: display_name,
        })
    }
}

/// Failure of a single chat call before it is mapped to a capability error.
enum ChatError {
    Upstream(UpstreamFailure),
    Malformed(String),
}

impl ChatError {
    fn describe(self, service: &str) -> String {
        match self {
            ChatError::Upstream(failure) => describe_failure(service, &failure),
            ChatError::Malformed(msg) => {
                crate::metrics::record_upstream_error(service);
                warn!(service, "Unusable model response: {}", msg);
                msg
            }
        }
    }
}

/// Strip a markdown code fence some models wrap JSON in.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl ResponseFormat {
    fn json_object() -> Self {
        Self { kind: "json_object" }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

impl ChatMessage {
    fn text(role: &'static str, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
        }
    }

    fn parts(role: &'static str, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    fn image(url: String) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl { url, detail: "high" },
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

/// The translatable parts of a health report.
#[derive(Debug, Serialize, Deserialize)]
struct ReportTexts {
    #[serde(default)]
    verdict: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    warnings: Vec<WarningTexts>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WarningTexts {
    #[serde(default)]
    ingredient: String,
    #[serde(default)]
    risk: String,
}

impl ReportTexts {
    fn from_report(report: &HealthReport) -> Self {
        Self {
            verdict: report.verdict.clone(),
            summary: report.summary.clone(),
            warnings: report
                .warnings
                .iter()
                .map(|w| WarningTexts {
                    ingredient: w.ingredient.clone(),
                    risk: w.risk.clone(),
                })
                .collect(),
        }
    }

    /// Merge translations into a copy of `report`; empty translations keep the original text.
    fn apply_to(self, report: &HealthReport) -> HealthReport {
        fn pick(translated: String, original: &mut String) {
            if !translated.trim().is_empty() {
                *original = translated;
            }
        }

        let mut localized = report.clone();
        pick(self.verdict, &mut localized.verdict);
        pick(self.summary, &mut localized.summary);
        for (warning, texts) in localized.warnings.iter_mut().zip(self.warnings) {
            pick(texts.ingredient, &mut warning.ingredient);
            pick(texts.risk, &mut warning.risk);
        }
        localized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HealthWarning;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_image_part_serialization() {
        let part = ContentPart::image("data:image/png;base64,AAAA".to_string());
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "image_url");
        assert_eq!(json["image_url"]["url"], "data:image/png;base64,AAAA");
        assert_eq!(json["image_url"]["detail"], "high");
    }

    #[test]
    fn test_report_texts_merge_keeps_structure() {
        let report = HealthReport {
            score: 6.0,
            verdict: "Good".to_string(),
            warnings: vec![
                HealthWarning {
                    ingredient: "sugar".to_string(),
                    risk: "Hidden sugar".to_string(),
                    severity: Some("medium".to_string()),
                    ..Default::default()
                },
                HealthWarning {
                    ingredient: "E621".to_string(),
                    risk: "Additive".to_string(),
                    ..Default::default()
                },
            ],
            summary: "Fine in moderation".to_string(),
            ..Default::default()
        };

        // Model dropped the second warning and left the summary blank
        let texts = ReportTexts {
            verdict: "Bueno".to_string(),
            summary: String::new(),
            warnings: vec![WarningTexts {
                ingredient: "azúcar".to_string(),
                risk: "Azúcar oculta".to_string(),
            }],
        };

        let merged = texts.apply_to(&report);
        assert_eq!(merged.score, 6.0);
        assert_eq!(merged.verdict, "Bueno");
        assert_eq!(merged.summary, "Fine in moderation");
        assert_eq!(merged.warnings[0].ingredient, "azúcar");
        assert_eq!(merged.warnings[0].severity.as_deref(), Some("medium"));
        assert_eq!(merged.warnings[1].ingredient, "E621");
    }
}
