// Request orchestration: validation, caching, upstream calls and timing
// Author: kelexine (https://github.com/kelexine)

use super::validation::validate_extraction;
use crate::cache::{round_to, CacheManager, LlmResponseCache};
use crate::error::{AppError, Result};
use crate::metrics::{LlmCall, PerformanceMonitor};
use crate::models::{
    AnalysisPerformance, AnalyzeRequest, AnalyzeResponse, LocalizeRequest, LocalizedReport, MealAnalysis,
    MealRequest, TtsRequest,
};
use crate::upstream::{Collaborators, Completion};
use crate::vision::decode_image;
use bytes::Bytes;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Longest text accepted for speech synthesis, in characters.
pub const MAX_TTS_CHARS: usize = 4000;

/// Ingredient text must be longer than this to be worth a language detection call.
const MIN_DETECTION_CHARS: usize = 5;

/// A result together with whether a cache served it.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub cache_hit: bool,
}

/// Runs the analysis flows against the caches, the monitor and the upstream collaborators.
///
/// For label analysis the similarity cache is consulted before the health
/// model is called, and a fresh report is stored before it is returned.
/// Failed upstream calls are never cached. Every upstream call and cache
/// lookup runs under a [`crate::metrics::Timer`].
pub struct AnalysisPipeline {
    collaborators: Collaborators,
    llm_cache: Arc<LlmResponseCache>,
    response_cache: Arc<CacheManager>,
    monitor: Arc<PerformanceMonitor>,
}

impl AnalysisPipeline {
    pub fn new(
        collaborators: Collaborators,
        llm_cache: Arc<LlmResponseCache>,
        response_cache: Arc<CacheManager>,
        monitor: Arc<PerformanceMonitor>,
    ) -> Self {
        Self {
            collaborators,
            llm_cache,
            response_cache,
            monitor,
        }
    }

    pub fn llm_cache(&self) -> &Arc<LlmResponseCache> {
        &self.llm_cache
    }

    pub fn response_cache(&self) -> &Arc<CacheManager> {
        &self.response_cache
    }

    pub fn monitor(&self) -> &Arc<PerformanceMonitor> {
        &self.monitor
    }

    /// Whether a speech synthesizer is configured.
    pub fn has_speech(&self) -> bool {
        self.collaborators.speech.is_some()
    }

    /// Label photo → extraction, health report and detected label language.
    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse> {
        let started = Instant::now();
        let image = decode_image(request.image.as_deref())?;
        debug!(bytes = image.byte_len, format = ?image.format, "Label image accepted");

        // 1. Extraction
        let (extraction, extraction_time) = self
            .timed("vision:extraction", self.collaborators.extractor.extract_from_image(&image))
            .await?;
        self.record_completion(&extraction, extraction_time);
        let extraction = extraction.value;

        // 2. Quality gate
        let validation = validate_extraction(&extraction);
        if !validation.valid {
            warn!(confidence = validation.confidence, "Extraction below confidence threshold");
            return Err(AppError::LowConfidence {
                confidence: validation.confidence,
                errors: validation.errors,
            });
        }

        // 3. Similarity cache, then the health model on a miss
        let mut lookup = self.monitor.start_timer("llm:cache-lookup");
        let cached = self.llm_cache.get_health_analysis(&extraction);
        let lookup_time = lookup.stop().unwrap_or_default();

        let cache_hit = cached.is_some();
        let health_report = match cached {
            Some(report) => {
                self.monitor.record_llm_call(LlmCall {
                    model: self.collaborators.health.model().to_string(),
                    total_tokens: 0,
                    duration: lookup_time,
                    cache_hit: true,
                });
                report
            }
            None => {
                let (completion, analysis_time) = self
                    .timed(
                        "health:analysis",
                        self.collaborators.health.analyze_health(&extraction, &request.profile),
                    )
                    .await?;
                self.record_completion(&completion, analysis_time);
                self.llm_cache.set_health_analysis(&extraction, &completion.value);
                completion.value
            }
        };

        // 4. Label language, best effort
        let detected_language = self.detect_label_language(&extraction.ingredient_text()).await;

        let total_ms = round_to(started.elapsed().as_secs_f64() * 1000.0, 2);
        info!(
            confidence = validation.confidence,
            health_score = health_report.score,
            detected_language = %detected_language,
            cached = cache_hit,
            total_ms,
            "Analysis complete"
        );

        Ok(AnalyzeResponse {
            confidence: validation.confidence,
            detected_language,
            extraction,
            health_report,
            performance: AnalysisPerformance {
                total_ms,
                cached: cache_hit,
            },
        })
    }

    /// Meal photo → nutritional breakdown, cached by exact image hash.
    pub async fn analyze_meal(&self, request: MealRequest) -> Result<Cached<MealAnalysis>> {
        let image = decode_image(request.image.as_deref())?;

        let mut lookup = self.monitor.start_timer("meal:cache-lookup");
        let cached = self.llm_cache.get_meal_analysis(&image.hash);
        lookup.stop();

        if let Some(value) = cached {
            debug!("Meal served from cache");
            return Ok(Cached { value, cache_hit: true });
        }

        let (completion, analysis_time) = self
            .timed("meal:analysis", self.collaborators.meal.analyze_meal(&image))
            .await?;
        self.record_completion(&completion, analysis_time);
        self.llm_cache.set_meal_analysis(&image.hash, &completion.value);

        info!(
            food_items = completion.value.food_items.len(),
            total_calories = completion.value.total_calories,
            "Meal analysis complete"
        );
        Ok(Cached {
            value: completion.value,
            cache_hit: false,
        })
    }

    /// Health report → target language, memoized in the response cache.
    pub async fn localize(&self, request: LocalizeRequest) -> Result<Cached<LocalizedReport>> {
        let report = request
            .health_report
            .ok_or_else(|| AppError::invalid_request("MISSING_REPORT", "Health report is required for localization."))?;
        let target_language = request
            .target_language
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .ok_or_else(|| AppError::invalid_request("MISSING_LANGUAGE", "Target language is required."))?;

        let key = CacheManager::generate_key(
            "localize",
            &json!({
                "report": report,
                "language": target_language,
                "conditions": request.profile.effective_conditions(),
            }),
        );

        let mut lookup = self.monitor.start_timer("localize:cache-lookup");
        let cached = self.response_cache.get(&key);
        lookup.stop();

        if let Some(value) = cached {
            match serde_json::from_value::<LocalizedReport>(value) {
                Ok(localized) => return Ok(Cached { value: localized, cache_hit: true }),
                Err(e) => warn!("Discarding unreadable cached localization: {}", e),
            }
        }

        let (localized, _) = self
            .timed(
                "localization:report",
                self.collaborators
                    .localizer
                    .localize_report(&report, &target_language, &request.profile),
            )
            .await?;

        self.response_cache.set(key, serde_json::to_value(&localized)?);
        info!(language = %localized.language, language_name = %localized.language_name, "Localization served");

        Ok(Cached {
            value: localized,
            cache_hit: false,
        })
    }

    /// Text → MP3 audio, when a speech synthesizer is configured.
    pub async fn speak(&self, request: TtsRequest) -> Result<Bytes> {
        let text = request
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::invalid_request("MISSING_TEXT", "Text is required for voice generation."))?;
        if text.chars().count() > MAX_TTS_CHARS {
            return Err(AppError::invalid_request(
                "TEXT_TOO_LONG",
                format!("Text must be under {} characters.", MAX_TTS_CHARS),
            ));
        }

        let speech = self.collaborators.speech.as_ref().ok_or(AppError::TtsUnavailable)?;
        let (audio, _) = self
            .timed("tts:generation", speech.generate_speech(&text, &request.language))
            .await?;
        Ok(audio)
    }

    /// Detect the label's language; failures degrade to `"unknown"`.
    async fn detect_label_language(&self, ingredient_text: &str) -> String {
        if ingredient_text.chars().count() <= MIN_DETECTION_CHARS {
            return "unknown".to_string();
        }

        match self
            .timed(
                "language:detection",
                self.collaborators.language.detect_language(ingredient_text),
            )
            .await
        {
            Ok((language, _)) => language,
            Err(e) => {
                warn!("Language detection skipped: {}", e);
                "unknown".to_string()
            }
        }
    }

    /// Await `future` under a timer closed as success or failure.
    async fn timed<T, F>(&self, operation: &str, future: F) -> Result<(T, Duration)>
    where
        F: Future<Output = Result<T>>,
    {
        let mut timer = self.monitor.start_timer(operation);
        match future.await {
            Ok(value) => Ok((value, timer.stop().unwrap_or_default())),
            Err(e) => {
                timer.fail();
                Err(e)
            }
        }
    }

    fn record_completion<T>(&self, completion: &Completion<T>, duration: Duration) {
        self.monitor.record_llm_call(LlmCall {
            model: completion.model.clone(),
            total_tokens: completion.total_tokens,
            duration,
            cache_hit: false,
        });
    }
}
