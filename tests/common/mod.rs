// Shared fakes for integration tests
// Author: kelexine (https://github.com/kelexine)
#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use nutralingo::analysis::AnalysisPipeline;
use nutralingo::cache::{CacheConfig, CacheManager, LlmCacheConfig, LlmResponseCache};
use nutralingo::error::{AppError, Result};
use nutralingo::metrics::PerformanceMonitor;
use nutralingo::models::{
    Extraction, FoodItem, HealthReport, HealthWarning, MealAnalysis, NutrientValue, Nutrition, UserProfile,
};
use nutralingo::upstream::{
    Collaborators, Completion, HealthAnalyzer, LabelExtractor, LanguageDetector, MealAnalyzer, SpeechSynthesizer,
    TaggingLocalizer,
};
use nutralingo::vision::DecodedImage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const HEALTH_MODEL: &str = "fake-health";

/// Base64 of arbitrary bytes standing in for a photo.
pub fn image_of(label: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(label.as_bytes())
}

pub fn extraction(ingredients: &[&str], calories: f64, sodium: f64) -> Extraction {
    Extraction {
        ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        nutrition: Some(Nutrition {
            serving_size: Some("30g".into()),
            calories: Some(NutrientValue::Number(calories)),
            sodium: Some(NutrientValue::Number(sodium)),
            ..Default::default()
        }),
        additives: Some(vec![]),
    }
}

pub fn report(score: f64) -> HealthReport {
    HealthReport {
        score,
        verdict: "Moderate".to_string(),
        warnings: vec![HealthWarning {
            ingredient: "salt".to_string(),
            risk: "Raises blood pressure".to_string(),
            severity: Some("medium".to_string()),
            ..Default::default()
        }],
        summary: "Fine in moderation".to_string(),
        ..Default::default()
    }
}

pub fn meal() -> MealAnalysis {
    MealAnalysis {
        food_items: vec![FoodItem {
            name: "rice".to_string(),
            quantity: "1 cup".to_string(),
            calories: 200.0,
            ..Default::default()
        }],
        total_calories: 200.0,
        meal_summary: "A bowl of rice".to_string(),
        ..Default::default()
    }
}

/// Returns a fixed extraction per image payload.
#[derive(Default)]
pub struct FakeExtractor {
    pub by_image: HashMap<String, Extraction>,
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn with(mut self, label: &str, extraction: Extraction) -> Self {
        self.by_image.insert(image_of(label), extraction);
        self
    }
}

#[async_trait]
impl LabelExtractor for FakeExtractor {
    async fn extract_from_image(&self, image: &DecodedImage) -> Result<Completion<Extraction>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let value = self.by_image.get(&image.base64).cloned().unwrap_or_default();
        Ok(Completion {
            value,
            model: "fake-vision".to_string(),
            total_tokens: 100,
        })
    }
}

/// Counts health analyses; optionally fails every call.
#[derive(Default)]
pub struct FakeHealth {
    pub calls: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl HealthAnalyzer for FakeHealth {
    fn model(&self) -> &str {
        HEALTH_MODEL
    }

    async fn analyze_health(&self, extraction: &Extraction, _profile: &UserProfile) -> Result<Completion<HealthReport>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::HealthAnalysis("Health service returned HTTP 503".to_string()));
        }
        Ok(Completion {
            value: report(extraction.ingredients.len() as f64 + n as f64),
            model: HEALTH_MODEL.to_string(),
            total_tokens: 250,
        })
    }
}

#[derive(Default)]
pub struct FakeMeal {
    pub calls: AtomicUsize,
}

#[async_trait]
impl MealAnalyzer for FakeMeal {
    async fn analyze_meal(&self, _image: &DecodedImage) -> Result<Completion<MealAnalysis>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Completion {
            value: meal(),
            model: "fake-meal".to_string(),
            total_tokens: 300,
        })
    }
}

/// Always detects French; counts calls.
#[derive(Default)]
pub struct FakeDetector {
    pub calls: AtomicUsize,
}

#[async_trait]
impl LanguageDetector for FakeDetector {
    async fn detect_language(&self, _text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("fr".to_string())
    }
}

#[derive(Default)]
pub struct FakeSpeech;

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn generate_speech(&self, text: &str, _language: &str) -> Result<Bytes> {
        Ok(Bytes::from(format!("ID3{}", text)))
    }
}

/// Handles on the fakes so tests can count upstream calls.
pub struct Fakes {
    pub extractor: Arc<FakeExtractor>,
    pub health: Arc<FakeHealth>,
    pub meal: Arc<FakeMeal>,
    pub detector: Arc<FakeDetector>,
}

impl Fakes {
    pub fn new(extractor: FakeExtractor, health: FakeHealth) -> Self {
        Self {
            extractor: Arc::new(extractor),
            health: Arc::new(health),
            meal: Arc::new(FakeMeal::default()),
            detector: Arc::new(FakeDetector::default()),
        }
    }

    pub fn collaborators(&self, with_speech: bool) -> Collaborators {
        Collaborators {
            extractor: self.extractor.clone(),
            health: self.health.clone(),
            meal: self.meal.clone(),
            language: self.detector.clone(),
            localizer: Arc::new(TaggingLocalizer),
            speech: if with_speech {
                Some(Arc::new(FakeSpeech) as Arc<dyn SpeechSynthesizer>)
            } else {
                None
            },
        }
    }

    pub fn health_calls(&self) -> usize {
        self.health.calls.load(Ordering::SeqCst)
    }

    pub fn meal_calls(&self) -> usize {
        self.meal.calls.load(Ordering::SeqCst)
    }

    pub fn detector_calls(&self) -> usize {
        self.detector.calls.load(Ordering::SeqCst)
    }
}

/// The three labels used across tests: A and B are the same product read
/// twice (140 vs 145 kcal), C is unrelated.
pub fn standard_extractor() -> FakeExtractor {
    FakeExtractor::default()
        .with("label-a", extraction(&["wheat flour", "sugar", "salt"], 140.0, 200.0))
        .with("label-b", extraction(&["Wheat Flour", "sugar ", "salt"], 145.0, 200.0))
        .with("label-c", extraction(&["chicken", "rice", "soy sauce"], 520.0, 900.0))
}

pub fn pipeline(fakes: &Fakes, with_speech: bool) -> AnalysisPipeline {
    AnalysisPipeline::new(
        fakes.collaborators(with_speech),
        Arc::new(LlmResponseCache::new(LlmCacheConfig::default())),
        Arc::new(CacheManager::new(CacheConfig::default())),
        Arc::new(PerformanceMonitor::new()),
    )
}
