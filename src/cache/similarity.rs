//! Nutrition profile normalization and similarity scoring.
//!
//! Two scanned labels of the same product rarely produce identical
//! extractions: OCR noise changes casing and whitespace, and models round
//! nutrition values differently. This module provides the two views the
//! LLM response cache needs:
//!
//! - [`NutritionProfile`] / [`generate_hash`]: a bucketed, order-independent
//!   form of an extraction, hashed into a short storage key.
//! - [`calculate_similarity`]: a weighted score in `[0, 1]` used to decide
//!   whether a cached analysis is close enough to reuse.

// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::BucketConfig;
use crate::models::{Extraction, Nutrient};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashSet};

/// Weight of the ingredient overlap component.
pub const INGREDIENT_WEIGHT: f64 = 0.4;
/// Weight of the nutrient closeness component.
pub const NUTRIENT_WEIGHT: f64 = 0.6;

/// Length of the truncated hex storage hash.
const HASH_LEN: usize = 16;

/// Normalized form of an extraction used as a storage key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionProfile {
    pub ingredients: BTreeSet<String>,
    pub nutrition: BucketedNutrition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketedNutrition {
    pub calories: f64,
    pub sodium: f64,
    pub sugar: f64,
    pub fat: f64,
    pub protein: f64,
}

impl NutritionProfile {
    /// Derive the profile of an extraction with the given bucket sizes.
    pub fn from_extraction(extraction: &Extraction, buckets: &BucketConfig) -> Self {
        Self {
            ingredients: extraction.ingredients.iter().map(|i| normalize_ingredient(i)).collect(),
            nutrition: BucketedNutrition {
                calories: bucket(extraction.nutrient(Nutrient::Calories), buckets.calories),
                sodium: bucket(extraction.nutrient(Nutrient::Sodium), buckets.sodium),
                sugar: bucket(extraction.nutrient(Nutrient::TotalSugars), buckets.sugar),
                fat: bucket(extraction.nutrient(Nutrient::TotalFat), buckets.fat),
                protein: bucket(extraction.nutrient(Nutrient::Protein), buckets.protein),
            },
        }
    }
}

/// Short SHA256 storage key of an extraction's normalized profile.
///
/// Stable under ingredient reordering and case/whitespace changes, and under
/// nutrition changes that stay inside the same bucket.
pub fn generate_hash(extraction: &Extraction, buckets: &BucketConfig) -> String {
    let profile = NutritionProfile::from_extraction(extraction, buckets);
    // BTreeSet and plain structs serialize deterministically
    let serialized = serde_json::to_string(&profile).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    let mut hash = hex::encode(hasher.finalize());
    hash.truncate(HASH_LEN);
    hash
}

/// Weighted similarity of two extractions in `[0, 1]`.
///
/// - 0.4 × ingredient overlap: shared normalized ingredients divided by the
///   average set size (0 when both lists are empty).
/// - 0.6 × mean nutrient closeness over calories, sodium, sugars, fat and
///   protein, each `max(0, 1 - |a - b| / max(a, b, 1))`.
///
/// Missing values read as 0, so they count as close to other missing or
/// zero values and far from anything substantial.
pub fn calculate_similarity(a: &Extraction, b: &Extraction) -> f64 {
    let score = INGREDIENT_WEIGHT * ingredient_overlap(a, b) + NUTRIENT_WEIGHT * nutrient_closeness(a, b);

    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// `|A ∩ B| / avg(|A|, |B|)` over normalized ingredient sets.
pub fn ingredient_overlap(a: &Extraction, b: &Extraction) -> f64 {
    let set_a = ingredient_set(a);
    let set_b = ingredient_set(b);

    let avg_len = (set_a.len() + set_b.len()) as f64 / 2.0;
    if avg_len == 0.0 {
        return 0.0;
    }

    let overlap = set_a.intersection(&set_b).count() as f64;
    overlap / avg_len
}

/// Mean relative closeness of the compared nutrients.
pub fn nutrient_closeness(a: &Extraction, b: &Extraction) -> f64 {
    let total: f64 = Nutrient::COMPARED
        .iter()
        .map(|&nutrient| relative_closeness(a.nutrient(nutrient), b.nutrient(nutrient)))
        .sum();
    total / Nutrient::COMPARED.len() as f64
}

fn relative_closeness(a: f64, b: f64) -> f64 {
    let max_val = a.max(b).max(1.0);
    let diff = (a - b).abs() / max_val;
    (1.0 - diff).max(0.0)
}

fn ingredient_set(extraction: &Extraction) -> HashSet<String> {
    extraction.ingredients.iter().map(|i| normalize_ingredient(i)).collect()
}

fn normalize_ingredient(ingredient: &str) -> String {
    ingredient.trim().to_lowercase()
}

fn bucket(value: f64, granularity: f64) -> f64 {
    if granularity <= 0.0 || !granularity.is_finite() {
        return value;
    }
    (value / granularity).round() * granularity
}
