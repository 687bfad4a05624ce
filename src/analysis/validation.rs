// Extraction quality checks
// Author: kelexine (https://github.com/kelexine)

use crate::cache::round_to;
use crate::models::{Extraction, Nutrient};

/// Fields whose presence makes up the confidence score.
const SCORED_FIELDS: f64 = 5.0;

/// Least confidence an extraction needs to be analysed (2 of 5 fields).
pub const MIN_CONFIDENCE: f64 = 0.4;

/// Outcome of checking an extraction before health analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionValidation {
    pub valid: bool,
    /// Share of scored fields present, rounded to 2 decimals.
    pub confidence: f64,
    pub errors: Vec<String>,
}

/// Score how completely the label was read.
///
/// Confidence counts five fields: a non-empty ingredient list, a nutrition
/// table, a serving size, an additives list and a calorie value. A field the
/// model sent as `null` counts as absent. Unreadable or negative nutrient
/// values are reported but do not lower confidence.
pub fn validate_extraction(extraction: &Extraction) -> ExtractionValidation {
    let mut errors = Vec::new();
    let mut present = 0u32;

    if extraction.ingredients.iter().any(|i| !i.trim().is_empty()) {
        present += 1;
    } else {
        errors.push("Missing or empty ingredients list.".to_string());
    }

    match &extraction.nutrition {
        Some(_) => {
            present += 1;
            for nutrient in Nutrient::COMPARED {
                let Some(value) = extraction.nutrient_value(nutrient) else {
                    continue;
                };
                if value.as_f64().map_or(true, |v| v < 0.0) {
                    errors.push(format!("Invalid value for nutrition.{}: {}", nutrient.json_name(), value));
                }
            }
        }
        None => errors.push("Missing nutrition data.".to_string()),
    }

    let serving_size = extraction.nutrition.as_ref().and_then(|n| n.serving_size.as_ref());
    if serving_size.is_some_and(|s| !s.is_blank()) {
        present += 1;
    } else {
        errors.push("Missing serving size.".to_string());
    }

    if extraction.additives.is_some() {
        present += 1;
    }

    if extraction.nutrient_value(Nutrient::Calories).is_some() {
        present += 1;
    }

    let confidence = present as f64 / SCORED_FIELDS;
    ExtractionValidation {
        valid: confidence >= MIN_CONFIDENCE,
        confidence: round_to(confidence, 2),
        errors,
    }
}
