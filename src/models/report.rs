//! Health report, meal analysis and user profile types.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Scored verdict produced by reasoning over an extraction and a user profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Health score from 0 (avoid) to 10 (excellent).
    #[serde(default)]
    pub score: f64,

    #[serde(default)]
    pub verdict: String,

    #[serde(default)]
    pub warnings: Vec<HealthWarning>,

    #[serde(default)]
    pub summary: String,

    /// Any additional fields the reasoning model returned (alternatives, notes...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single ingredient-level warning inside a [`HealthReport`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthWarning {
    #[serde(default)]
    pub ingredient: String,

    #[serde(default)]
    pub risk: String,

    /// `high`, `medium` or `low`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// User health profile sent alongside a label image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Health conditions such as `diabetes` or `hypertension`.
    #[serde(default)]
    pub conditions: Vec<String>,

    /// Preferred display language (ISO code).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl UserProfile {
    /// Conditions to reason about; `general` when the user gave none.
    pub fn effective_conditions(&self) -> Vec<String> {
        if self.conditions.is_empty() {
            vec!["general".to_string()]
        } else {
            self.conditions.clone()
        }
    }
}

/// Identified food item in a meal photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
}

/// Nutritional breakdown of a meal photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAnalysis {
    #[serde(default)]
    pub food_items: Vec<FoodItem>,
    #[serde(default)]
    pub total_calories: f64,
    #[serde(default)]
    pub total_protein: f64,
    #[serde(default)]
    pub total_carbs: f64,
    #[serde(default)]
    pub total_fat: f64,
    #[serde(default)]
    pub meal_summary: String,
}

/// A health report translated into the user's language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedReport {
    pub localized_report: HealthReport,
    pub language: String,
    pub language_name: String,
}
