//! Structured food label extraction types.
//!
//! These mirror the JSON object the vision extraction step returns. Every
//! field is optional because upstream models regularly omit or null out
//! values they cannot read, and numeric nutrition values arrive either as
//! bare numbers (`140`) or as unit-suffixed strings (`"480mg"`).

// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

lazy_static! {
    /// Leading numeric literal, the way a label reader would read "480mg".
    static ref LEADING_NUMBER: Regex = Regex::new(r"^\s*[-+]?(\d+(\.\d*)?|\.\d+)").unwrap();
}

/// Structured ingredient and nutrition data parsed from a food label image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    /// Ingredient list in label order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<String>,

    /// Nutrition facts table.
    #[serde(default)]
    pub nutrition: Option<Nutrition>,

    /// Food additives (E-codes) spotted on the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additives: Option<Vec<String>>,
}

/// Nutrition facts table of an [`Extraction`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_fat: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturated_fat: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trans_fat: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cholesterol: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_carbohydrates: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_fiber: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_sugars: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<NutrientValue>,
}

/// A nutrition value as printed on the label.
///
/// Kept in its original form so responses echo what was read, while
/// [`NutrientValue::as_f64`] gives the numeric reading used for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NutrientValue {
    Number(f64),
    Text(String),
}

impl NutrientValue {
    /// Numeric reading of the value, or `None` if nothing numeric leads it.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NutrientValue::Number(n) if n.is_finite() => Some(*n),
            NutrientValue::Number(_) => None,
            NutrientValue::Text(s) => LEADING_NUMBER
                .find(s)
                .and_then(|m| m.as_str().trim().parse::<f64>().ok()),
        }
    }

    /// True if the printed value has no readable content.
    pub fn is_blank(&self) -> bool {
        match self {
            NutrientValue::Number(_) => false,
            NutrientValue::Text(s) => s.trim().is_empty(),
        }
    }
}

impl From<f64> for NutrientValue {
    fn from(value: f64) -> Self {
        NutrientValue::Number(value)
    }
}

impl From<&str> for NutrientValue {
    fn from(value: &str) -> Self {
        NutrientValue::Text(value.to_string())
    }
}

impl fmt::Display for NutrientValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NutrientValue::Number(n) => write!(f, "{}", n),
            NutrientValue::Text(s) => f.write_str(s),
        }
    }
}

/// The nutrients compared when scoring similarity between two extractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nutrient {
    Calories,
    Sodium,
    TotalSugars,
    TotalFat,
    Protein,
}

impl Nutrient {
    pub const COMPARED: [Nutrient; 5] = [
        Nutrient::Calories,
        Nutrient::Sodium,
        Nutrient::TotalSugars,
        Nutrient::TotalFat,
        Nutrient::Protein,
    ];

    /// Field name in the extraction JSON.
    pub fn json_name(self) -> &'static str {
        match self {
            Nutrient::Calories => "calories",
            Nutrient::Sodium => "sodium",
            Nutrient::TotalSugars => "totalSugars",
            Nutrient::TotalFat => "totalFat",
            Nutrient::Protein => "protein",
        }
    }
}

impl Extraction {
    /// Numeric reading of one nutrient; absent, null or unreadable is 0.
    pub fn nutrient(&self, nutrient: Nutrient) -> f64 {
        self.nutrient_value(nutrient)
            .and_then(NutrientValue::as_f64)
            .unwrap_or(0.0)
    }

    /// The value as printed, if the label had one.
    pub fn nutrient_value(&self, nutrient: Nutrient) -> Option<&NutrientValue> {
        let nutrition = self.nutrition.as_ref()?;
        match nutrient {
            Nutrient::Calories => nutrition.calories.as_ref(),
            Nutrient::Sodium => nutrition.sodium.as_ref(),
            Nutrient::TotalSugars => nutrition.total_sugars.as_ref(),
            Nutrient::TotalFat => nutrition.total_fat.as_ref(),
            Nutrient::Protein => nutrition.protein.as_ref(),
        }
    }

    /// Ingredients joined for language detection.
    pub fn ingredient_text(&self) -> String {
        self.ingredients.join(", ")
    }
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nutrient_value_parsing() {
        assert_eq!(NutrientValue::from(140.0).as_f64(), Some(140.0));
        assert_eq!(NutrientValue::from("480mg").as_f64(), Some(480.0));
        assert_eq!(NutrientValue::from(" 2.5 g").as_f64(), Some(2.5));
        assert_eq!(NutrientValue::from("trace").as_f64(), None);
        assert_eq!(NutrientValue::from("").as_f64(), None);
    }

    #[test]
    fn test_extraction_tolerates_nulls_and_strings() {
        let extraction: Extraction = serde_json::from_value(json!({
            "ingredients": null,
            "nutrition": {
                "servingSize": "30g",
                "calories": 140,
                "sodium": "480mg",
                "totalSugars": null
            }
        }))
        .unwrap();

        assert!(extraction.ingredients.is_empty());
        assert_eq!(extraction.nutrient(Nutrient::Calories), 140.0);
        assert_eq!(extraction.nutrient(Nutrient::Sodium), 480.0);
        assert_eq!(extraction.nutrient(Nutrient::TotalSugars), 0.0);
        assert_eq!(extraction.nutrient(Nutrient::Protein), 0.0);
    }

    #[test]
    fn test_missing_nutrition_reads_zero() {
        let extraction = Extraction {
            ingredients: vec!["water".to_string()],
            ..Default::default()
        };
        for nutrient in Nutrient::COMPARED {
            assert_eq!(extraction.nutrient(nutrient), 0.0);
        }
    }
}
