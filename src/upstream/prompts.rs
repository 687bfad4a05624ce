// Prompt templates for the upstream models
// Author: kelexine (https://github.com/kelexine)

use crate::models::{Extraction, UserProfile};

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are NutraLingo's food label analysis engine. \
You receive a photo of a food product label, possibly in any language. Read all text on the label, \
extract the ingredient list, the nutrition facts table and any food additives (E-codes), and return \
ONLY a valid JSON object with no explanations and no markdown. Translate ingredient names on foreign \
labels to English while keeping scientific and chemical names.";

pub const EXTRACTION_PROMPT: &str = r#"Extract structured nutrition data from this food label.

Rules:
1. List ALL ingredients as an array of strings.
2. Parse the nutrition facts table into the fields below.
3. List food additives, including their E-codes (E621, E330, ...).
4. Keep numeric values with their units ("480mg", "5g"); calories may be a plain number.
5. If a value is not clearly readable, use null. Never guess.
6. The serving size includes both amount and unit.

Respond with JSON in exactly this schema:
{
  "ingredients": ["ingredient1", "ingredient2"],
  "nutrition": {
    "servingSize": "30g",
    "calories": 140,
    "totalFat": "5g",
    "saturatedFat": "2g",
    "transFat": "0g",
    "cholesterol": "0mg",
    "sodium": "480mg",
    "totalCarbohydrates": "20g",
    "dietaryFiber": "1g",
    "totalSugars": "8g",
    "protein": "2g"
  },
  "additives": ["E621 (Monosodium glutamate)"]
}"#;

pub const HEALTH_REASONING_PROMPT: &str = r#"You are NutraLingo's health reasoning engine. Given structured nutrition data and a user's health profile:

1. Compute a health score from 0 (very unhealthy) to 10 (very healthy).
2. Flag these risks:
   - HIGH_SODIUM: sodium above 400mg per serving
   - HIDDEN_SUGAR: total sugars above 6g per serving, or sugar variants (high fructose corn syrup, maltodextrin, dextrose, sucrose, agave)
   - TRANS_FAT: any trans fat above 0g
   - SATURATED_FAT: saturated fat above 3g per serving
   - ADDITIVE: any E-coded additive
   - HIGH_CALORIES: more than 250 calories per serving
3. Adapt severity to the profile: "hypertension" raises sodium and saturated fat warnings,
   "diabetes" raises sugar and carbohydrate warnings, "general" uses standard thresholds.
4. Write a 2-3 sentence summary.

Scoring: start at 10, subtract 2 per high, 1 per medium and 0.5 per low severity warning, never below 0.
Verdicts: 0-2 "Very Poor", 2-4 "Poor", 4-6 "Moderate", 6-8 "Good", 8-10 "Excellent".

Respond with ONLY valid JSON:
{
  "score": 3.5,
  "verdict": "Poor",
  "warnings": [
    {"type": "HIGH_SODIUM", "ingredient": "salt / sodium 480mg", "risk": "Exceeds recommended intake for hypertension", "severity": "high"}
  ],
  "summary": "High sodium and trans fats. Not recommended for hypertension."
}"#;

pub const MEAL_ANALYSIS_PROMPT: &str = r#"You are a professional nutritionist. Analyze this photo of a meal.

Identify every distinct food item. For each, estimate name, quantity ("1 cup", "150g"),
calories, and protein, carbs and fat in grams. Base portions on visual cues and standard
nutrition databases such as USDA. Totals must equal the sum of the items.

Respond with ONLY valid JSON, no code fences:
{
  "foodItems": [{"name": "string", "quantity": "string", "calories": 0, "protein": 0, "carbs": 0, "fat": 0}],
  "totalCalories": 0,
  "totalProtein": 0,
  "totalCarbs": 0,
  "totalFat": 0,
  "mealSummary": "1-2 sentence summary of the meal and its nutrition"
}"#;

pub const LANGUAGE_DETECTION_PROMPT: &str = r#"Identify the language of the text the user sends.
Respond with ONLY JSON: {"locale": "<ISO 639-1 code>"}. Use "unknown" if you cannot tell."#;

pub const LOCALIZATION_SYSTEM_PROMPT: &str = "You translate nutrition health reports for a consumer app. \
Preserve the medical meaning and an informative tone at a general literacy level. Keep units and \
abbreviations (mg, g, kcal, DV, %) unchanged. Return JSON with exactly the same structure and the \
same number of warnings as the input.";

/// User message for the health reasoning call.
pub fn health_user_prompt(extraction: &Extraction, profile: &UserProfile) -> String {
    let extraction_json = serde_json::to_string_pretty(extraction).unwrap_or_default();
    format!(
        "Analyze this food label extraction for health impact:\n\n{}\n\nUser health conditions: {}\n\n\
         Return a JSON health report with: score (0-10), verdict, warnings array, and summary.",
        extraction_json,
        profile.effective_conditions().join(", ")
    )
}

/// User message for report localization.
pub fn localization_user_prompt(texts_json: &str, language_name: &str, profile: &UserProfile) -> String {
    format!(
        "Translate the text fields of this JSON into {}. The reader's health conditions: {}.\n\n{}",
        language_name,
        profile.effective_conditions().join(", "),
        texts_json
    )
}
