//! Data models for the analysis API.
//!
//! This module contains the type definitions used across the service:
//! - Label extraction types (`nutrition`)
//! - Health reports, meal analyses and user profiles (`report`)
//! - REST request/response bodies (`api`)
//! - Language display names (`languages`)

// Author: kelexine (https://github.com/kelexine)

pub mod api;
pub mod languages;
pub mod nutrition;
pub mod report;

pub use api::{
    AnalysisPerformance, AnalyzeRequest, AnalyzeResponse, KeyPatternQuery, LocalizeRequest, MealRequest, MealResponse,
    TtsRequest,
};
pub use languages::language_name;
pub use nutrition::{Extraction, Nutrient, NutrientValue, Nutrition};
pub use report::{FoodItem, HealthReport, HealthWarning, LocalizedReport, MealAnalysis, UserProfile};
