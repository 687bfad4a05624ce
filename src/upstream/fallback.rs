// Offline stand-ins used when no translation endpoint is configured
// Author: kelexine (https://github.com/kelexine)

use super::{LanguageDetector, ReportLocalizer};
use crate::error::Result;
use crate::models::{language_name, HealthReport, LocalizedReport, UserProfile};
use async_trait::async_trait;

/// True for target languages that need no translation.
pub fn is_english(target_language: &str) -> bool {
    target_language.eq_ignore_ascii_case("en") || target_language.to_ascii_lowercase().starts_with("en-")
}

/// The report unchanged, labelled as English.
pub fn english_report(report: &HealthReport) -> LocalizedReport {
    LocalizedReport {
        localized_report: report.clone(),
        language: "en".to_string(),
        language_name: "English".to_string(),
    }
}

/// Marks every user-facing string with a `[lang] ` prefix instead of translating.
///
/// Lets the front end exercise its localized layout without a translation
/// provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaggingLocalizer;

#[async_trait]
impl ReportLocalizer for TaggingLocalizer {
    async fn localize_report(
        &self,
        report: &HealthReport,
        target_language: &str,
        _profile: &UserProfile,
    ) -> Result<LocalizedReport> {
        if is_english(target_language) {
            return Ok(english_report(report));
        }

        let tag = |text: &str| format!("[{}] {}", target_language, text);
        let mut localized = report.clone();
        localized.verdict = tag(&report.verdict);
        localized.summary = tag(&report.summary);
        for warning in &mut localized.warnings {
            warning.ingredient = tag(&warning.ingredient);
            warning.risk = tag(&warning.risk);
        }

        Ok(LocalizedReport {
            localized_report: localized,
            language: target_language.to_string(),
            language_name: language_name(target_language),
        })
    }
}

/// Reports every text as `"unknown"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnknownLanguageDetector;

#[async_trait]
impl LanguageDetector for UnknownLanguageDetector {
    async fn detect_language(&self, _text: &str) -> Result<String> {
        Ok("unknown".to_string())
    }
}
