// Display names for supported report languages
// Author: kelexine (https://github.com/kelexine)

use phf::phf_map;

/// ISO 639-1 code → English display name
static LANGUAGE_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "en" => "English",
    "hi" => "Hindi",
    "es" => "Spanish",
    "mr" => "Marathi",
    "ta" => "Tamil",
    "te" => "Telugu",
    "bn" => "Bengali",
    "fr" => "French",
    "de" => "German",
    "ja" => "Japanese",
    "zh" => "Chinese",
    "ar" => "Arabic",
    "ko" => "Korean",
};

/// Display name for a language code, falling back to the code itself.
///
/// Region suffixes are ignored, so `es-MX` resolves like `es`.
pub fn language_name(code: &str) -> String {
    let base = code.split(['-', '_']).next().unwrap_or(code).to_lowercase();
    LANGUAGE_NAMES
        .get(base.as_str())
        .map(|name| name.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// True if a display name is known for this code.
pub fn is_supported(code: &str) -> bool {
    let base = code.split(['-', '_']).next().unwrap_or(code).to_lowercase();
    LANGUAGE_NAMES.contains_key(base.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_languages() {
        assert_eq!(language_name("hi"), "Hindi");
        assert_eq!(language_name("es-MX"), "Spanish");
        assert_eq!(language_name("ZH"), "Chinese");
    }

    #[test]
    fn test_unknown_language_falls_back_to_code() {
        assert_eq!(language_name("xx"), "xx");
        assert!(!is_supported("xx"));
        assert!(is_supported("en"));
    }
}
