//! Structured logging and security-focused trace utilities.
//!
//! This module configures the `tracing` ecosystem for the application,
//! supporting multiple output formats and providing utilities to prevent
//! upstream API keys from leaking into logs.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

lazy_static! {
    /// OpenAI (`sk-...`, `sk-proj-...`), Groq (`gsk_...`) and Google (`AIza...`) keys.
    static ref API_KEY_PATTERN: Regex =
        Regex::new(r"\b(sk-[A-Za-z0-9_\-]{8,}|gsk_[A-Za-z0-9]{8,}|AIza[0-9A-Za-z_\-]{20,})").unwrap();

    /// `Authorization: Bearer <token>` fragments echoed back by upstream errors.
    static ref BEARER_PATTERN: Regex = Regex::new(r"(?i)bearer\s+[A-Za-z0-9._\-]{8,}").unwrap();
}

static SANITIZE_ENABLED: AtomicBool = AtomicBool::new(true);

/// Initializes the global tracing subscriber for the application.
///
/// Supports two output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `pretty` (default): Human-readable, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    // Configure filter from environment or config file
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    SANITIZE_ENABLED.store(config.sanitize_tokens, Ordering::Relaxed);

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Sanitizes API keys from upstream error bodies before they are logged.
///
/// Scans for the key formats of the providers this service talks to and for
/// bearer tokens, replacing each match with a `\[REDACTED\]` placeholder.
/// Returns the input unchanged when sanitization is disabled in config.
pub fn sanitize(input: &str) -> String {
    if !SANITIZE_ENABLED.load(Ordering::Relaxed) {
        return input.to_string();
    }
    redact(input)
}

fn redact(input: &str) -> String {
    let without_keys = API_KEY_PATTERN.replace_all(input, "[REDACTED_API_KEY]");
    BEARER_PATTERN
        .replace_all(&without_keys, "Bearer [REDACTED_TOKEN]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_openai_key() {
        let input = "Incorrect API key provided: sk-proj-abc123DEF456ghi789";
        let output = redact(input);
        assert!(output.contains("[REDACTED_API_KEY]"));
        assert!(!output.contains("abc123DEF456"));
    }

    #[test]
    fn test_redact_groq_key_and_bearer() {
        let input = "key=gsk_0123456789abcdef header: Bearer eyJhbGciOiJIUzI1NiJ9.payload";
        let output = redact(input);
        assert!(!output.contains("gsk_0123456789abcdef"));
        assert!(output.contains("Bearer [REDACTED_TOKEN]"));
    }

    #[test]
    fn test_plain_text_untouched() {
        let input = "Rate limit reached for model gpt-4o";
        assert_eq!(redact(input), input);
    }
}
