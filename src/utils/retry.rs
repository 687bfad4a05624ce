// Retry logic with Retry-After and "try again in" hint support
// Author: kelexine (https://github.com/kelexine)

use backoff::{backoff::Backoff, ExponentialBackoff};
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use tracing::debug;

/// Longest wait honoured from an upstream hint.
const MAX_HINT_SECS: f64 = 60.0;

lazy_static! {
    // OpenAI and Groq rate-limit bodies: "Please try again in 1.5s" / "in 820ms"
    static ref TRY_AGAIN_PATTERN: Regex =
        Regex::new(r"(?i)try again in (\d+(?:\.\d+)?)(ms|s)\b").unwrap();
}

/// A failed upstream attempt as seen by the retry loop.
#[derive(Debug, Clone)]
pub struct UpstreamFailure {
    /// HTTP status, or 0 when the request never got a response.
    pub status: u16,
    pub body: String,
    /// Parsed `Retry-After` header, if the upstream sent one.
    pub retry_after: Option<Duration>,
}

impl UpstreamFailure {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }

    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }
}

/// Parse a `Retry-After` header value given in seconds ("3", "1.5").
/// HTTP-date values are ignored. Capped at 60 seconds.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let seconds: f64 = value.trim().parse().ok()?;
    to_capped_duration(seconds)
}

/// Parse the wait hint embedded in a rate-limit error body.
pub fn parse_retry_hint(error_body: &str) -> Option<Duration> {
    let caps = TRY_AGAIN_PATTERN.captures(error_body)?;
    let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
    let seconds = match caps.get(2)?.as_str().to_ascii_lowercase().as_str() {
        "ms" => amount / 1000.0,
        _ => amount,
    };
    to_capped_duration(seconds)
}

fn to_capped_duration(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let millis = (seconds.min(MAX_HINT_SECS) * 1000.0) as u64;
    Some(Duration::from_millis(millis))
}

/// Create exponential backoff configuration for retries
pub fn create_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: Duration::from_millis(500),     // Start at 500ms
        initial_interval: Duration::from_millis(500),
        randomization_factor: 0.3,                        // Add jitter
        multiplier: 2.0,                                  // Double each time
        max_interval: Duration::from_secs(10),            // Cap at 10s
        max_elapsed_time: Some(Duration::from_secs(60)),  // Give up after a minute
        ..Default::default()
    }
}

/// Determine if an HTTP status code is retryable
pub fn is_retryable(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Execute an upstream call with retry logic
/// - Uses the upstream's Retry-After header or body hint if available
/// - Falls back to exponential backoff
/// - Gives up after `max_attempts` attempts or on a non-retryable status
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    max_attempts: u32,
    mut operation: F,
) -> Result<T, UpstreamFailure>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, UpstreamFailure>>,
{
    let max_attempts = max_attempts.max(1);
    let mut backoff = create_backoff();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(failure) => {
                if !is_retryable(failure.status) || attempt >= max_attempts {
                    return Err(failure);
                }

                let hinted = failure.retry_after.or_else(|| parse_retry_hint(&failure.body));
                let delay = match hinted {
                    Some(hint) => {
                        debug!(
                            "{} failed with {} (attempt {}), upstream suggests waiting {}ms",
                            operation_name,
                            failure.status,
                            attempt,
                            hint.as_millis()
                        );
                        hint
                    }
                    None => {
                        let backoff_delay = backoff.next_backoff().unwrap_or(Duration::from_secs(10));
                        debug!(
                            "{} failed with {} (attempt {}), retrying after {}ms",
                            operation_name,
                            failure.status,
                            attempt,
                            backoff_delay.as_millis()
                        );
                        backoff_delay
                    }
                };

                tokio::time::sleep(delay).await;
            }
        }
    }
}
