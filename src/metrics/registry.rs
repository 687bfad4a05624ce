// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec_with_registry, register_gauge_vec_with_registry, register_histogram_vec_with_registry,
    CounterVec, Encoder, GaugeVec, HistogramVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // REQUEST METRICS
    // ============================================================================

    /// Total number of API requests
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("requests_total", "Total number of API requests"),
        &["method", "endpoint", "status_code"],
        REGISTRY
    ).unwrap();

    /// Request duration histogram
    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("request_duration_seconds", "Request duration in seconds")
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["method", "endpoint"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // OPERATION METRICS
    // ============================================================================

    /// Duration of timed sub-operations (cache lookups, upstream calls)
    pub static ref OPERATION_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("operation_duration_seconds", "Timed operation duration in seconds")
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["operation", "outcome"], // outcome: ok, failed
        REGISTRY
    ).unwrap();

    // ============================================================================
    // LLM METRICS
    // ============================================================================

    /// LLM calls, split by whether the response cache served them
    pub static ref LLM_CALLS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("llm_calls_total", "Total LLM analysis calls"),
        &["model", "cache_hit"],
        REGISTRY
    ).unwrap();

    /// Total tokens consumed
    pub static ref TOKENS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("tokens_total", "Total tokens processed"),
        &["model"],
        REGISTRY
    ).unwrap();

    /// Failed upstream calls
    pub static ref UPSTREAM_ERRORS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("upstream_errors_total", "Total failed upstream service calls"),
        &["service"], // service: vision, health, meal, localization, language, tts
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CACHE METRICS
    // ============================================================================

    /// Cache operations
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("cache_operations_total", "Total cache operations"),
        &["cache", "operation"], // cache: response, llm; operation: hit, miss, eviction
        REGISTRY
    ).unwrap();

    /// Current cache entries
    pub static ref CACHE_ENTRIES: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new("cache_entries_current", "Current number of cache entries"),
        &["cache"],
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode Prometheus metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // Touch each vector so the families appear in the output
        REQUESTS_TOTAL.with_label_values(&["GET", "/api/health", "200"]).inc();
        CACHE_OPERATIONS.with_label_values(&["llm", "hit"]).inc();
        TOKENS_TOTAL.with_label_values(&["test-model"]).inc_by(10.0);

        let metrics = gather_metrics();
        assert!(metrics.contains("requests_total"));
        assert!(metrics.contains("cache_operations_total"));
        assert!(metrics.contains("tokens_total"));
    }
}
