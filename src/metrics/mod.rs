// Metrics module: in-process performance monitor plus Prometheus export
// Author: kelexine (https://github.com/kelexine)

mod monitor;
mod registry;

pub use monitor::{
    ApiCall, HealthCheck, LlmCall, LlmUsage, MemoryUsage, MetricSeries, MetricStats, PerformanceDashboard,
    PerformanceMonitor, RequestRecord, Timer, DEFAULT_RECENT_REQUESTS, MAX_REQUEST_HISTORY, MAX_SAMPLES,
};
pub use registry::{
    gather_metrics,
    CACHE_ENTRIES,
    CACHE_OPERATIONS,
    LLM_CALLS,
    OPERATION_DURATION,
    REQUESTS_TOTAL,
    REQUEST_DURATION,
    TOKENS_TOTAL,
    UPSTREAM_ERRORS,
};

/// Helper to record request metrics
pub fn record_request(method: &str, endpoint: &str, status_code: u16, duration_secs: f64) {
    REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status_code.to_string()])
        .inc();

    REQUEST_DURATION
        .with_label_values(&[method, endpoint])
        .observe(duration_secs);
}

/// Helper to record a timed operation
pub fn record_operation(operation: &str, failed: bool, duration_secs: f64) {
    let outcome = if failed { "failed" } else { "ok" };
    OPERATION_DURATION
        .with_label_values(&[operation, outcome])
        .observe(duration_secs);
}

/// Helper to record LLM call metrics
pub fn record_llm_call(model: &str, cache_hit: bool, total_tokens: u64) {
    LLM_CALLS
        .with_label_values(&[model, &cache_hit.to_string()])
        .inc();
    if total_tokens > 0 {
        TOKENS_TOTAL
            .with_label_values(&[model])
            .inc_by(total_tokens as f64);
    }
}

/// Helper to record cache operations (`response` or `llm` cache)
pub fn record_cache_operation(cache: &str, operation: &str) {
    CACHE_OPERATIONS.with_label_values(&[cache, operation]).inc();
}

pub fn update_cache_entries(cache: &str, count: usize) {
    CACHE_ENTRIES.with_label_values(&[cache]).set(count as f64);
}

/// Helper to record failed upstream calls
pub fn record_upstream_error(service: &str) {
    UPSTREAM_ERRORS.with_label_values(&[service]).inc();
}
