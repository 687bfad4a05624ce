//! In-process performance monitor.
//!
//! Tracks duration distributions per named operation and per HTTP endpoint
//! in bounded sliding windows, and derives dashboards, bottleneck reports
//! and health summaries from them. Every recording is mirrored into the
//! Prometheus collectors in [`super::registry`].
//!
//! Recording never fails: malformed durations (negative, NaN) are recorded
//! as zero rather than rejected.

// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::round_to;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;
use sysinfo::System;
use tokio::time::Instant;
use tracing::{debug, info};

/// Samples retained per operation series.
pub const MAX_SAMPLES: usize = 1000;
/// API calls retained in the request history.
pub const MAX_REQUEST_HISTORY: usize = 1000;
/// Default page size for [`PerformanceMonitor::get_recent_requests`].
pub const DEFAULT_RECENT_REQUESTS: usize = 50;

/// Sliding window of duration samples for one operation.
///
/// The running total is maintained on insert and evict, so the average is
/// a bounded-memory moving average over the most recent samples.
#[derive(Debug, Clone, Default)]
pub struct MetricSeries {
    samples: VecDeque<f64>,
    running_total: f64,
    failure_count: u64,
}

impl MetricSeries {
    pub fn record(&mut self, duration_ms: f64, failed: bool) {
        let duration_ms = sanitize_ms(duration_ms);
        self.samples.push_back(duration_ms);
        self.running_total += duration_ms;
        if failed {
            self.failure_count += 1;
        }

        if self.samples.len() > MAX_SAMPLES {
            if let Some(removed) = self.samples.pop_front() {
                self.running_total -= removed;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn running_total(&self) -> f64 {
        self.running_total
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// Summary statistics; nearest-rank percentiles over the sorted window.
    pub fn stats(&self, operation: &str) -> Option<MetricStats> {
        if self.samples.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let count = sorted.len();
        let rank = |p: f64| sorted[((count as f64 * p).floor() as usize).min(count - 1)];

        Some(MetricStats {
            operation: operation.to_string(),
            count,
            avg_ms: round_to(self.running_total / count as f64, 2),
            min_ms: sorted[0],
            max_ms: sorted[count - 1],
            p95: rank(0.95),
            p99: rank(0.99),
            failure_count: self.failure_count,
        })
    }
}

/// Summary of one [`MetricSeries`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricStats {
    pub operation: String,
    pub count: usize,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p95: f64,
    pub p99: f64,
    pub failure_count: u64,
}

/// An HTTP call to record.
#[derive(Debug, Clone)]
pub struct ApiCall {
    pub endpoint: String,
    pub method: String,
    pub status_code: u16,
    pub duration: Duration,
    pub size: u64,
}

/// A recorded HTTP call in the bounded request history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub method: String,
    pub status_code: u16,
    pub duration_ms: f64,
    pub size: u64,
}

/// An LLM call to record.
#[derive(Debug, Clone)]
pub struct LlmCall {
    pub model: String,
    pub total_tokens: u64,
    pub duration: Duration,
    pub cache_hit: bool,
}

/// Accumulated LLM usage per model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmUsage {
    pub calls: u64,
    pub total_tokens: u64,
    pub cache_hits: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    /// Resident set size of this process, if the platform reports it.
    pub rss_bytes: Option<u64>,
    pub rss_mb: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceDashboard {
    pub uptime: String,
    pub uptime_seconds: f64,
    pub total_requests: usize,
    pub operations: BTreeMap<String, MetricStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_response_time_ms: Option<f64>,
    pub responses_by_status: BTreeMap<u16, usize>,
    pub llm_usage: BTreeMap<String, LlmUsage>,
    pub memory_usage: MemoryUsage,
}

/// Condensed dashboard for liveness/readiness reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub status: &'static str,
    pub uptime: String,
    pub requests: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_response_ms: Option<f64>,
    pub responses_by_status: BTreeMap<u16, usize>,
    pub slowest_operations: Vec<MetricStats>,
    pub memory: MemoryUsage,
    pub timestamp: DateTime<Utc>,
}

struct MonitorState {
    series: HashMap<String, MetricSeries>,
    requests: VecDeque<RequestRecord>,
    llm_usage: HashMap<String, LlmUsage>,
    started_at: Instant,
}

impl MonitorState {
    fn new() -> Self {
        Self {
            series: HashMap::new(),
            requests: VecDeque::new(),
            llm_usage: HashMap::new(),
            started_at: Instant::now(),
        }
    }
}

/// Process-wide operation latency tracker.
///
/// Constructed once at startup and shared by handle; all methods take
/// `&self` and never block on I/O.
pub struct PerformanceMonitor {
    state: Mutex<MonitorState>,
    system: Mutex<System>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MonitorState::new()),
            system: Mutex::new(System::new()),
        }
    }

    /// Start timing a named operation.
    ///
    /// The returned guard records once, when it is stopped, failed, or
    /// dropped unfinished (recorded as a failure).
    pub fn start_timer(&self, operation: impl Into<String>) -> Timer<'_> {
        Timer {
            monitor: self,
            operation: operation.into(),
            started_at: Instant::now(),
            finished: false,
        }
    }

    /// Record one duration sample against an operation.
    pub fn record_duration(&self, operation: &str, duration: Duration, failed: bool) {
        self.record_sample(operation, duration.as_secs_f64() * 1000.0, failed);
    }

    fn record_sample(&self, operation: &str, duration_ms: f64, failed: bool) {
        let duration_ms = sanitize_ms(duration_ms);
        self.state
            .lock()
            .series
            .entry(operation.to_string())
            .or_default()
            .record(duration_ms, failed);

        super::record_operation(operation, failed, duration_ms / 1000.0);
    }

    /// Record a finished HTTP call.
    ///
    /// Appends to the bounded request history and feeds the
    /// `api:<endpoint>` series; 5xx responses count as failures.
    pub fn record_api_call(&self, call: ApiCall) {
        let duration_ms = sanitize_ms(call.duration.as_secs_f64() * 1000.0);
        let failed = call.status_code >= 500;
        let series_name = format!("api:{}", call.endpoint);

        {
            let mut state = self.state.lock();
            state.requests.push_back(RequestRecord {
                timestamp: Utc::now(),
                endpoint: call.endpoint.clone(),
                method: call.method.clone(),
                status_code: call.status_code,
                duration_ms,
                size: call.size,
            });
            if state.requests.len() > MAX_REQUEST_HISTORY {
                state.requests.pop_front();
            }
        }

        self.record_sample(&series_name, duration_ms, failed);
        super::record_request(&call.method, &call.endpoint, call.status_code, duration_ms / 1000.0);
    }

    /// Record an LLM call against the `llm:<model>` series.
    ///
    /// Cache hits count toward usage and Prometheus only; the series holds
    /// model latency alone.
    pub fn record_llm_call(&self, call: LlmCall) {
        let duration_ms = call.duration.as_secs_f64() * 1000.0;
        if !call.cache_hit {
            self.record_sample(&format!("llm:{}", call.model), duration_ms, false);
        }

        {
            let mut state = self.state.lock();
            let usage = state.llm_usage.entry(call.model.clone()).or_default();
            usage.calls += 1;
            usage.total_tokens += call.total_tokens;
            if call.cache_hit {
                usage.cache_hits += 1;
            }
        }

        super::record_llm_call(&call.model, call.cache_hit, call.total_tokens);
        debug!(
            "LLM call recorded: model={} duration={:.1}ms tokens={} cached={}",
            call.model, duration_ms, call.total_tokens, call.cache_hit
        );
    }

    /// Statistics for one operation, if it has been observed.
    pub fn get_metric_stats(&self, operation: &str) -> Option<MetricStats> {
        self.state.lock().series.get(operation)?.stats(operation)
    }

    /// Accumulated usage per LLM model.
    pub fn llm_usage(&self) -> BTreeMap<String, LlmUsage> {
        self.state
            .lock()
            .llm_usage
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn get_performance_dashboard(&self) -> PerformanceDashboard {
        let (uptime, total_requests, operations, avg_response_time_ms, responses_by_status) = {
            let state = self.state.lock();

            let operations: BTreeMap<String, MetricStats> = state
                .series
                .iter()
                .filter_map(|(name, series)| series.stats(name).map(|s| (name.clone(), s)))
                .collect();

            let avg_response_time_ms = if state.requests.is_empty() {
                None
            } else {
                let total: f64 = state.requests.iter().map(|r| r.duration_ms).sum();
                Some(round_to(total / state.requests.len() as f64, 2))
            };

            let mut responses_by_status = BTreeMap::new();
            for record in &state.requests {
                *responses_by_status.entry(record.status_code).or_insert(0) += 1;
            }

            (
                state.started_at.elapsed(),
                state.requests.len(),
                operations,
                avg_response_time_ms,
                responses_by_status,
            )
        };

        PerformanceDashboard {
            uptime: format_uptime(uptime),
            uptime_seconds: round_to(uptime.as_secs_f64(), 1),
            total_requests,
            operations,
            avg_response_time_ms,
            responses_by_status,
            llm_usage: self.llm_usage(),
            memory_usage: self.memory_usage(),
        }
    }

    /// Most recent API calls, oldest first.
    pub fn get_recent_requests(&self, limit: usize) -> Vec<RequestRecord> {
        let state = self.state.lock();
        let skip = state.requests.len().saturating_sub(limit);
        state.requests.iter().skip(skip).cloned().collect()
    }

    /// Operations sorted by descending average duration.
    pub fn get_bottlenecks(&self, limit: usize) -> Vec<MetricStats> {
        let mut stats: Vec<MetricStats> = {
            let state = self.state.lock();
            state
                .series
                .iter()
                .filter_map(|(name, series)| series.stats(name))
                .collect()
        };

        stats.sort_by(|a, b| b.avg_ms.total_cmp(&a.avg_ms));
        stats.truncate(limit);
        stats
    }

    pub fn get_health_check(&self) -> HealthCheck {
        let dashboard = self.get_performance_dashboard();
        HealthCheck {
            status: "healthy",
            uptime: dashboard.uptime,
            requests: dashboard.total_requests,
            avg_response_ms: dashboard.avg_response_time_ms,
            responses_by_status: dashboard.responses_by_status,
            slowest_operations: self.get_bottlenecks(3),
            memory: dashboard.memory_usage,
            timestamp: Utc::now(),
        }
    }

    /// Clear all series and history and restart the uptime clock.
    pub fn reset(&self) {
        *self.state.lock() = MonitorState::new();
        info!("Performance metrics reset");
    }

    fn memory_usage(&self) -> MemoryUsage {
        let rss_bytes = sysinfo::get_current_pid().ok().and_then(|pid| {
            let mut system = self.system.lock();
            system.refresh_process(pid);
            system.process(pid).map(|p| p.memory())
        });

        MemoryUsage {
            rss_bytes,
            rss_mb: rss_bytes.map(|b| round_to(b as f64 / 1024.0 / 1024.0, 2)),
            timestamp: Utc::now(),
        }
    }
}

/// Single-use timing span returned by [`PerformanceMonitor::start_timer`].
#[must_use = "a timer records when it is stopped or dropped"]
pub struct Timer<'a> {
    monitor: &'a PerformanceMonitor,
    operation: String,
    started_at: Instant,
    finished: bool,
}

impl Timer<'_> {
    /// Record a successful sample. Returns the duration on the first call
    /// and `None` afterwards.
    pub fn stop(&mut self) -> Option<Duration> {
        self.finish(false)
    }

    /// Record a failed sample. Same single-use rule as [`Timer::stop`].
    pub fn fail(&mut self) -> Option<Duration> {
        self.finish(true)
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    fn finish(&mut self, failed: bool) -> Option<Duration> {
        if self.finished {
            return None;
        }
        self.finished = true;

        let duration = self.started_at.elapsed();
        self.monitor.record_duration(&self.operation, duration, failed);
        Some(duration)
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!("Timer for {} dropped without being stopped", self.operation);
            self.finish(true);
        }
    }
}

fn sanitize_ms(duration_ms: f64) -> f64 {
    if duration_ms.is_finite() && duration_ms > 0.0 {
        duration_ms
    } else {
        0.0
    }
}

fn format_uptime(uptime: Duration) -> String {
    format!("{:.1} minutes", uptime.as_secs_f64() / 60.0)
}
