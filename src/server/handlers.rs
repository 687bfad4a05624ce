// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::cache::{CacheStats, LlmCacheStats};
use crate::error::{AppError, Result};
use crate::metrics::{gather_metrics, HealthCheck, PerformanceDashboard};
use crate::models::{
    AnalyzeRequest, KeyPatternQuery, LocalizeRequest, MealRequest, MealResponse, TtsRequest,
};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

const LLM_CACHE_HIT_HEADER: HeaderName = HeaderName::from_static("x-llm-cache-hit");
const CACHE_HIT_HEADER: HeaderName = HeaderName::from_static("x-cache-hit");

/// Body of `GET /api/metrics`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub performance: PerformanceDashboard,
    pub llm_cache: LlmCacheStats,
    pub response_cache: CacheStats,
    pub timestamp: DateTime<Utc>,
}

/// Deserialize a JSON body, turning syntax errors into a 400 `INVALID_JSON`.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejected request body: {}", e);
        AppError::invalid_request("INVALID_JSON", format!("Malformed JSON body: {}", e))
    })
}

fn cache_header(hit: bool) -> HeaderValue {
    HeaderValue::from_static(if hit { "true" } else { "false" })
}

/// Handler for `POST /api/analyze`
pub async fn analyze_handler(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let request: AnalyzeRequest = parse_body(&body)?;
    info!(
        conditions = ?request.profile.effective_conditions(),
        "Received label analysis request"
    );

    let response = state.pipeline.analyze(request).await?;
    let hit = response.performance.cached;
    Ok(([(LLM_CACHE_HIT_HEADER, cache_header(hit))], Json(response)).into_response())
}

/// Handler for `POST /api/meal`
pub async fn meal_handler(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let request: MealRequest = parse_body(&body)?;
    let meal = state.pipeline.analyze_meal(request).await?;

    let response = MealResponse {
        success: true,
        analyzed_at: Utc::now(),
        meal: meal.value,
    };
    Ok(([(CACHE_HIT_HEADER, cache_header(meal.cache_hit))], Json(response)).into_response())
}

/// Handler for `POST /api/localize`
pub async fn localize_handler(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let request: LocalizeRequest = parse_body(&body)?;
    let localized = state.pipeline.localize(request).await?;
    Ok(([(CACHE_HIT_HEADER, cache_header(localized.cache_hit))], Json(localized.value)).into_response())
}

/// Handler for `POST /api/tts`
pub async fn tts_handler(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let request: TtsRequest = parse_body(&body)?;
    let audio = state.pipeline.speak(request).await?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        audio,
    )
        .into_response())
}

/// Handler for `GET /api/health`
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthCheck> {
    Json(state.monitor().get_health_check())
}

/// Handler for `GET /api/metrics`
pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(MetricsSnapshot {
        performance: state.monitor().get_performance_dashboard(),
        llm_cache: state.llm_cache().get_stats(),
        response_cache: state.response_cache().get_stats(),
        timestamp: Utc::now(),
    })
}

/// Handler for `GET /metrics` (Prometheus text exposition)
pub async fn prometheus_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

/// Handler for `GET /api/cache/keys?pattern=`
pub async fn cache_keys_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyPatternQuery>,
) -> Json<serde_json::Value> {
    let keys = state.response_cache().get_keys_by_pattern(&query.pattern);
    Json(json!({
        "pattern": query.pattern,
        "count": keys.len(),
        "keys": keys,
    }))
}

/// Handler for `DELETE /api/cache`
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.response_cache().clear();
    state.llm_cache().clear();
    info!("Cleared response and LLM caches");

    Json(json!({
        "cleared": true,
        "llmCache": state.llm_cache().get_stats(),
        "responseCache": state.response_cache().get_stats(),
    }))
}
