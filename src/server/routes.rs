// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    analyze_handler, cache_keys_handler, clear_cache_handler, health_handler, localize_handler, meal_handler,
    metrics_handler, prometheus_handler, tts_handler,
};
use super::middleware::{request_id_layers, track_performance};
use crate::analysis::AnalysisPipeline;
use crate::cache::{CacheManager, LlmResponseCache};
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::metrics::PerformanceMonitor;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<AnalysisPipeline>,
}

impl AppState {
    pub fn new(config: AppConfig, pipeline: AnalysisPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        self.pipeline.monitor()
    }

    pub fn llm_cache(&self) -> &LlmResponseCache {
        self.pipeline.llm_cache()
    }

    pub fn response_cache(&self) -> &CacheManager {
        self.pipeline.response_cache()
    }
}

pub fn create_router(state: AppState) -> Result<Router> {
    let server = &state.config.server;

    let origin: HeaderValue = server
        .frontend_url
        .parse()
        .map_err(|_| AppError::Config(format!("Invalid frontend_url: {}", server.frontend_url)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let (set_request_id, propagate_request_id) = request_id_layers();

    let app = Router::new()
        .route("/api/analyze", post(analyze_handler))
        .route("/api/meal", post(meal_handler))
        .route("/api/localize", post(localize_handler))
        .route("/api/tts", post(tts_handler))
        .route("/api/health", get(health_handler))
        .route("/api/metrics", get(metrics_handler))
        .route("/metrics", get(prometheus_handler))
        .route("/api/cache/keys", get(cache_keys_handler))
        .route("/api/cache", delete(clear_cache_handler))
        // Base64 images exceed axum's 2MB default; the configured limit applies instead
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.body_limit_bytes))
        // Outside the body limit so refused payloads are recorded too
        .layer(middleware::from_fn_with_state(state.clone(), track_performance));

    let app = if server.enable_compression {
        app.layer(CompressionLayer::new())
    } else {
        app
    };

    let app = app
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}
