// HTTP middleware
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::metrics::{update_cache_entries, ApiCall};
use axum::{
    body::HttpBody,
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Create request ID layers for the application
pub fn request_id_layers() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    (
        SetRequestIdLayer::x_request_id(MakeRequestUuid),
        PropagateRequestIdLayer::x_request_id(),
    )
}

/// Record one API call per request, labelled by route template.
pub async fn track_performance(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let size = response.body().size_hint().exact().unwrap_or(0);
    state.monitor().record_api_call(ApiCall {
        endpoint,
        method,
        status_code: response.status().as_u16(),
        duration: started.elapsed(),
        size,
    });

    update_cache_entries("llm", state.llm_cache().len());
    update_cache_entries("response", state.response_cache().len());

    response
}
