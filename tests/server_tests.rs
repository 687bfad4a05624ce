// HTTP API tests driven through the router without a socket
// Author: kelexine (https://github.com/kelexine)

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::*;
use http_body_util::BodyExt;
use nutralingo::config::AppConfig;
use nutralingo::server::{create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn router_with(fakes: &Fakes, config: AppConfig, with_speech: bool) -> (Router, AppState) {
    let state = AppState::new(config, pipeline(fakes, with_speech));
    (create_router(state.clone()).unwrap(), state)
}

fn router(fakes: &Fakes) -> (Router, AppState) {
    router_with(fakes, AppConfig::default(), false)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_analyze_sets_cache_header() {
    let fakes = Fakes::new(standard_extractor(), FakeHealth::default());
    let (app, _) = router(&fakes);

    let first = app
        .clone()
        .oneshot(post_json("/api/analyze", json!({"image": image_of("label-a")})))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-llm-cache-hit"], "false");
    assert!(first.headers().contains_key("x-request-id"));

    let body = read_json(first).await;
    assert_eq!(body["detectedLanguage"], "fr");
    assert_eq!(body["confidence"], 1.0);
    assert!(body["healthReport"]["score"].is_number());
    assert_eq!(body["performance"]["cached"], false);

    let second = app
        .oneshot(post_json("/api/analyze", json!({"image": image_of("label-b")})))
        .await
        .unwrap();
    assert_eq!(second.headers()["x-llm-cache-hit"], "true");
    assert_eq!(fakes.health_calls(), 1);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let fakes = Fakes::new(standard_extractor(), FakeHealth::default());
    let (app, _) = router(&fakes);

    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "INVALID_JSON");
}

#[tokio::test]
async fn test_missing_image_is_unprocessable() {
    let fakes = Fakes::new(standard_extractor(), FakeHealth::default());
    let (app, _) = router(&fakes);

    let response = app.oneshot(post_json("/api/analyze", json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert_eq!(body["error"], "INVALID_IMAGE");
    assert_eq!(body["message"], "Invalid image: No image provided.");
}

#[tokio::test]
async fn test_meal_response_shape() {
    let fakes = Fakes::new(standard_extractor(), FakeHealth::default());
    let (app, _) = router(&fakes);
    let request = || post_json("/api/meal", json!({"image": image_of("dinner")}));

    let first = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(first.headers()["x-cache-hit"], "false");
    let body = read_json(first).await;
    assert_eq!(body["success"], true);
    assert!(body["analyzedAt"].is_string());
    assert_eq!(body["totalCalories"], 200.0);
    assert_eq!(body["foodItems"][0]["name"], "rice");

    let second = app.oneshot(request()).await.unwrap();
    assert_eq!(second.headers()["x-cache-hit"], "true");
}

#[tokio::test]
async fn test_localize_route() {
    let fakes = Fakes::new(standard_extractor(), FakeHealth::default());
    let (app, _) = router(&fakes);
    let request = json!({
        "healthReport": {"score": 5, "verdict": "Okay", "warnings": [], "summary": "Fine"},
        "targetLanguage": "es"
    });

    let response = app.clone().oneshot(post_json("/api/localize", request.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-cache-hit"], "false");
    let body = read_json(response).await;
    assert_eq!(body["language"], "es");
    assert_eq!(body["languageName"], "Spanish");
    assert_eq!(body["localizedReport"]["verdict"], "[es] Okay");

    let again = app.clone().oneshot(post_json("/api/localize", request)).await.unwrap();
    assert_eq!(again.headers()["x-cache-hit"], "true");

    let missing = app
        .oneshot(post_json("/api/localize", json!({"targetLanguage": "es"})))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(missing).await["error"], "MISSING_REPORT");
}

#[tokio::test]
async fn test_tts_route() {
    let fakes = Fakes::new(standard_extractor(), FakeHealth::default());

    let (without, _) = router(&fakes);
    let response = without
        .oneshot(post_json("/api/tts", json!({"text": "Hello"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let (with, _) = router_with(&fakes, AppConfig::default(), true);
    let response = with
        .oneshot(post_json("/api/tts", json!({"text": "Hello", "language": "en"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "audio/mpeg");
    assert_eq!(response.headers()["cache-control"], "no-store");
    let audio = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&audio[..], b"ID3Hello");
}

#[tokio::test]
async fn test_requests_are_recorded_once() {
    let fakes = Fakes::new(standard_extractor(), FakeHealth::default());
    let (app, state) = router(&fakes);

    app.clone()
        .oneshot(post_json("/api/analyze", json!({"image": image_of("label-a")})))
        .await
        .unwrap();
    app.oneshot(get("/api/health")).await.unwrap();

    let requests = state.monitor().get_recent_requests(10);
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].endpoint, "/api/analyze");
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].status_code, 200);
    assert!(requests[0].size > 0);
    assert_eq!(requests[1].endpoint, "/api/health");
    assert!(state.monitor().get_metric_stats("api:/api/analyze").is_some());
}

#[tokio::test]
async fn test_metrics_snapshot() {
    let fakes = Fakes::new(standard_extractor(), FakeHealth::default());
    let (app, _) = router(&fakes);

    app.clone()
        .oneshot(post_json("/api/analyze", json!({"image": image_of("label-a")})))
        .await
        .unwrap();

    let response = app.oneshot(get("/api/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["llmCache"]["size"], 1);
    assert_eq!(body["llmCache"]["maxEntries"], 1000);
    assert_eq!(body["responseCache"]["maxSize"], 500);
    assert!(body["performance"]["operations"]["health:analysis"].is_object());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_prometheus_exposition() {
    let fakes = Fakes::new(standard_extractor(), FakeHealth::default());
    let (app, _) = router(&fakes);

    app.clone().oneshot(get("/api/health")).await.unwrap();
    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let text = String::from_utf8(response.into_body().collect().await.unwrap().to_bytes().to_vec()).unwrap();
    assert!(text.contains("requests_total"));
}

#[tokio::test]
async fn test_cache_maintenance_routes() {
    let fakes = Fakes::new(standard_extractor(), FakeHealth::default());
    let (app, state) = router(&fakes);
    state.response_cache().set("localize:one", json!(1));
    state.response_cache().set("other:two", json!(2));

    let response = app.clone().oneshot(get("/api/cache/keys?pattern=localize:*")).await.unwrap();
    let body = read_json(response).await;
    assert_eq!(body["pattern"], "localize:*");
    assert_eq!(body["count"], 1);
    assert_eq!(body["keys"][0], "localize:one");

    let all = read_json(app.clone().oneshot(get("/api/cache/keys")).await.unwrap()).await;
    assert_eq!(all["count"], 2);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/cache")
        .body(Body::empty())
        .unwrap();
    let cleared = read_json(app.oneshot(request).await.unwrap()).await;
    assert_eq!(cleared["cleared"], true);
    assert_eq!(cleared["responseCache"]["size"], 0);
    assert!(state.response_cache().is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_refused() {
    let fakes = Fakes::new(standard_extractor(), FakeHealth::default());
    let mut config = AppConfig::default();
    config.server.body_limit_bytes = 1024;
    let (app, state) = router_with(&fakes, config, false);

    let body = json!({ "image": "A".repeat(4096) }).to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header("content-type", "application/json")
        .header("content-length", body.len())
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(fakes.health_calls(), 0);

    let requests = state.monitor().get_recent_requests(10);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].endpoint, "/api/analyze");
    assert_eq!(requests[0].status_code, 413);
    let health = state.monitor().get_health_check();
    assert_eq!(health.requests, 1);
    assert_eq!(health.responses_by_status.get(&413), Some(&1));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let fakes = Fakes::new(standard_extractor(), FakeHealth::default());
    let (app, _) = router(&fakes);
    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
