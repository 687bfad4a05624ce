// Error handling tests
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use nutralingo::error::AppError;
use serde_json::Value;

async fn body_json(error: AppError) -> (StatusCode, Value) {
    let response = error.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn test_status_codes() {
    let cases = vec![
        (AppError::InvalidImage("No image provided.".to_string()), StatusCode::UNPROCESSABLE_ENTITY),
        (
            AppError::LowConfidence {
                confidence: 0.2,
                errors: vec![],
            },
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (AppError::invalid_request("MISSING_TEXT", "Text is required"), StatusCode::BAD_REQUEST),
        (AppError::Vision("Vision service returned HTTP 401".to_string()), StatusCode::BAD_GATEWAY),
        (AppError::HealthAnalysis("timeout".to_string()), StatusCode::BAD_GATEWAY),
        (AppError::Tts("Tts service unreachable".to_string()), StatusCode::BAD_GATEWAY),
        (AppError::TtsUnavailable, StatusCode::SERVICE_UNAVAILABLE),
        (AppError::Internal("lock poisoned".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (error, expected) in cases {
        assert_eq!(error.status_code(), expected, "{}", error);
    }
}

#[test]
fn test_error_codes() {
    assert_eq!(AppError::InvalidImage(String::new()).code(), "INVALID_IMAGE");
    assert_eq!(AppError::ExtractionParse(String::new()).code(), "EXTRACTION_PARSE_ERROR");
    assert_eq!(AppError::MealAnalysis(String::new()).code(), "MEAL_ANALYSIS_ERROR");
    assert_eq!(AppError::Localization(String::new()).code(), "LOCALIZATION_ERROR");
    assert_eq!(AppError::invalid_request("TEXT_TOO_LONG", "too long").code(), "TEXT_TOO_LONG");
    assert_eq!(AppError::Config("bad".to_string()).code(), "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_low_confidence_body_lists_validation_errors() {
    let (status, body) = body_json(AppError::LowConfidence {
        confidence: 0.2,
        errors: vec!["Missing nutrition data.".to_string()],
    })
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "LOW_CONFIDENCE");
    assert_eq!(body["confidence"], 0.2);
    assert_eq!(body["validationErrors"][0], "Missing nutrition data.");
    assert!(body["message"].as_str().unwrap().contains("retake photo"));
}

#[tokio::test]
async fn test_tts_unavailable_suggests_fallback() {
    let (status, body) = body_json(AppError::TtsUnavailable).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "TTS_UNAVAILABLE");
    assert_eq!(body["fallback"], "browser-speech-synthesis");
}

#[tokio::test]
async fn test_internal_details_are_hidden() {
    let (status, body) = body_json(AppError::Internal("db password is hunter2".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "INTERNAL_ERROR");
    assert!(!body["message"].as_str().unwrap().contains("hunter2"));
}

#[tokio::test]
async fn test_client_errors_keep_their_message() {
    let (_, body) = body_json(AppError::invalid_request("MISSING_LANGUAGE", "Target language is required.")).await;
    assert_eq!(body["error"], "MISSING_LANGUAGE");
    assert_eq!(body["message"], "Target language is required.");
}
