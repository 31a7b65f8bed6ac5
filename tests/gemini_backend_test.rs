use httpmock::prelude::*;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::json;
use std::io::Cursor;

use story_imager::errors::{BackendError, StoryError};
use story_imager::models::NormalizedImage;
use story_imager::services::backend::GenerationBackend;
use story_imager::services::{GeminiBackend, ImageProcessor};

const API_KEY: &str = "AIzaTestKey0123456789";
const MODEL: &str = "gemini-2.5-flash";

fn test_image() -> NormalizedImage {
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([0, 128, 255])))
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    ImageProcessor::default()
        .validate_image(&png, "image/png", png.len())
        .unwrap()
        .0
}

async fn connected(server: &MockServer) -> GeminiBackend {
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/v1beta/models/{MODEL}"));
            then.status(200).json_body(json!({ "name": format!("models/{MODEL}") }));
        })
        .await;

    GeminiBackend::connect_to(&server.base_url(), Some(API_KEY), MODEL)
        .await
        .unwrap()
}

async fn failure_for(status: u16, body: &str) -> StoryError {
    let server = MockServer::start_async().await;
    let backend = connected(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/v1beta/models/{MODEL}:generateContent"));
            then.status(status).body(body);
        })
        .await;

    backend
        .generate(&[test_image()], "prompt", None)
        .await
        .unwrap_err()
}

#[tokio::test]
async fn missing_credential_fails_without_network() {
    let err = GeminiBackend::connect_to("http://127.0.0.1:9", None, MODEL)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StoryError::Configuration(_)));
    assert!(err.to_string().contains("GEMINI_API_KEY"));
}

#[tokio::test]
async fn malformed_credential_is_a_configuration_error() {
    let err = GeminiBackend::connect_to("http://127.0.0.1:9", Some("sk-live-123456"), MODEL)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StoryError::Configuration(_)));
    assert!(err.to_string().contains("AIza"));
}

#[tokio::test]
async fn falls_back_through_model_chain() {
    let server = MockServer::start_async().await;
    let default_probe = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/v1beta/models/{MODEL}"));
            then.status(404);
        })
        .await;
    let fallback_probe = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1beta/models/gemini-2.0-flash-exp")
                .header("x-goog-api-key", API_KEY);
            then.status(200).json_body(json!({ "name": "models/gemini-2.0-flash-exp" }));
        })
        .await;

    let backend = GeminiBackend::connect_to(&server.base_url(), Some(API_KEY), MODEL)
        .await
        .unwrap();

    default_probe.assert_async().await;
    fallback_probe.assert_async().await;
    assert_eq!(backend.model(), "gemini-2.0-flash-exp");
}

#[tokio::test]
async fn every_model_failing_is_a_configuration_error() {
    let server = MockServer::start_async().await;

    let err = GeminiBackend::connect_to(&server.base_url(), Some(API_KEY), MODEL)
        .await
        .err()
        .unwrap();

    assert!(matches!(err, StoryError::Configuration(_)));
    assert!(err.to_string().contains("Failed to initialize any Gemini model"));
}

#[tokio::test]
async fn submits_prompt_then_images_and_returns_text() {
    let server = MockServer::start_async().await;
    let backend = connected(&server).await;
    let generate = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/v1beta/models/{MODEL}:generateContent"))
                .header("x-goog-api-key", API_KEY)
                .body_contains("\"text\":\"Describe the pictures\"")
                .body_contains("\"mime_type\":\"image/jpeg\"");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "OBJECTS: a kettle. " }, { "text": "SCENE: a kitchen." }]
                    }
                }]
            }));
        })
        .await;

    let text = backend
        .generate(&[test_image(), test_image()], "Describe the pictures", None)
        .await
        .unwrap();

    generate.assert_async().await;
    assert_eq!(text, "OBJECTS: a kettle. SCENE: a kitchen.");
}

#[tokio::test]
async fn http_429_is_a_rate_limit() {
    let err = failure_for(429, r#"{"error": {"status": "RESOURCE_EXHAUSTED"}}"#).await;
    assert!(matches!(err, StoryError::Backend(BackendError::RateLimit(_))));
}

#[tokio::test]
async fn gateway_timeout_is_a_timeout() {
    let err = failure_for(504, "upstream").await;
    assert!(matches!(err, StoryError::Backend(BackendError::Timeout(_))));
}

#[tokio::test]
async fn invalid_argument_is_an_invalid_response() {
    let err = failure_for(400, r#"{"error": {"message": "Invalid JSON payload received"}}"#).await;
    assert!(matches!(
        err,
        StoryError::Backend(BackendError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn unclassified_server_error_is_a_generic_backend_failure() {
    let err = failure_for(500, "something broke").await;
    assert!(matches!(err, StoryError::Backend(BackendError::Other(_))));
    assert!(err.to_string().contains("something broke"));
}

#[tokio::test]
async fn undecodable_body_is_an_invalid_response() {
    let err = failure_for(200, "<html>not json</html>").await;
    assert!(matches!(
        err,
        StoryError::Backend(BackendError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn empty_candidates_are_an_invalid_response() {
    let err = failure_for(200, r#"{"candidates": []}"#).await;
    assert!(matches!(
        err,
        StoryError::Backend(BackendError::InvalidResponse(_))
    ));
}
