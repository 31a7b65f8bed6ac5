// src/services/gemini.rs
use crate::errors::{BackendError, StoryError};
use crate::models::NormalizedImage;
use crate::services::backend::{GenerationBackend, GenerationOutcome};
use crate::services::mock::MockScenario;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;

pub const API_KEY_PREFIX: &str = "AIza";
pub const API_KEY_URL: &str = "https://aistudio.google.com/app/apikey";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub const MODEL_FALLBACK_CHAIN: [&str; 4] = [
    "gemini-2.0-flash-exp",
    "gemini-1.5-flash",
    "gemini-pro-vision",
    "gemini-pro",
];

/// Backend that calls the Gemini `generateContent` REST endpoint.
pub struct GeminiBackend {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiBackend {
    pub async fn connect(api_key: Option<&str>, default_model: &str) -> Result<Self, StoryError> {
        Self::connect_to(DEFAULT_BASE_URL, api_key, default_model).await
    }

    /// Validates the credential, then selects the first candidate model the
    /// API recognises.
    pub async fn connect_to(
        base_url: &str,
        api_key: Option<&str>,
        default_model: &str,
    ) -> Result<Self, StoryError> {
        let api_key = check_api_key(api_key)?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = Client::new();

        for model in candidate_models(default_model) {
            match probe_model(&client, &base_url, &api_key, &model).await {
                Ok(()) => {
                    info!("Using Gemini model {}", model);
                    return Ok(Self {
                        api_key,
                        model,
                        base_url,
                        client,
                    });
                }
                Err(reason) => warn!("Gemini model {} unavailable: {}", model, reason),
            }
        }

        Err(StoryError::Configuration(
            "Failed to initialize any Gemini model".to_string(),
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, images: &[NormalizedImage], prompt: &str) -> Result<String, StoryError> {
        let mut parts = vec![json!({ "text": prompt })];
        for image in images {
            parts.push(json!({
                "inline_data": {
                    "mime_type": "image/jpeg",
                    "data": image.to_base64_jpeg()?
                }
            }));
        }

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{
                    "role": "user",
                    "parts": parts
                }]
            }))
            .send()
            .await
            .map_err(|e| BackendError::classify(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await;
            return Err(BackendError::classify(http_failure(status, body)).into());
        }

        let result: GenerateContentResponse = response.json().await.map_err(|e| {
            BackendError::classify(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text: String = result
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(BackendError::InvalidResponse(
                "Malformed Gemini response: no candidate text".to_string(),
            )
            .into());
        }

        Ok(text)
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(
        &self,
        images: &[NormalizedImage],
        prompt: &str,
        _directive: Option<MockScenario>,
    ) -> GenerationOutcome {
        let start = Instant::now();
        let result = self.send(images, prompt).await;

        match &result {
            Ok(text) => debug!(
                "Gemini {} returned {} chars in {} ms",
                self.model,
                text.len(),
                start.elapsed().as_millis()
            ),
            Err(e) => warn!("Gemini {} call failed: {}", self.model, e),
        }

        result
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn check_api_key(api_key: Option<&str>) -> Result<String, StoryError> {
    let key = api_key.map(str::trim).unwrap_or_default();

    if key.is_empty() {
        return Err(StoryError::Configuration(format!(
            "GEMINI_API_KEY not found. Provide a Gemini API key; get one from {}",
            API_KEY_URL
        )));
    }

    if !key.starts_with(API_KEY_PREFIX) {
        let preview: String = if key.chars().count() > 5 {
            key.chars().take(5).collect()
        } else {
            "too short".to_string()
        };
        return Err(StoryError::Configuration(format!(
            "API key format appears invalid. Gemini API keys start with '{}', yours starts with: {}. Get a key from {}",
            API_KEY_PREFIX, preview, API_KEY_URL
        )));
    }

    Ok(key.to_string())
}

/// Configured default first, then the fixed chain, without repeats.
fn candidate_models(default_model: &str) -> Vec<String> {
    let mut models: Vec<String> = Vec::with_capacity(MODEL_FALLBACK_CHAIN.len() + 1);
    for model in std::iter::once(default_model).chain(MODEL_FALLBACK_CHAIN) {
        if !model.is_empty() && !models.iter().any(|m| m == model) {
            models.push(model.to_string());
        }
    }
    models
}

async fn probe_model(client: &Client, base_url: &str, api_key: &str, model: &str) -> Result<(), String> {
    let response = client
        .get(format!("{}/v1beta/models/{}", base_url, model))
        .header("x-goog-api-key", api_key)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()))
    }
}

/// Message for a non-2xx reply. A body that cannot be read is described
/// rather than dropped so it still reaches the classifier.
fn http_failure<E: std::fmt::Display>(status: StatusCode, body: Result<String, E>) -> String {
    match body {
        Ok(text) => format!("HTTP {}: {}", status, text),
        Err(e) => format!("HTTP {}: <unreadable body: {}>", status, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_rejected() {
        assert!(matches!(check_api_key(None), Err(StoryError::Configuration(_))));
        assert!(matches!(check_api_key(Some("  ")), Err(StoryError::Configuration(_))));
    }

    #[test]
    fn key_must_have_expected_prefix() {
        let err = check_api_key(Some("sk-abcdef123")).unwrap_err();
        assert!(err.to_string().contains("AIza"));
        assert!(err.to_string().contains("sk-ab"));

        let err = check_api_key(Some("abc")).unwrap_err();
        assert!(err.to_string().contains("too short"));

        assert_eq!(check_api_key(Some(" AIzaXYZ ")).unwrap(), "AIzaXYZ");
    }

    #[test]
    fn default_model_leads_the_chain_without_duplicates() {
        assert_eq!(
            candidate_models("gemini-2.5-flash"),
            vec![
                "gemini-2.5-flash",
                "gemini-2.0-flash-exp",
                "gemini-1.5-flash",
                "gemini-pro-vision",
                "gemini-pro"
            ]
        );
        assert_eq!(candidate_models("gemini-1.5-flash").len(), 4);
        assert_eq!(candidate_models("gemini-1.5-flash")[0], "gemini-1.5-flash");
    }

    #[test]
    fn unreadable_error_body_is_kept_in_the_message() {
        let message = http_failure(
            StatusCode::GATEWAY_TIMEOUT,
            Err::<String, _>("connection reset"),
        );
        assert!(message.contains("504"));
        assert!(message.contains("connection reset"));
        assert!(matches!(
            BackendError::classify(message),
            BackendError::Timeout(_)
        ));

        let message = http_failure(
            StatusCode::TOO_MANY_REQUESTS,
            Ok::<_, String>("slow down".to_string()),
        );
        assert_eq!(message, "HTTP 429 Too Many Requests: slow down");
    }
}
