// src/services/backend.rs
use crate::config::AppConfig;
use crate::errors::StoryError;
use crate::models::NormalizedImage;
use crate::services::gemini::GeminiBackend;
use crate::services::mock::{MockBackend, MockScenario};
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

/// Raw response text on success, or a taxonomy member on failure.
pub type GenerationOutcome = Result<String, StoryError>;

/// A service that turns a prompt plus images into text.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Submits `prompt` followed by every image as one multimodal request.
    ///
    /// `directive` selects a canned scenario on the mock backend; real
    /// backends ignore it.
    async fn generate(
        &self,
        images: &[NormalizedImage],
        prompt: &str,
        directive: Option<MockScenario>,
    ) -> GenerationOutcome;

    /// Short identifier for logs.
    fn name(&self) -> &str;

    fn is_mock(&self) -> bool {
        false
    }
}

/// Picks the backend once, from configuration.
pub async fn connect_backend(config: &AppConfig) -> Result<Arc<dyn GenerationBackend>, StoryError> {
    if config.mock_mode {
        info!("Mock mode enabled, using deterministic backend");
        return Ok(Arc::new(MockBackend::new()));
    }

    let backend = GeminiBackend::connect(config.gemini_api_key.as_deref(), &config.default_model).await?;
    Ok(Arc::new(backend))
}
