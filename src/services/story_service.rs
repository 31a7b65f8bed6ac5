// src/services/story_service.rs
use crate::errors::StoryError;
use crate::models::{NormalizedImage, Settings, Story};
use crate::services::backend::GenerationBackend;
use crate::services::mock::MockScenario;
use crate::services::prompt_builder::{ANALYSIS_PROMPT, build_prompt};
use crate::services::story_text::{extract_title, format_chapters, remove_title};
use log::{debug, info, warn};
use std::sync::Arc;

/// Runs the analysis pass, the story pass and post-processing for one
/// request at a time.
pub struct StoryService {
    backend: Arc<dyn GenerationBackend>,
    story_scenario: Option<MockScenario>,
}

impl StoryService {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            story_scenario: None,
        }
    }

    /// Scenario the mock backend should play for the story pass. Ignored by
    /// real backends.
    pub fn with_mock_scenario(mut self, scenario: MockScenario) -> Self {
        self.story_scenario = Some(scenario);
        self
    }

    /// Describes the visual content of `images`.
    pub async fn analyze_images(&self, images: &[NormalizedImage]) -> Result<String, StoryError> {
        if images.is_empty() {
            return Err(StoryError::Generation(
                "No images provided for analysis".to_string(),
            ));
        }

        info!(
            "Analyzing {} image(s) with {}",
            images.len(),
            self.backend.name()
        );

        let analysis = self
            .backend
            .generate(images, ANALYSIS_PROMPT, self.directive(MockScenario::Analysis))
            .await?;

        if analysis.trim().is_empty() {
            return Err(StoryError::Generation("Image analysis failed".to_string()));
        }

        debug!("Analysis produced {} chars", analysis.len());
        Ok(analysis)
    }

    pub async fn generate_story(
        &self,
        images: &[NormalizedImage],
        settings: &Settings,
    ) -> Result<Story, StoryError> {
        self.generate_story_with_scenario(images, settings, None).await
    }

    /// Like `generate_story`, but `scenario` overrides the service-wide mock
    /// scenario for this request's story pass.
    pub async fn generate_story_with_scenario(
        &self,
        images: &[NormalizedImage],
        settings: &Settings,
        scenario: Option<MockScenario>,
    ) -> Result<Story, StoryError> {
        if images.is_empty() {
            return Err(StoryError::Generation(
                "No images provided for story generation".to_string(),
            ));
        }

        let analysis = self.analyze_images(images).await.inspect_err(|e| {
            warn!("Image analysis failed: {}", e);
        })?;

        let prompt = build_prompt(settings, &analysis);
        debug!("Story prompt is {} chars", prompt.len());

        let scenario = scenario.or(self.story_scenario).unwrap_or_default();
        let raw = self
            .backend
            .generate(images, &prompt, self.directive(scenario))
            .await
            .inspect_err(|e| warn!("Story generation failed: {}", e))?;

        if raw.trim().is_empty() {
            return Err(StoryError::Generation("Unknown error".to_string()));
        }

        let story = assemble_story(&raw, settings);
        info!(
            "Story ready: title={:?}, {} chars, chapters={}",
            story.title,
            story.body.len(),
            story.chapters_applied
        );
        Ok(story)
    }

    fn directive(&self, scenario: MockScenario) -> Option<MockScenario> {
        self.backend.is_mock().then_some(scenario)
    }
}

/// Applies title extraction and chapter formatting to raw story text.
pub fn assemble_story(raw: &str, settings: &Settings) -> Story {
    let (title, body) = if settings.include_title {
        match extract_title(raw) {
            Some(title) => {
                let body = remove_title(raw, &title);
                (Some(title), body)
            }
            None => (None, raw.to_string()),
        }
    } else {
        (None, raw.to_string())
    };

    if settings.include_chapters {
        Story {
            title,
            body: format_chapters(&body),
            chapters_applied: true,
        }
    } else {
        Story {
            title,
            body,
            chapters_applied: false,
        }
    }
}
