// src/services/mock.rs
use crate::errors::{BackendError, StoryError};
use crate::models::NormalizedImage;
use crate::services::backend::{GenerationBackend, GenerationOutcome};
use crate::services::prompt_builder::VISUAL_DETAILS_MARKER;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockScenario {
    #[default]
    Success,
    Timeout,
    RateLimit,
    InvalidResponse,
    Error,
    Analysis,
}

impl fmt::Display for MockScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MockScenario::Success => "success",
            MockScenario::Timeout => "timeout",
            MockScenario::RateLimit => "rate_limit",
            MockScenario::InvalidResponse => "invalid_response",
            MockScenario::Error => "error",
            MockScenario::Analysis => "analysis",
        };
        f.write_str(name)
    }
}

impl FromStr for MockScenario {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "success" => Ok(MockScenario::Success),
            "timeout" => Ok(MockScenario::Timeout),
            "rate_limit" => Ok(MockScenario::RateLimit),
            "invalid_response" => Ok(MockScenario::InvalidResponse),
            "error" => Ok(MockScenario::Error),
            "analysis" => Ok(MockScenario::Analysis),
            other => Err(StoryError::Configuration(format!(
                "Unknown mock scenario: {}",
                other
            ))),
        }
    }
}

pub const MOCK_ANALYSIS: &str = "OBJECTS: A small wooden rowing boat with peeling blue paint, a coil of rope, a sandy beach, low waves, a lighthouse on a distant headland, gulls overhead, scattered driftwood.

SCENE: A quiet cove at sunset where a pale sand beach meets calm water, with the lighthouse marking the end of the bay.

MOOD/ATMOSPHERE: Calm and wistful, with a sense of a day ending and something being left behind.

COLORS: Amber and rose in the sky, deep blue water, pale beige sand, faded blue and brown on the boat.

TIME OF DAY: Evening, at sunset.

WEATHER/CONDITIONS: Clear sky, light breeze, long soft shadows.

COMPOSITION: The boat sits in the foreground on the sand, the water and lighthouse fill the middle distance, the sunset fills the sky behind.

ACTIVITY: Nothing moves except the waves and the gulls. No people are visible.

DETAILS: Worn oarlocks, footprints leading away from the boat toward the dunes, rope frayed at one end.";

pub const MOCK_GROUNDED_STORY: &str = "The Last Boat in the Cove

The sun was sinking into the bay when Mara found the rowing boat, its blue paint peeling in long curls, resting on the pale sand as though someone had meant to come back for it. A coil of frayed rope lay in the bow, and a line of footprints led away toward the dunes.

Out past the low waves the lighthouse on the headland blinked awake, throwing its first beam across water that had turned from deep blue to amber and rose. Gulls wheeled overhead, calling to one another, and the driftwood along the shore cast long shadows in the evening light.

Mara sat on the gunwale and listened to the tide. Whoever had rowed this boat into the cove had left in a hurry, but the worn oarlocks told her they had rowed it many times before. She decided she would wait until the lighthouse beam had swept the bay one hundred times, and if no one came, she would take the oars herself.";

pub const MOCK_FALLBACK_STORY: &str = "The Clockwork Garden

Behind the old observatory there was a garden where the flowers ticked instead of swaying, and every evening a girl named Ivy came to wind them. She carried a brass key on a ribbon around her neck and never told anyone where she had found it.

One night the roses stopped ticking all at once, and in the silence Ivy heard footsteps on the gravel path that did not belong to her.";

/// Network-free backend with canned, deterministic responses.
#[derive(Debug, Clone, Default)]
pub struct MockBackend;

impl MockBackend {
    pub fn new() -> Self {
        Self
    }

    fn story_for(prompt: &str) -> &'static str {
        let grounded = prompt.contains(VISUAL_DETAILS_MARKER) || prompt.contains("OBJECTS:");
        if grounded {
            MOCK_GROUNDED_STORY
        } else {
            MOCK_FALLBACK_STORY
        }
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(
        &self,
        images: &[NormalizedImage],
        prompt: &str,
        directive: Option<MockScenario>,
    ) -> GenerationOutcome {
        let scenario = directive.unwrap_or_default();
        debug!(
            "Mock generation: scenario={}, images={}, prompt_len={}",
            scenario,
            images.len(),
            prompt.len()
        );

        match scenario {
            MockScenario::Timeout => {
                Err(BackendError::Timeout("Mock: API request timed out".to_string()).into())
            }
            MockScenario::RateLimit => Err(BackendError::RateLimit(
                "Mock: API rate limit exceeded (429)".to_string(),
            )
            .into()),
            MockScenario::InvalidResponse => Err(BackendError::InvalidResponse(
                "Mock: Invalid API response format".to_string(),
            )
            .into()),
            MockScenario::Error => {
                Err(BackendError::Other("Mock: Generic API error".to_string()).into())
            }
            MockScenario::Analysis => Ok(MOCK_ANALYSIS.to_string()),
            MockScenario::Success => Ok(Self::story_for(prompt).to_string()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn is_mock(&self) -> bool {
        true
    }
}
