// src/config.rs
use crate::errors::StoryError;
use crate::services::mock::MockScenario;
use std::env;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MAX_IMAGE_SIZE_MB: u64 = 20;
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 2048;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Process configuration. Built once at startup and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub gemini_api_key: Option<String>,
    pub default_model: String,
    pub max_image_size_mb: u64,
    pub max_image_dimension: u32,
    pub mock_mode: bool,
    /// Default story-pass scenario for the mock backend.
    pub mock_scenario: Option<MockScenario>,
    pub bind_address: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            default_model: DEFAULT_MODEL.to_string(),
            max_image_size_mb: DEFAULT_MAX_IMAGE_SIZE_MB,
            max_image_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
            mock_mode: false,
            mock_scenario: None,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, StoryError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|key| !key.trim().is_empty());
        let default_model = lookup("GEMINI_MODEL")
            .filter(|model| !model.trim().is_empty())
            .unwrap_or(defaults.default_model);
        let max_image_size_mb = match lookup("MAX_IMAGE_SIZE_MB") {
            Some(raw) => parse_number("MAX_IMAGE_SIZE_MB", &raw)?,
            None => defaults.max_image_size_mb,
        };
        let max_image_dimension = match lookup("MAX_IMAGE_DIMENSION") {
            Some(raw) => parse_number("MAX_IMAGE_DIMENSION", &raw)?,
            None => defaults.max_image_dimension,
        };
        let mock_mode = ["TEST_MODE", "MOCK_GEMINI"]
            .into_iter()
            .any(|key| lookup(key).as_deref().is_some_and(is_truthy));
        let mock_scenario = lookup("MOCK_SCENARIO")
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| raw.parse::<MockScenario>())
            .transpose()?;
        let bind_address = lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address);

        Ok(Self {
            gemini_api_key,
            default_model,
            max_image_size_mb,
            max_image_dimension,
            mock_mode,
            mock_scenario,
            bind_address,
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T, StoryError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(StoryError::Configuration(format!(
            "{} must be a positive integer, got '{}'",
            key, raw
        ))),
    }
}
