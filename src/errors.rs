// src/errors.rs
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

/// Root failure kind shared by every stage of the story pipeline.
#[derive(Error, Debug)]
pub enum StoryError {
    #[error("Image validation failed: {0}")]
    ImageValidation(String),

    #[error("API configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Story generation failed: {0}")]
    Generation(String),
}

/// A failed call to the generation backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("API request timed out: {0}")]
    Timeout(String),

    #[error("API rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("API error: {0}")]
    Other(String),
}

/// User-facing category of a failure. One per taxonomy member, so callers
/// can branch without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Timeout,
    RateLimit,
    InvalidResponse,
    Backend,
    Generation,
}

impl ErrorCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "Image validation error",
            ErrorCategory::Configuration => "API configuration error",
            ErrorCategory::Timeout => "Request timed out",
            ErrorCategory::RateLimit => "Rate limit exceeded",
            ErrorCategory::InvalidResponse => "Invalid API response",
            ErrorCategory::Backend => "AI service error",
            ErrorCategory::Generation => "Story generation failed",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => {
                "Upload a JPEG, PNG or WebP image that is within the size limit."
            }
            ErrorCategory::Configuration => {
                "Check the Gemini API key (it should start with 'AIza') and the model setting."
            }
            ErrorCategory::Timeout => {
                "The API request took too long. Try again or check your internet connection."
            }
            ErrorCategory::RateLimit => {
                "You have exceeded the API rate limit. Wait a moment and try again."
            }
            ErrorCategory::InvalidResponse => {
                "The API returned an unexpected response. Try again."
            }
            ErrorCategory::Backend => "The AI service reported an error. Try again later.",
            ErrorCategory::Generation => "Try again with different images or settings.",
        }
    }
}

impl BackendError {
    /// Classifies a transport-level failure by keywords in its message.
    ///
    /// Checked in priority order: timeout, rate limit, malformed response.
    /// Anything else is a generic backend failure.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();

        if lowered.contains("timeout") || lowered.contains("timed out") {
            BackendError::Timeout(message)
        } else if lowered.contains("429") || lowered.contains("rate limit") || lowered.contains("quota")
        {
            BackendError::RateLimit(message)
        } else if lowered.contains("invalid")
            || lowered.contains("malformed")
            || lowered.contains("parse")
        {
            BackendError::InvalidResponse(message)
        } else {
            BackendError::Other(message)
        }
    }
}

impl StoryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            StoryError::ImageValidation(_) => ErrorCategory::Validation,
            StoryError::Configuration(_) => ErrorCategory::Configuration,
            StoryError::Backend(BackendError::Timeout(_)) => ErrorCategory::Timeout,
            StoryError::Backend(BackendError::RateLimit(_)) => ErrorCategory::RateLimit,
            StoryError::Backend(BackendError::InvalidResponse(_)) => ErrorCategory::InvalidResponse,
            StoryError::Backend(BackendError::Other(_)) => ErrorCategory::Backend,
            StoryError::Generation(_) => ErrorCategory::Generation,
        }
    }
}

impl ResponseError for StoryError {
    fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::Configuration => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCategory::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ErrorCategory::InvalidResponse => StatusCode::BAD_GATEWAY,
            ErrorCategory::Backend => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCategory::Generation => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let category = self.category();
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": category.label(),
            "message": self.to_string(),
            "hint": category.hint()
        }))
    }
}
