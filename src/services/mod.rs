// src/services/mod.rs
pub mod backend;
pub mod gemini;
pub mod image_processor;
pub mod mock;
pub mod prompt_builder;
pub mod story_service;
pub mod story_text;

pub use backend::{GenerationBackend, GenerationOutcome, connect_backend};
pub use gemini::GeminiBackend;
pub use image_processor::ImageProcessor;
pub use mock::{MockBackend, MockScenario};
pub use story_service::StoryService;
