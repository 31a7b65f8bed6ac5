// src/lib.rs
//! Turns uploaded images and narrative preferences into a short story by
//! running a visual-analysis pass and a grounded story pass against a
//! multimodal generation backend.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::AppConfig;
pub use errors::{BackendError, ErrorCategory, StoryError};
pub use models::{ImageMetadata, NormalizedImage, Settings, Story};
