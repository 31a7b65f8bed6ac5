// src/models.rs
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};
use image::{ColorType, ImageEncoder, RgbImage, codecs::jpeg::JpegEncoder};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::StoryError;

const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl<'de> Deserialize<'de> for StoryLength {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&raw))
    }
}

impl StoryLength {
    /// Approximate word count requested from the generator.
    pub fn word_range(&self) -> &'static str {
        match self {
            StoryLength::Short => "300-500 words",
            StoryLength::Medium => "800-1200 words",
            StoryLength::Long => "1500+ words",
        }
    }

    /// Unrecognised classes fall back to medium.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "short" => StoryLength::Short,
            "long" => StoryLength::Long,
            _ => StoryLength::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    Light,
    Emotional,
    Dramatic,
    Dark,
    Inspirational,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tone::Light => "Light",
            Tone::Emotional => "Emotional",
            Tone::Dramatic => "Dramatic",
            Tone::Dark => "Dark",
            Tone::Inspirational => "Inspirational",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Perspective {
    #[serde(rename = "First person")]
    FirstPerson,
    #[default]
    #[serde(rename = "Third person limited")]
    ThirdPersonLimited,
    #[serde(rename = "Third person omniscient")]
    ThirdPersonOmniscient,
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Perspective::FirstPerson => "First person",
            Perspective::ThirdPersonLimited => "Third person limited",
            Perspective::ThirdPersonOmniscient => "Third person omniscient",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Audience {
    Kids,
    Teens,
    #[default]
    Adults,
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Audience::Kids => "Kids",
            Audience::Teens => "Teens",
            Audience::Adults => "Adults",
        };
        f.write_str(name)
    }
}

/// Narrative preferences for one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub genre: String,
    pub writing_style: String,
    pub tone: Tone,
    pub language: String,
    pub length: StoryLength,
    pub perspective: Perspective,
    pub audience: Audience,
    /// 1 (literal) to 10 (unconventional).
    pub creativity: u8,
    pub include_title: bool,
    pub include_chapters: bool,
    pub allow_emojis: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            genre: "Fantasy".to_string(),
            writing_style: "Cinematic".to_string(),
            tone: Tone::default(),
            language: "English".to_string(),
            length: StoryLength::default(),
            perspective: Perspective::default(),
            audience: Audience::default(),
            creativity: 7,
            include_title: true,
            include_chapters: false,
            allow_emojis: false,
        }
    }
}

/// A decoded image in three-channel RGB, bounded by the validator's maximum
/// dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    pixels: RgbImage,
}

impl NormalizedImage {
    pub(crate) fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Name of the colour encoding; always RGB.
    pub fn color_mode(&self) -> &'static str {
        "RGB"
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn to_jpeg(&self) -> Result<Vec<u8>, StoryError> {
        let mut output = Vec::new();
        JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY)
            .write_image(
                self.pixels.as_raw(),
                self.width(),
                self.height(),
                ColorType::Rgb8,
            )
            .map_err(|e| StoryError::Generation(format!("Failed to encode image: {}", e)))?;
        Ok(output)
    }

    pub fn to_base64_jpeg(&self) -> Result<String, StoryError> {
        Ok(general_purpose::STANDARD.encode(self.to_jpeg()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub color_mode: String,
    /// Source container, e.g. "JPEG", or "Unknown".
    pub format: String,
    pub file_size_bytes: usize,
}

/// The finished story handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub title: Option<String>,
    pub body: String,
    pub chapters_applied: bool,
}

impl Story {
    /// Title header (if any), a blank line, then the body.
    pub fn to_plain_text(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => format!("{}\n\n{}", title, self.body),
            _ => self.body.clone(),
        }
    }

    pub fn download_filename(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => format!("story_{}.txt", title.replace(' ', "_")),
            _ => "story_untitled.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryResponse {
    pub request_id: Uuid,
    pub images: Vec<ImageMetadata>,
    pub story: Story,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePreview {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub submitted: usize,
    pub accepted: usize,
    pub images: Vec<ImagePreview>,
}
