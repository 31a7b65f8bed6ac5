// src/services/image_processor.rs
use crate::config::AppConfig;
use crate::errors::StoryError;
use crate::models::{ImageMetadata, NormalizedImage};
use image::{DynamicImage, GenericImageView, ImageFormat as ImgFormat};
use log::{debug, warn};
use std::io::{Read, Seek, SeekFrom};

pub const BYTES_PER_MB: u64 = 1024 * 1024;
pub const ACCEPTED_MEDIA_TYPES: [&str; 4] = ["jpeg", "jpg", "png", "webp"];

/// Validates uploads and normalizes them to bounded RGB images.
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    max_size_mb: u64,
    max_dimension: u32,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_MAX_IMAGE_SIZE_MB,
            crate::config::DEFAULT_MAX_IMAGE_DIMENSION,
        )
    }
}

impl ImageProcessor {
    pub fn new(max_size_mb: u64, max_dimension: u32) -> Self {
        Self {
            max_size_mb,
            max_dimension: max_dimension.max(1),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.max_image_size_mb, config.max_image_dimension)
    }

    /// Largest accepted upload, in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Strict single-image validation: size, declared media type, decode,
    /// then normalize.
    pub fn validate_image(
        &self,
        data: &[u8],
        media_type: &str,
        byte_length: usize,
    ) -> Result<(NormalizedImage, ImageMetadata), StoryError> {
        self.check_size(byte_length)?;

        if !is_accepted_media_type(media_type) {
            return Err(StoryError::ImageValidation(format!(
                "Invalid file type: {}. Supported types: {}",
                media_type,
                ACCEPTED_MEDIA_TYPES.join(", ")
            )));
        }

        let decoded = decode(data)?;
        let format = format_name(data);
        let normalized = self.normalize(decoded);

        let metadata = ImageMetadata {
            width: normalized.width(),
            height: normalized.height(),
            color_mode: normalized.color_mode().to_string(),
            format,
            file_size_bytes: byte_length,
        };

        debug!(
            "Validated {} image: {}x{}, {} bytes",
            metadata.format, metadata.width, metadata.height, metadata.file_size_bytes
        );

        Ok((normalized, metadata))
    }

    /// Best-effort validation of already-opened sources. Items that are too
    /// large or fail to decode are dropped rather than reported.
    pub fn validate_batch<R, I>(&self, sources: I) -> Vec<NormalizedImage>
    where
        R: Read + Seek,
        I: IntoIterator<Item = R>,
    {
        sources
            .into_iter()
            .enumerate()
            .filter_map(|(index, mut source)| match self.read_and_normalize(&mut source) {
                Ok(image) => Some(image),
                Err(e) => {
                    warn!("Skipping upload #{}: {}", index, e);
                    None
                }
            })
            .collect()
    }

    fn read_and_normalize<R: Read + Seek>(
        &self,
        source: &mut R,
    ) -> Result<NormalizedImage, StoryError> {
        let io_error = |e: std::io::Error| {
            StoryError::ImageValidation(format!("Failed to read upload: {}", e))
        };

        let size = source.seek(SeekFrom::End(0)).map_err(io_error)?;
        source.seek(SeekFrom::Start(0)).map_err(io_error)?;
        self.check_size(size as usize)?;

        let mut data = Vec::with_capacity(size as usize);
        source.read_to_end(&mut data).map_err(io_error)?;

        Ok(self.normalize(decode(&data)?))
    }

    pub fn check_size(&self, byte_length: usize) -> Result<(), StoryError> {
        if byte_length as u64 > self.max_size_bytes() {
            let size_mb = byte_length as f64 / BYTES_PER_MB as f64;
            return Err(StoryError::ImageValidation(format!(
                "Image file too large. Maximum size is {}MB, but file is {:.2}MB",
                self.max_size_mb, size_mb
            )));
        }
        Ok(())
    }

    /// Drops any alpha plane and shrinks to fit `max_dimension`, keeping the
    /// aspect ratio. Never enlarges.
    fn normalize(&self, img: DynamicImage) -> NormalizedImage {
        let (width, height) = img.dimensions();

        let img = if width > self.max_dimension || height > self.max_dimension {
            let resized = img.resize(
                self.max_dimension,
                self.max_dimension,
                image::imageops::FilterType::Lanczos3,
            );
            debug!(
                "Resized {}x{} to {}x{}",
                width,
                height,
                resized.width(),
                resized.height()
            );
            resized
        } else {
            img
        };

        let rgb = match img {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        };

        NormalizedImage::new(rgb)
    }
}

fn decode(data: &[u8]) -> Result<DynamicImage, StoryError> {
    if data.is_empty() {
        return Err(StoryError::ImageValidation(
            "Failed to process image: empty payload".to_string(),
        ));
    }
    image::load_from_memory(data)
        .map_err(|e| StoryError::ImageValidation(format!("Failed to process image: {}", e)))
}

fn is_accepted_media_type(media_type: &str) -> bool {
    let essence = media_type.split(';').next().unwrap_or_default().trim().to_lowercase();
    let subtype = essence.strip_prefix("image/").unwrap_or(&essence);
    ACCEPTED_MEDIA_TYPES.contains(&subtype)
}

fn format_name(data: &[u8]) -> String {
    match image::guess_format(data) {
        Ok(ImgFormat::Jpeg) => "JPEG".to_string(),
        Ok(ImgFormat::Png) => "PNG".to_string(),
        Ok(ImgFormat::WebP) => "WEBP".to_string(),
        Ok(other) => format!("{:?}", other).to_uppercase(),
        Err(_) => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut output = Vec::new();
        img.write_to(&mut Cursor::new(&mut output), ImgFormat::Png)
            .unwrap();
        output
    }

    #[test]
    fn media_type_check_is_case_insensitive() {
        assert!(is_accepted_media_type("image/JPEG"));
        assert!(is_accepted_media_type("image/jpg"));
        assert!(is_accepted_media_type("image/webp; charset=binary"));
        assert!(is_accepted_media_type("PNG"));
        assert!(!is_accepted_media_type("image/gif"));
        assert!(!is_accepted_media_type("text/plain"));
    }

    #[test]
    fn format_name_falls_back_to_unknown() {
        assert_eq!(format_name(b"not an image"), "Unknown");
        let png = png_bytes(DynamicImage::ImageRgb8(RgbImage::new(2, 2)));
        assert_eq!(format_name(&png), "PNG");
    }

    #[test]
    fn small_rgb_images_pass_through_unchanged() {
        let processor = ImageProcessor::new(20, 64);
        let source = RgbImage::from_pixel(10, 20, Rgb([1, 2, 3]));
        let normalized = processor.normalize(DynamicImage::ImageRgb8(source.clone()));
        assert_eq!(normalized.pixels(), &source);
    }

    #[test]
    fn alpha_is_discarded() {
        let processor = ImageProcessor::new(20, 64);
        let source = RgbaImage::from_pixel(16, 8, Rgba([10, 20, 30, 0]));
        let normalized = processor.normalize(DynamicImage::ImageRgba8(source));
        assert_eq!(normalized.dimensions(), (16, 8));
        assert_eq!(normalized.pixels().get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn huge_size_limit_saturates() {
        let processor = ImageProcessor::new(u64::MAX, 64);
        assert_eq!(processor.max_size_bytes(), u64::MAX);
        let png = png_bytes(DynamicImage::ImageRgb8(RgbImage::new(4, 4)));
        assert!(processor.validate_image(&png, "image/png", png.len()).is_ok());
    }

    #[test]
    fn empty_payload_is_a_validation_failure() {
        let processor = ImageProcessor::default();
        let err = processor.validate_image(&[], "image/png", 0).unwrap_err();
        assert!(matches!(err, StoryError::ImageValidation(_)));
        assert!(err.to_string().contains("empty payload"));
    }
}
