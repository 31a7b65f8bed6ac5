// src/handlers.rs
use crate::models::*;
use crate::services::{ImageProcessor, MockScenario, StoryService};
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, http::header::ContentDisposition, web};
use bytes::BytesMut;
use futures_util::TryStreamExt;
use log::{info, warn};
use std::io::Cursor;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub story_service: Arc<StoryService>,
    pub image_processor: Arc<ImageProcessor>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/stories", web::post().to(create_story))
            .route("/stories/export", web::post().to(export_story))
            .route("/images/preview", web::post().to(preview_images)),
    )
    .route("/health", web::get().to(health_check));
}

struct UploadedField {
    name: String,
    content_type: String,
    data: BytesMut,
    /// Total bytes received, including any not kept in `data`.
    byte_length: usize,
}

impl UploadedField {
    fn is_oversized(&self, processor: &ImageProcessor) -> bool {
        processor.check_size(self.byte_length).is_err()
    }
}

/// What to do with a field that grows past the upload limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Oversized {
    /// Fail the request as soon as the limit is crossed.
    Reject,
    /// Stop buffering, drain the rest and let the caller skip it.
    Skip,
}

async fn read_fields(
    payload: &mut Multipart,
    processor: &ImageProcessor,
    oversized: Oversized,
) -> Result<Vec<UploadedField>, Error> {
    let mut fields = Vec::new();

    while let Some(mut field) = payload.try_next().await? {
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();

        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut data = BytesMut::new();
        let mut byte_length = 0usize;
        while let Some(chunk) = field.try_next().await? {
            byte_length += chunk.len();
            if let Err(e) = processor.check_size(byte_length) {
                if oversized == Oversized::Reject {
                    warn!("Rejecting field '{}' mid-upload: {}", name, e);
                    return Err(e.into());
                }
                data.clear();
                continue;
            }
            data.extend_from_slice(&chunk);
        }

        fields.push(UploadedField {
            name,
            content_type,
            data,
            byte_length,
        });
    }

    Ok(fields)
}

/// Multipart: optional `settings` JSON field, optional `mock_scenario` text
/// field, plus one or more image files.
pub async fn create_story(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let request_id = Uuid::new_v4();
    let mut settings = Settings::default();
    let mut scenario = None;
    let mut images = Vec::new();
    let mut metadata = Vec::new();

    for field in read_fields(&mut payload, &data.image_processor, Oversized::Reject).await? {
        match field.name.as_str() {
            "settings" => {
                settings = serde_json::from_slice(&field.data).map_err(|e| {
                    actix_web::error::ErrorBadRequest(format!("Invalid settings: {}", e))
                })?;
            }
            "mock_scenario" => {
                let raw = String::from_utf8_lossy(&field.data);
                scenario = Some(raw.parse::<MockScenario>().map_err(|e| {
                    actix_web::error::ErrorBadRequest(e.to_string())
                })?);
            }
            _ => {
                let (image, image_metadata) = data.image_processor.validate_image(
                    &field.data,
                    &field.content_type,
                    field.byte_length,
                )?;
                images.push(image);
                metadata.push(image_metadata);
            }
        }
    }

    info!(
        "Request {}: generating {} story from {} image(s)",
        request_id,
        settings.genre,
        images.len()
    );

    let story = data
        .story_service
        .generate_story_with_scenario(&images, &settings, scenario)
        .await?;

    Ok(HttpResponse::Ok().json(StoryResponse {
        request_id,
        images: metadata,
        story,
        generated_at: chrono::Utc::now(),
    }))
}

/// Best-effort listing of an upload batch; unreadable files are skipped.
pub async fn preview_images(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let processor = &data.image_processor;
    let fields = read_fields(&mut payload, processor, Oversized::Skip).await?;
    let submitted = fields.len();

    let sources = fields
        .into_iter()
        .filter(|field| {
            let keep = !field.is_oversized(processor);
            if !keep {
                warn!(
                    "Skipping oversized upload '{}' ({} bytes)",
                    field.name, field.byte_length
                );
            }
            keep
        })
        .map(|field| Cursor::new(field.data.freeze()));
    let accepted = processor.validate_batch(sources);

    let images: Vec<ImagePreview> = accepted
        .iter()
        .map(|image| ImagePreview {
            width: image.width(),
            height: image.height(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(PreviewResponse {
        submitted,
        accepted: images.len(),
        images,
    }))
}

pub async fn export_story(story: web::Json<Story>) -> HttpResponse {
    let story = story.into_inner();

    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header(ContentDisposition::attachment(story.download_filename()))
        .body(story.to_plain_text())
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "story-imager",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
