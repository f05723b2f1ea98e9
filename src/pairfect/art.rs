use tracing::{info, warn};

use crate::config::{ART_DESCRIPTION_PROMPT, GALLERY_DEFAULT_DESCRIPTION, GALLERY_STYLE_SUFFIX};
use crate::llm::provider::{ChatMessage, ChatModel, GeneratedImage, ImageFormat, ImageModel};
use crate::pairfect::ModelSettings;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Image generation failed: {0}")]
pub struct ImageGenerationError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageProvider {
    pub model: String,
    pub format: ImageFormat,
}

impl ImageProvider {
    pub fn new(model: &str, format: ImageFormat) -> Self {
        Self {
            model: model.to_string(),
            format,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GalleryPhoto {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct GalleryItem {
    pub name: String,
    pub prompt: String,
    pub outcome: Result<GeneratedImage, ImageGenerationError>,
}

/// Square image from the URL-returning model, used for the analysis artwork.
pub async fn generate_art<I: ImageModel>(
    images: &I,
    model: &str,
    prompt: &str,
) -> Result<GeneratedImage, ImageGenerationError> {
    images
        .generate(model, prompt, ImageFormat::Url)
        .await
        .map_err(|err| ImageGenerationError(err.to_string()))
}

/// Tries each provider in order and returns the first image produced.
pub async fn generate_with_fallback<I: ImageModel>(
    images: &I,
    providers: &[ImageProvider],
    prompt: &str,
) -> Result<GeneratedImage, ImageGenerationError> {
    let mut failures = Vec::new();
    for provider in providers {
        match images.generate(&provider.model, prompt, provider.format).await {
            Ok(image) => {
                if !failures.is_empty() {
                    info!("Image generated by fallback model {}", provider.model);
                }
                return Ok(image);
            }
            Err(err) => {
                warn!("Image model {} failed: {}", provider.model, err);
                failures.push(format!("{}: {}", provider.model, err));
            }
        }
    }

    if failures.is_empty() {
        return Err(ImageGenerationError("no image providers configured".to_string()));
    }
    Err(ImageGenerationError(failures.join("; ")))
}

pub async fn describe_for_art<C: ChatModel>(chat: &C, model: &str, photo: &[u8]) -> String {
    let messages = [ChatMessage::user_with_image(ART_DESCRIPTION_PROMPT, photo.to_vec())];
    match chat.complete(model, &messages).await {
        Ok(description) if !description.trim().is_empty() => description.trim().to_string(),
        Ok(_) => GALLERY_DEFAULT_DESCRIPTION.to_string(),
        Err(err) => {
            warn!("Photo description failed, using default prompt: {}", err);
            GALLERY_DEFAULT_DESCRIPTION.to_string()
        }
    }
}

pub fn gallery_prompt(description: &str) -> String {
    format!("{description}{GALLERY_STYLE_SUFFIX}")
}

/// One artwork per photo, in upload order; failures stay attached to their photo.
pub async fn render_gallery<C: ChatModel, I: ImageModel>(
    chat: &C,
    images: &I,
    models: &ModelSettings,
    photos: &[GalleryPhoto],
) -> Vec<GalleryItem> {
    let mut items = Vec::with_capacity(photos.len());
    for photo in photos {
        let description = describe_for_art(chat, &models.text_model, &photo.bytes).await;
        let prompt = gallery_prompt(&description);
        let outcome = generate_with_fallback(images, &models.gallery_providers, &prompt).await;
        if let Err(err) = &outcome {
            warn!("Failed to generate art for {}: {}", photo.name, err);
        }
        items.push(GalleryItem {
            name: photo.name.clone(),
            prompt,
            outcome,
        });
    }
    items
}
