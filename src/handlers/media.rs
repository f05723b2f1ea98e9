use anyhow::{anyhow, Result};
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::warn;

use crate::llm::media::{detect_mime_type, download_media, is_supported_photo};

#[derive(Debug, Clone)]
pub struct IncomingPhoto {
    pub name: String,
    pub bytes: Vec<u8>,
}

pub async fn get_file_url(bot: &Bot, bot_token: &str, file_id: &FileId) -> Result<String> {
    let file = bot.get_file(file_id.clone()).await?;
    Ok(format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot_token, file.path
    ))
}

/// Largest size of a compressed photo, or an image sent as a document.
pub fn photo_reference(message: &Message) -> Option<(FileId, String)> {
    if let Some(photo) = message.photo().and_then(|sizes| sizes.last()) {
        return Some((photo.file.id.clone(), format!("photo_{}.jpg", message.id.0)));
    }

    let document = message.document()?;
    let is_image = document
        .mime_type
        .as_ref()
        .map(|mime| mime.essence_str().starts_with("image/"))
        .unwrap_or(false);
    if !is_image {
        return None;
    }
    let name = document
        .file_name
        .clone()
        .unwrap_or_else(|| format!("image_{}", message.id.0));
    Some((document.file.id.clone(), name))
}

pub fn has_photo(message: &Message) -> bool {
    photo_reference(message).is_some()
}

/// Downloads the message's photo; only JPEG and PNG are accepted.
pub async fn download_message_photo(
    bot: &Bot,
    bot_token: &str,
    message: &Message,
) -> Result<IncomingPhoto> {
    let (file_id, name) =
        photo_reference(message).ok_or_else(|| anyhow!("message carries no photo"))?;
    let url = get_file_url(bot, bot_token, &file_id).await?;
    let bytes = download_media(&url).await?;

    if !is_supported_photo(&bytes) {
        let detected = detect_mime_type(&bytes).unwrap_or_else(|| "unknown".to_string());
        warn!("Rejected upload {} with type {}", name, detected);
        return Err(anyhow!(
            "Unsupported image type ({detected}). Please send a JPG or PNG photo."
        ));
    }

    Ok(IncomingPhoto { name, bytes })
}
