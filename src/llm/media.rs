use anyhow::{anyhow, Result};
use tracing::warn;

use crate::utils::http::get_http_client;

const MEDIA_DOWNLOAD_ERROR_BODY_LIMIT: usize = 800;

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    infer::get(data).map(|kind| kind.mime_type().to_string())
}

pub fn is_supported_photo(data: &[u8]) -> bool {
    matches!(
        detect_mime_type(data).as_deref(),
        Some("image/jpeg") | Some("image/png")
    )
}

pub fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

pub async fn download_media(url: &str) -> Result<Vec<u8>> {
    let response = get_http_client().get(url).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!(
            "Media download failed with status {}: {}",
            status,
            truncate_for_log(&body, MEDIA_DOWNLOAD_ERROR_BODY_LIMIT)
        );
        return Err(anyhow!("media download failed with status {status}"));
    }

    Ok(response.bytes().await?.to_vec())
}
