use std::time::Duration;

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::llm::media::{detect_mime_type, truncate_for_log};
use crate::llm::provider::{ChatMessage, ChatModel, GeneratedImage, ImageFormat, ImageModel};
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    image_size: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

fn summarize_payload(payload: &Value) -> String {
    let model = payload
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let message_count = payload
        .get("messages")
        .and_then(|v| v.as_array())
        .map(|messages| messages.len())
        .unwrap_or(0);
    let image_parts = payload
        .get("messages")
        .and_then(|v| v.as_array())
        .map(|messages| {
            messages
                .iter()
                .filter_map(|message| message.get("content").and_then(|c| c.as_array()))
                .flatten()
                .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("image_url"))
                .count()
        })
        .unwrap_or(0);
    let prompt_chars = payload
        .get("prompt")
        .and_then(|v| v.as_str())
        .map(|prompt| prompt.chars().count());

    format!(
        "model={}, messages={}, images={}, prompt_chars={:?}",
        model, message_count, image_parts, prompt_chars
    )
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn build_message_content(message: &ChatMessage) -> Value {
    let Some(image) = message.image.as_ref() else {
        return Value::String(message.text.clone());
    };

    let mime_type = detect_mime_type(image).unwrap_or_else(|| "image/jpeg".to_string());
    let encoded = general_purpose::STANDARD.encode(image);
    json!([
        { "type": "text", "text": message.text },
        {
            "type": "image_url",
            "image_url": { "url": format!("data:{};base64,{}", mime_type, encoded) }
        }
    ])
}

fn build_chat_payload(model: &str, messages: &[ChatMessage]) -> Value {
    let messages: Vec<Value> = messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role.as_str(),
                "content": build_message_content(message),
            })
        })
        .collect();
    json!({ "model": model, "messages": messages })
}

fn build_image_payload(model: &str, prompt: &str, size: &str, format: ImageFormat) -> Value {
    let mut payload = json!({
        "model": model,
        "prompt": prompt,
        "size": size,
        "n": 1,
    });
    // Base64-only models reject `response_format`, so it is sent for URL requests only.
    if format == ImageFormat::Url {
        payload["response_format"] = json!("url");
    }
    payload
}

fn extract_chat_content(response: &Value) -> String {
    response
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string()
}

fn extract_generated_image(response: ImagesResponse, format: ImageFormat) -> Result<GeneratedImage> {
    let first = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No image data returned"))?;

    match format {
        ImageFormat::Base64 => {
            let encoded = first
                .b64_json
                .ok_or_else(|| anyhow!("Image response missing b64_json"))?;
            let bytes = general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|err| anyhow!("Failed to decode base64 image: {err}"))?;
            let mime_type = detect_mime_type(&bytes).unwrap_or_else(|| "image/png".to_string());
            Ok(GeneratedImage::Inline { mime_type, bytes })
        }
        ImageFormat::Url => first
            .url
            .filter(|url| !url.trim().is_empty())
            .map(GeneratedImage::Url)
            .ok_or_else(|| anyhow!("Image response missing url")),
    }
}

impl OpenAiClient {
    pub fn new(api_key: &str, base_url: &str, image_size: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            image_size: image_size.to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.openai_api_key,
            &config.openai_base_url,
            &config.image_size,
            Duration::from_secs(config.http_timeout_seconds),
        )
    }

    async fn call_api(&self, path: &str, payload: &Value) -> Result<Value> {
        debug!("OpenAI request {}: {}", path, summarize_payload(payload));

        let response = get_http_client()
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!("OpenAI API error: status={}, body={}", status, body_summary);
            let detail = message.unwrap_or(body_summary);
            return Err(anyhow!(
                "OpenAI request failed with status {}: {}",
                status,
                detail
            ));
        }

        Ok(response.json::<Value>().await?)
    }
}

impl ChatModel for OpenAiClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        if model.trim().is_empty() {
            return Err(anyhow!("Model identifier is required"));
        }
        let payload = build_chat_payload(model, messages);
        log_llm_timing("openai", model, "chat_completion", None, || async {
            let response = self.call_api("chat/completions", &payload).await?;
            let content = extract_chat_content(&response);
            if content.is_empty() {
                warn!(
                    "OpenAI chat response had empty content: {}",
                    truncate_for_log(&response.to_string(), 2000)
                );
            }
            Ok(content)
        })
        .await
    }
}

impl ImageModel for OpenAiClient {
    async fn generate(&self, model: &str, prompt: &str, format: ImageFormat) -> Result<GeneratedImage> {
        let payload = build_image_payload(model, prompt, &self.image_size, format);
        let metadata = json!({ "size": self.image_size, "format": format!("{:?}", format) });
        log_llm_timing("openai", model, "image_generation", Some(metadata), || async {
            let response = self.call_api("images/generations", &payload).await?;
            let parsed: ImagesResponse = serde_json::from_value(response)?;
            extract_generated_image(parsed, format)
        })
        .await
    }
}
