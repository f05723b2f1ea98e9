use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::llm::media::truncate_for_log;
use crate::llm::provider::{EmotionClassifier, LabelScore};
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

/// The emotion model scores seven labels: anger, disgust, fear, joy, neutral, sadness, surprise.
const EMOTION_LABEL_COUNT: usize = 7;

#[derive(Debug, Clone)]
pub struct HuggingFaceClassifier {
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RawLabelScore {
    label: String,
    score: f64,
}

/// Accepts both `[[{label, score}, ...]]` (batched) and `[{label, score}, ...]`.
fn parse_classification(value: Value) -> Result<Vec<LabelScore>> {
    let items = match value {
        Value::Array(outer) => {
            let batched = matches!(outer.first(), Some(Value::Array(_)));
            if !batched {
                outer
            } else {
                match outer.into_iter().next() {
                    Some(Value::Array(inner)) => inner,
                    _ => Vec::new(),
                }
            }
        }
        other => {
            if let Some(message) = other.get("error").and_then(|v| v.as_str()) {
                return Err(anyhow!("Emotion classifier error: {message}"));
            }
            return Err(anyhow!(
                "Unexpected classifier response: {}",
                truncate_for_log(&other.to_string(), 500)
            ));
        }
    };

    items
        .into_iter()
        .map(|item| {
            let raw: RawLabelScore = serde_json::from_value(item)?;
            Ok(LabelScore {
                label: raw.label,
                score: raw.score,
            })
        })
        .collect()
}

impl HuggingFaceClassifier {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.trim().to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.emotion_model_url,
            &config.huggingface_api_key,
            Duration::from_secs(config.http_timeout_seconds),
        )
    }

    async fn call_api(&self, text: &str) -> Result<Value> {
        debug!("Emotion classifier request: chars={}", text.chars().count());

        let mut request = get_http_client()
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&json!({
                "inputs": text,
                "parameters": { "top_k": EMOTION_LABEL_COUNT }
            }));
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(
                "Emotion classifier error: status={}, body={}",
                status,
                truncate_for_log(&body, 1000)
            );
            return Err(anyhow!("Emotion classifier failed with status {status}"));
        }

        Ok(response.json::<Value>().await?)
    }
}

impl EmotionClassifier for HuggingFaceClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<LabelScore>> {
        log_llm_timing("huggingface", "emotion", "text_classification", None, || async {
            let value = self.call_api(text).await?;
            parse_classification(value)
        })
        .await
    }
}
