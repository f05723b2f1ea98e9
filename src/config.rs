use std::env;

pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMOTION_MODEL_URL: &str =
    "https://router.huggingface.co/hf-inference/models/j-hartmann/emotion-english-distilroberta-base";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not found; set it in the environment or in a .env file")]
    MissingVar(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub log_level: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub vision_model: String,
    pub text_model: String,
    pub art_model: String,
    pub gallery_model: String,
    pub image_size: String,
    pub huggingface_api_key: String,
    pub emotion_model_url: String,
    pub gallery_password: Option<String>,
    pub http_timeout_seconds: u64,
    pub telegram_max_length: usize,
    /// Problems found while loading, logged once logging is up.
    pub warnings: Vec<String>,
}

fn lookup_string<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).unwrap_or_else(|| default.to_string())
}

fn lookup_u64<F>(lookup: &F, name: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn lookup_usize<F>(lookup: &F, name: &str, default: usize) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn lookup_required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

/// Only square `NxN` sizes are accepted.
fn normalize_image_size(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    let square = trimmed
        .split_once('x')
        .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
        .is_some_and(|(w, h)| w > 0 && w == h);
    if square {
        return Ok(trimmed.to_string());
    }
    Err(format!(
        "Unsupported IMAGE_SIZE value '{value}'; defaulting to {DEFAULT_IMAGE_SIZE}."
    ))
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup_required(&lookup, "OPENAI_API_KEY")?;
        let bot_token = lookup_required(&lookup, "BOT_TOKEN")?;

        let mut warnings = Vec::new();
        let image_size =
            match normalize_image_size(&lookup_string(&lookup, "IMAGE_SIZE", DEFAULT_IMAGE_SIZE)) {
                Ok(size) => size,
                Err(warning) => {
                    warnings.push(warning);
                    DEFAULT_IMAGE_SIZE.to_string()
                }
            };

        // An unset secret keeps the gallery permanently locked.
        let gallery_password = lookup("LOVE_GALLERY_PASS");

        Ok(Config {
            bot_token,
            log_level: lookup_string(&lookup, "LOG_LEVEL", "info"),
            openai_api_key,
            openai_base_url: lookup_string(&lookup, "OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            vision_model: lookup_string(&lookup, "VISION_MODEL", "gpt-4o"),
            text_model: lookup_string(&lookup, "TEXT_MODEL", "gpt-4o-mini"),
            art_model: lookup_string(&lookup, "ART_MODEL", "dall-e-3"),
            gallery_model: lookup_string(&lookup, "GALLERY_MODEL", "gpt-image-1"),
            image_size,
            huggingface_api_key: lookup_string(&lookup, "HUGGINGFACE_API_KEY", ""),
            emotion_model_url: lookup_string(
                &lookup,
                "EMOTION_MODEL_URL",
                DEFAULT_EMOTION_MODEL_URL,
            ),
            gallery_password,
            http_timeout_seconds: lookup_u64(&lookup, "HTTP_TIMEOUT_SECONDS", 120),
            telegram_max_length: lookup_usize(&lookup, "TELEGRAM_MAX_LENGTH", 4000),
            warnings,
        })
    }
}

pub const VISION_PROMPT: &str = r#"Analyze this couple photo and return JSON:
{
  "count": number of people,
  "people": [
    {"gender": "male/female/unknown", "mood": "...", "appearance": "...", "outfit": "..."}
  ]
}"#;

pub const ART_DESCRIPTION_PROMPT: &str = "Look at the couple photo and write ONE vivid sentence I can use as an image prompt. Mention hair, outfits, pose, setting, vibe; keep faces recognizable; no JSON.";

pub const GALLERY_DEFAULT_DESCRIPTION: &str = "A smiling couple in a tender pose";

pub const GALLERY_STYLE_SUFFIX: &str = " — render as a cinematic romantic digital painting with warm, soft light, gentle bokeh, pastel glow, painterly brush strokes; keep faces recognizable.";

pub const COACH_SYSTEM_PROMPT: &str =
    "You are 'Pairfect Love Coach' — warm, empathetic, and insightful.";

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[("BOT_TOKEN", "123:abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("OPENAI_API_KEY")));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "   "),
            ("BOT_TOKEN", "123:abc"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("OPENAI_API_KEY")));
    }

    #[test]
    fn missing_gallery_password_is_not_fatal() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("BOT_TOKEN", "123:abc"),
        ]))
        .unwrap();
        assert!(config.gallery_password.is_none());
        assert_eq!(config.vision_model, "gpt-4o");
        assert_eq!(config.text_model, "gpt-4o-mini");
        assert_eq!(config.image_size, "1024x1024");
    }

    #[test]
    fn invalid_image_size_falls_back_to_square() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("BOT_TOKEN", "123:abc"),
            ("IMAGE_SIZE", "huge"),
        ]))
        .unwrap();
        assert_eq!(config.image_size, "1024x1024");
        assert_eq!(config.warnings.len(), 1);
        assert!(config.warnings[0].contains("huge"));
    }

    #[test]
    fn image_size_must_be_square() {
        let load = |size: &str| {
            Config::from_lookup(lookup_from(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("BOT_TOKEN", "123:abc"),
                ("IMAGE_SIZE", size),
            ]))
            .unwrap()
        };

        let square = load(" 512x512 ");
        assert_eq!(square.image_size, "512x512");
        assert!(square.warnings.is_empty());

        let wide = load("1792x1024");
        assert_eq!(wide.image_size, "1024x1024");
        assert_eq!(wide.warnings.len(), 1);

        assert_eq!(load("0x0").image_size, "1024x1024");
    }
}
