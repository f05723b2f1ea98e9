//! Couple analysis domain: prompt building, response parsing and the
//! transport-independent bodies of every user action.

pub mod art;
pub mod coach;
pub mod emotion;
pub mod flow;
pub mod form;
pub mod music;
pub mod narrative;
pub mod vision;

#[cfg(test)]
pub(crate) mod fakes;

use serde::{Deserialize, Deserializer};

use crate::config::Config;
use crate::llm::provider::{GeneratedImage, ImageFormat};

use art::ImageProvider;
use emotion::EmotionProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.as_deref().map(Gender::parse).unwrap_or_default())
    }
}

/// One partner as fed to the narrative generators.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub gender: Gender,
    pub personality: String,
    pub mood: String,
    pub appearance: String,
    pub outfit: String,
    pub interests: String,
    pub emotion: EmotionProfile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub summary: String,
    pub score: u8,
    pub art_prompt: String,
    pub art_image: Option<GeneratedImage>,
    pub poem: Option<String>,
    pub emotions: [EmotionProfile; 2],
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub vision_model: String,
    pub text_model: String,
    pub art_model: String,
    /// Tried in order for every gallery image.
    pub gallery_providers: Vec<ImageProvider>,
}

impl ModelSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            vision_model: config.vision_model.clone(),
            text_model: config.text_model.clone(),
            art_model: config.art_model.clone(),
            gallery_providers: vec![
                ImageProvider::new(&config.gallery_model, ImageFormat::Base64),
                ImageProvider::new(&config.art_model, ImageFormat::Url),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("📸 Upload or capture your couple photo first.")]
    NoPhoto,
    #[error("⚠️ Please upload a photo with exactly two people.")]
    WrongPersonCount(usize),
    #[error("Please fill in both names and descriptions!")]
    MissingProfileFields,
    #[error("💌 Please run 'Generate Pairfect Analysis' in Compatibility & Art first!")]
    AnalysisRequired,
    #[error("🚫 Access Denied. Please enter the correct password to continue.")]
    GalleryLocked,
    #[error("Please upload exactly 3 photos for the full Love Art Gallery experience 💞 (received {0})")]
    WrongGalleryPhotoCount(usize),
}

/// Accepts strings, numbers and nulls where the vision model promised a string.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_labels_are_normalised() {
        assert_eq!(Gender::parse(" Female "), Gender::Female);
        assert_eq!(Gender::parse("MALE"), Gender::Male);
        assert_eq!(Gender::parse("male/female"), Gender::Unknown);
        let parsed: Gender = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, Gender::Unknown);
    }

    #[test]
    fn gallery_tries_inline_model_before_url_model() {
        let config = Config::from_lookup(|name| match name {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "BOT_TOKEN" => Some("1:abc".to_string()),
            _ => None,
        })
        .unwrap();
        let models = ModelSettings::from_config(&config);
        let order: Vec<(&str, ImageFormat)> = models
            .gallery_providers
            .iter()
            .map(|provider| (provider.model.as_str(), provider.format))
            .collect();
        assert_eq!(
            order,
            vec![("gpt-image-1", ImageFormat::Base64), ("dall-e-3", ImageFormat::Url)]
        );
    }
}
