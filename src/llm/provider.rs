//! Seams between the Pairfect flows and the hosted models they call.
//!
//! Production code plugs in [`crate::llm::openai::OpenAiClient`] and
//! [`crate::llm::huggingface::HuggingFaceClassifier`]; tests plug in
//! in-memory fakes.

use std::future::Future;

use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    /// Raw bytes of a single image inlined next to the text.
    pub image: Option<Vec<u8>>,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
            image: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            image: None,
        }
    }

    pub fn user_with_image(text: impl Into<String>, image: Vec<u8>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            image: Some(image),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Hosted URL returned by the provider.
    Url,
    /// Inline base64 payload returned by the provider.
    Base64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    Url(String),
    Inline { mime_type: String, bytes: Vec<u8> },
}

pub trait EmotionClassifier: Send + Sync {
    /// Scores every emotion label for `text`, in the classifier's own order.
    fn classify(&self, text: &str) -> impl Future<Output = Result<Vec<LabelScore>>> + Send;
}

pub trait ChatModel: Send + Sync {
    fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> impl Future<Output = Result<String>> + Send;
}

pub trait ImageModel: Send + Sync {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        format: ImageFormat,
    ) -> impl Future<Output = Result<GeneratedImage>> + Send;
}
