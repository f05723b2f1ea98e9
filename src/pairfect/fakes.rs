use std::collections::{HashMap, VecDeque};

use anyhow::{anyhow, Result};
use parking_lot::Mutex;

use crate::llm::provider::{
    ChatMessage, ChatModel, EmotionClassifier, GeneratedImage, ImageFormat, ImageModel, LabelScore,
};

#[derive(Default)]
pub struct FakeClassifier {
    scores: Vec<LabelScore>,
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeClassifier {
    pub fn with_scores(scores: &[(&str, f64)]) -> Self {
        Self {
            scores: scores
                .iter()
                .map(|(label, score)| LabelScore {
                    label: label.to_string(),
                    score: *score,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl EmotionClassifier for FakeClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<LabelScore>> {
        self.calls.lock().push(text.to_string());
        if self.fail {
            return Err(anyhow!("classifier unavailable"));
        }
        Ok(self.scores.clone())
    }
}

/// Replies are handed out in order; an exhausted script fails the call.
#[derive(Default)]
pub struct FakeChat {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl FakeChat {
    pub fn scripted(replies: Vec<Result<&str, &str>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|reply| reply.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn push_reply(&self, reply: Result<&str, &str>) {
        self.replies
            .lock()
            .push_back(reply.map(str::to_string).map_err(str::to_string));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.calls.lock().clone()
    }
}

impl ChatModel for FakeChat {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().push((model.to_string(), messages.to_vec()));
        match self.replies.lock().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(err)) => Err(anyhow!(err)),
            None => Err(anyhow!("no scripted reply")),
        }
    }
}

/// Per-model queues of image results; an empty queue fails the call.
#[derive(Default)]
pub struct FakeImages {
    results: Mutex<HashMap<String, VecDeque<Result<GeneratedImage, String>>>>,
    calls: Mutex<Vec<(String, String, ImageFormat)>>,
}

impl FakeImages {
    pub fn push(&self, model: &str, result: Result<GeneratedImage, &str>) {
        self.results
            .lock()
            .entry(model.to_string())
            .or_default()
            .push_back(result.map_err(str::to_string));
    }

    pub fn calls(&self) -> Vec<(String, String, ImageFormat)> {
        self.calls.lock().clone()
    }
}

impl ImageModel for FakeImages {
    async fn generate(&self, model: &str, prompt: &str, format: ImageFormat) -> Result<GeneratedImage> {
        self.calls
            .lock()
            .push((model.to_string(), prompt.to_string(), format));
        let next = self
            .results
            .lock()
            .get_mut(model)
            .and_then(|queue| queue.pop_front());
        match next {
            Some(Ok(image)) => Ok(image),
            Some(Err(err)) => Err(anyhow!(err)),
            None => Err(anyhow!("no scripted image for {model}")),
        }
    }
}
