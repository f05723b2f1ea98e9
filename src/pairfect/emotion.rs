use std::collections::BTreeMap;

use anyhow::Result;
use tracing::debug;

use crate::llm::provider::{EmotionClassifier, LabelScore};

pub const NEUTRAL_LABEL: &str = "neutral";
pub const CALM_LABEL: &str = "calm";
pub const CALM_KEYWORDS: [&str; 4] = ["calm", "peace", "relaxed", "serene"];

#[derive(Debug, Clone, PartialEq)]
pub struct EmotionProfile {
    /// Label → percentage, rounded to two decimals.
    pub scores: BTreeMap<String, f64>,
    pub dominant: String,
}

impl Default for EmotionProfile {
    fn default() -> Self {
        Self {
            scores: BTreeMap::new(),
            dominant: NEUTRAL_LABEL.to_string(),
        }
    }
}

fn to_percentage(score: f64) -> f64 {
    (score * 100.0 * 100.0).round() / 100.0
}

fn mentions_calm(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CALM_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

pub fn profile_from_scores(text: &str, scores: &[LabelScore]) -> EmotionProfile {
    let mut profile = EmotionProfile::default();
    let mut best: Option<(&str, f64)> = None;

    for entry in scores {
        let percentage = to_percentage(entry.score);
        profile.scores.insert(entry.label.clone(), percentage);
        // Ties keep the label the classifier listed first.
        if best.map_or(true, |(_, top)| percentage > top) {
            best = Some((entry.label.as_str(), percentage));
        }
    }

    if let Some((label, _)) = best {
        profile.dominant = label.to_string();
    }
    if mentions_calm(text) {
        profile.dominant = CALM_LABEL.to_string();
    }
    profile
}

pub async fn analyze_emotion<E: EmotionClassifier>(classifier: &E, text: &str) -> Result<EmotionProfile> {
    if text.trim().is_empty() {
        return Ok(EmotionProfile::default());
    }

    let scores = classifier.classify(text).await?;
    let profile = profile_from_scores(text, &scores);
    debug!(
        "Emotion profile: labels={}, dominant={}",
        profile.scores.len(),
        profile.dominant
    );
    Ok(profile)
}
