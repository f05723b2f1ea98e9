use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

use crate::config::VISION_PROMPT;
use crate::llm::provider::{ChatMessage, ChatModel};
use crate::pairfect::{lenient_string, Gender, ValidationError};

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid JSON object pattern"));

// Known accuracy limitation: these hint lists are culturally narrow. Kept as-is.
const MALE_HINTS: [&str; 4] = ["shirt", "beard", "short hair", "kurta"];
const FEMALE_HINTS: [&str; 4] = ["saree", "lipstick", "long hair", "dress"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Detection {
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mood: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub appearance: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub outfit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisionResult {
    pub count: usize,
    pub people: Vec<Detection>,
}

impl VisionResult {
    pub fn pair(&self) -> Result<(&Detection, &Detection), ValidationError> {
        match (self.count, self.people.as_slice()) {
            (2, [first, second]) => Ok((first, second)),
            _ => Err(ValidationError::WrongPersonCount(self.count)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisionOutcome {
    pub result: VisionResult,
    /// Non-fatal problem to show the user next to the (empty) result.
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairType {
    Mixed,
    Male,
    Female,
}

impl PairType {
    pub fn from_genders(first: Gender, second: Gender) -> Self {
        if first != second {
            PairType::Mixed
        } else if first == Gender::Male {
            PairType::Male
        } else {
            PairType::Female
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PairType::Mixed => "👫 Male + Female",
            PairType::Male => "👬 Male + Male",
            PairType::Female => "👭 Female + Female",
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawVision {
    #[serde(default, deserialize_with = "lenient_count")]
    count: usize,
    #[serde(default)]
    people: Vec<Detection>,
}

fn lenient_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().map(|count| count as usize).unwrap_or(0))
}

/// Greedy match from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.find(text).map(|found| found.as_str())
}

pub fn correct_genders(first: &mut Detection, second: &mut Detection) {
    if first.gender != second.gender {
        return;
    }

    let description = format!(
        "{} {} {} {}",
        first.appearance, first.outfit, second.appearance, second.outfit
    )
    .to_lowercase();
    let male = MALE_HINTS.iter().any(|hint| description.contains(hint));
    let female = FEMALE_HINTS.iter().any(|hint| description.contains(hint));

    let corrected = match (male, female) {
        (true, false) => Gender::Male,
        (false, true) => Gender::Female,
        _ => return,
    };
    first.gender = corrected;
    second.gender = corrected;
}

/// `Ok(empty)` when the reply has no JSON object, `Err` when the object is malformed.
pub fn parse_vision_reply(reply: &str) -> Result<VisionResult> {
    let Some(object) = extract_json_object(reply) else {
        return Ok(VisionResult::default());
    };

    let raw: RawVision = serde_json::from_str(object)?;
    let mut people = raw.people;

    if raw.count == 2 {
        match people.as_mut_slice() {
            [first, second] => correct_genders(first, second),
            other => {
                return Err(anyhow!(
                    "vision reply reported 2 people but described {}",
                    other.len()
                ))
            }
        }
    }

    people.truncate(2);
    Ok(VisionResult {
        count: raw.count,
        people,
    })
}

pub async fn analyze_couple_photo<C: ChatModel>(chat: &C, model: &str, photo: &[u8]) -> VisionOutcome {
    let messages = [ChatMessage::user_with_image(VISION_PROMPT, photo.to_vec())];
    let parsed = match chat.complete(model, &messages).await {
        Ok(reply) => parse_vision_reply(&reply),
        Err(err) => Err(err),
    };

    match parsed {
        Ok(result) => {
            info!("Vision analysis detected {} people", result.count);
            VisionOutcome {
                result,
                warning: None,
            }
        }
        Err(err) => {
            warn!("Vision analysis failed: {}", err);
            VisionOutcome {
                result: VisionResult::default(),
                warning: Some(format!("Vision analysis failed: {err}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairfect::fakes::FakeChat;

    fn detection(gender: Gender, appearance: &str, outfit: &str) -> Detection {
        Detection {
            gender,
            mood: "happy".to_string(),
            appearance: appearance.to_string(),
            outfit: outfit.to_string(),
        }
    }

    #[test]
    fn finds_json_inside_chatter() {
        let reply = "Sure! Here you go:\n```json\n{\"count\": 2,\n \"people\": [{\"gender\": \"male\"}, {\"gender\": \"female\"}]}\n```\nHope it helps.";
        let result = parse_vision_reply(reply).unwrap();
        assert_eq!(result.count, 2);
        assert_eq!(result.people[0].gender, Gender::Male);
        assert_eq!(result.people[1].gender, Gender::Female);
    }

    #[test]
    fn missing_json_yields_empty_result() {
        let result = parse_vision_reply("I can't analyze this image.").unwrap();
        assert_eq!(result, VisionResult::default());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_vision_reply("{count: two}").is_err());
    }

    #[test]
    fn count_of_two_without_two_people_is_an_error() {
        assert!(parse_vision_reply(r#"{"count": 2, "people": [{"gender": "male"}]}"#).is_err());
    }

    #[test]
    fn beard_turns_two_women_into_two_men() {
        let mut first = detection(Gender::Female, "full beard", "denim jacket");
        let mut second = detection(Gender::Female, "curly hair", "jeans");
        correct_genders(&mut first, &mut second);
        assert_eq!(first.gender, Gender::Male);
        assert_eq!(second.gender, Gender::Male);
    }

    #[test]
    fn saree_turns_two_men_into_two_women() {
        let mut first = detection(Gender::Male, "bindi", "red saree");
        let mut second = detection(Gender::Male, "braided", "LIPSTICK and gold");
        correct_genders(&mut first, &mut second);
        assert_eq!(first.gender, Gender::Female);
        assert_eq!(second.gender, Gender::Female);
    }

    #[test]
    fn conflicting_or_absent_hints_leave_genders_alone() {
        let mut first = detection(Gender::Female, "beard", "jacket");
        let mut second = detection(Gender::Female, "long hair", "coat");
        correct_genders(&mut first, &mut second);
        assert_eq!((first.gender, second.gender), (Gender::Female, Gender::Female));

        let mut first = detection(Gender::Male, "smiling", "coat");
        let mut second = detection(Gender::Male, "glasses", "scarf");
        correct_genders(&mut first, &mut second);
        assert_eq!((first.gender, second.gender), (Gender::Male, Gender::Male));
    }

    #[test]
    fn differing_genders_are_never_corrected() {
        let mut first = detection(Gender::Male, "beard", "kurta");
        let mut second = detection(Gender::Female, "short hair", "shirt");
        correct_genders(&mut first, &mut second);
        assert_eq!((first.gender, second.gender), (Gender::Male, Gender::Female));
    }

    #[test]
    fn correction_runs_while_parsing() {
        let reply = r#"{"count": 2, "people": [
            {"gender": "female", "mood": "joyful", "appearance": "beard", "outfit": "blazer"},
            {"gender": "female", "mood": "calm", "appearance": "bald", "outfit": "hoodie"}
        ]}"#;
        let result = parse_vision_reply(reply).unwrap();
        assert!(result.people.iter().all(|p| p.gender == Gender::Male));
    }

    #[test]
    fn only_two_people_pass_the_pair_check() {
        for count in [0usize, 1, 3] {
            let result = VisionResult {
                count,
                people: vec![Detection::default(); count.min(2)],
            };
            assert_eq!(result.pair(), Err(ValidationError::WrongPersonCount(count)));
        }
        let result = VisionResult {
            count: 2,
            people: vec![Detection::default(), Detection::default()],
        };
        assert!(result.pair().is_ok());
    }

    #[test]
    fn pair_labels() {
        assert_eq!(PairType::from_genders(Gender::Male, Gender::Female), PairType::Mixed);
        assert_eq!(PairType::from_genders(Gender::Male, Gender::Male), PairType::Male);
        assert_eq!(PairType::from_genders(Gender::Unknown, Gender::Unknown), PairType::Female);
        assert_eq!(PairType::Mixed.label(), "👫 Male + Female");
    }

    #[tokio::test]
    async fn transport_failure_is_a_warning_with_zero_people() {
        let chat = FakeChat::scripted(vec![Err("connection reset")]);
        let outcome = analyze_couple_photo(&chat, "gpt-4o", b"photo").await;
        assert_eq!(outcome.result.count, 0);
        assert!(outcome.warning.unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn sends_photo_with_the_fixed_prompt() {
        let chat = FakeChat::scripted(vec![Ok(r#"{"count": 1, "people": [{"gender": "male"}]}"#)]);
        let outcome = analyze_couple_photo(&chat, "gpt-4o", b"photo").await;
        assert_eq!(outcome.result.count, 1);
        assert!(outcome.warning.is_none());

        let calls = chat.calls();
        assert_eq!(calls[0].0, "gpt-4o");
        assert_eq!(calls[0].1[0].text, VISION_PROMPT);
        assert_eq!(calls[0].1[0].image.as_deref(), Some(&b"photo"[..]));
    }
}
