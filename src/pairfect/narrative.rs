use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::llm::provider::{ChatMessage, ChatModel};
use crate::pairfect::Person;

pub const DEFAULT_SCORE: u8 = 75;

// The sign is only honoured when it does not follow another digit, so "82-85/100" reads 85.
static SCORE_OUT_OF_100: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^0-9])(-?\d+)\s*/\s*100").expect("valid score pattern")
});
static SCORE_PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^0-9])(-?\d+)%").expect("valid percent pattern"));

pub fn build_summary_prompt(first: &Person, second: &Person) -> String {
    format!(
        "You are Pairfect AI – a romantic coach.\n\
Analyze chemistry between {} ({}) and {} ({}).\n\
{}: personality \"{}\", interests \"{}\", mood \"{}\", dominant emotion {}.\n\
{}: personality \"{}\", interests \"{}\", mood \"{}\", dominant emotion {}.\n\
Provide:\n\
1. Overview\n\
2. Compatibility Score XX/100\n\
3. Why they connect or differ\n\
4. Strengths and growth tip.",
        first.name,
        first.gender.as_str(),
        second.name,
        second.gender.as_str(),
        first.name,
        first.personality,
        first.interests,
        first.mood,
        first.emotion.dominant,
        second.name,
        second.personality,
        second.interests,
        second.mood,
        second.emotion.dominant,
    )
}

pub async fn generate_summary<C: ChatModel>(
    chat: &C,
    model: &str,
    first: &Person,
    second: &Person,
) -> Result<String> {
    let messages = [ChatMessage::user(build_summary_prompt(first, second))];
    Ok(chat.complete(model, &messages).await?.trim().to_string())
}

/// First "NN/100", else first "NN%", clamped to 0..=100; 75 when neither appears.
pub fn extract_score(text: &str) -> u8 {
    let captured = SCORE_OUT_OF_100
        .captures(text)
        .or_else(|| SCORE_PERCENT.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|digits| parse_saturating(digits.as_str()));

    match captured {
        Some(score) => score.clamp(0, 100) as u8,
        None => DEFAULT_SCORE,
    }
}

fn parse_saturating(digits: &str) -> i64 {
    digits.parse::<i64>().unwrap_or(if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    })
}

pub fn build_art_prompt(first: &Person, second: &Person) -> String {
    format!(
        "Dreamlike cinematic digital art of {} ({}) and {} ({}).\n\
{} is {} wearing {}.\n\
{} is {} wearing {}.\n\
Mood: {} and {}.\n\
A glowing romantic setting that represents their bond.",
        first.name,
        first.gender.as_str(),
        second.name,
        second.gender.as_str(),
        first.name,
        first.appearance,
        first.outfit,
        second.name,
        second.appearance,
        second.outfit,
        first.mood,
        second.mood,
    )
}

pub fn build_poem_prompt(first: &Person, second: &Person) -> String {
    format!(
        "Write a poetic 'Pairfect Thought' (4–6 lines) about:\n\
{} and {} — their moods {} & {}, appearances {} / {}, outfits {} / {}.",
        first.name,
        second.name,
        first.mood,
        second.mood,
        first.appearance,
        second.appearance,
        first.outfit,
        second.outfit,
    )
}

pub async fn generate_poem<C: ChatModel>(
    chat: &C,
    model: &str,
    first: &Person,
    second: &Person,
) -> Result<String> {
    let messages = [ChatMessage::user(build_poem_prompt(first, second))];
    Ok(chat.complete(model, &messages).await?.trim().to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pairfect::emotion::EmotionProfile;
    use crate::pairfect::fakes::FakeChat;
    use crate::pairfect::Gender;

    pub(crate) fn person(name: &str, gender: Gender) -> Person {
        Person {
            name: name.to_string(),
            gender,
            personality: format!("{name} loves long walks"),
            mood: "cheerful".to_string(),
            appearance: "curly hair".to_string(),
            outfit: "linen shirt".to_string(),
            interests: "hiking".to_string(),
            emotion: EmotionProfile::default(),
        }
    }

    #[test]
    fn score_out_of_100_wins() {
        assert_eq!(extract_score("Compatibility Score: 82/100"), 82);
        assert_eq!(extract_score("Score 64 / 100, about 90% sure"), 64);
    }

    #[test]
    fn percent_is_the_fallback_pattern() {
        assert_eq!(extract_score("They are a 91% match"), 91);
    }

    #[test]
    fn unparseable_text_defaults_to_75() {
        assert_eq!(extract_score("A wonderful couple with great chemistry."), 75);
        assert_eq!(extract_score(""), 75);
    }

    #[test]
    fn scores_are_clamped() {
        assert_eq!(extract_score("Compatibility Score: 150/100"), 100);
        assert_eq!(extract_score("Compatibility Score: 1000/100"), 100);
        assert_eq!(extract_score("A 1250% match"), 100);
        assert_eq!(extract_score("99999999999999999999999/100"), 100);
        assert_eq!(extract_score("Compatibility Score: -5/100"), 0);
        assert_eq!(extract_score("-5/100"), 0);
    }

    #[test]
    fn ranges_read_the_upper_bound() {
        assert_eq!(extract_score("Score: 82-85/100"), 85);
    }

    #[test]
    fn extraction_is_stable_on_repeat() {
        let text = "Compatibility Score: 82/100 and 91%";
        assert_eq!(extract_score(text), extract_score(text));
        assert_eq!(extract_score(text), 82);
    }

    #[test]
    fn art_prompt_is_a_fixed_template() {
        let prompt = build_art_prompt(&person("Asha", Gender::Female), &person("Ravi", Gender::Male));
        assert_eq!(
            prompt,
            "Dreamlike cinematic digital art of Asha (female) and Ravi (male).\n\
Asha is curly hair wearing linen shirt.\n\
Ravi is curly hair wearing linen shirt.\n\
Mood: cheerful and cheerful.\n\
A glowing romantic setting that represents their bond."
        );
    }

    #[tokio::test]
    async fn summary_prompt_asks_for_a_score_out_of_100() {
        let chat = FakeChat::scripted(vec![Ok("  Overview...\nCompatibility Score 88/100  ")]);
        let summary = generate_summary(
            &chat,
            "gpt-4o-mini",
            &person("Asha", Gender::Female),
            &person("Ravi", Gender::Male),
        )
        .await
        .unwrap();
        assert_eq!(summary, "Overview...\nCompatibility Score 88/100");

        let calls = chat.calls();
        let prompt = &calls[0].1[0].text;
        assert!(prompt.contains("Asha (female) and Ravi (male)"));
        assert!(prompt.contains("Compatibility Score XX/100"));
        assert!(prompt.contains("growth tip"));
    }

    #[tokio::test]
    async fn poem_prompt_mentions_both_people() {
        let chat = FakeChat::scripted(vec![Ok("Two hearts\nOne song\n")]);
        let poem = generate_poem(
            &chat,
            "gpt-4o-mini",
            &person("Asha", Gender::Female),
            &person("Ravi", Gender::Male),
        )
        .await
        .unwrap();
        assert_eq!(poem, "Two hearts\nOne song");
        let calls = chat.calls();
        assert!(calls[0].1[0].text.contains("Asha and Ravi"));
        assert!(calls[0].1[0].text.contains("(4–6 lines)"));
    }
}
