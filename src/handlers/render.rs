//! HTML text and keyboards for the five views. Every tag opened here closes on
//! the same line so long messages can be split between lines.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::pairfect::coach::{ChatRole, ChatTurn};
use crate::pairfect::emotion::EmotionProfile;
use crate::pairfect::form::{FormUpdate, ProfileForm};
use crate::pairfect::music::{PlaylistLink, LANGUAGES, MOODS};
use crate::pairfect::vision::{Detection, PairType};
use crate::pairfect::AnalysisResult;
use crate::session::View;

pub const VIEW_CALLBACK_PREFIX: &str = "view:";
pub const MUSIC_LANGUAGE_PREFIX: &str = "music:lang:";
pub const MUSIC_MOOD_PREFIX: &str = "music:mood:";

const HEART_SLOTS: u8 = 10;
const GOLD_SCORE: u8 = 80;

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn wrap_lines(text: &str, open: &str, close: &str) -> String {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{open}{}{close}", escape_html(line))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn view_keyboard(current: View) -> InlineKeyboardMarkup {
    let buttons = View::ALL
        .iter()
        .map(|view| {
            let label = if *view == current {
                format!("• {}", view.title())
            } else {
                view.title().to_string()
            };
            InlineKeyboardButton::callback(label, format!("{VIEW_CALLBACK_PREFIX}{}", view.slug()))
        })
        .collect::<Vec<_>>();

    let rows = buttons
        .chunks(2)
        .map(|chunk| chunk.to_vec())
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// Ten hearts, filled to the nearest ten percent; gold from 80 up.
pub fn heart_meter(score: u8) -> String {
    let score = score.min(100);
    let filled = ((u16::from(score) + 5) / 10) as u8;
    let heart = if score < GOLD_SCORE { "❤️" } else { "💛" };
    let mut meter = heart.repeat(usize::from(filled));
    meter.push_str(&"🤍".repeat(usize::from(HEART_SLOTS - filled)));
    format!("{meter}\n<b>Compatibility Score: {score}%</b>")
}

pub fn pair_badge(pair_type: PairType) -> String {
    format!("<b>{}</b>", pair_type.label())
}

fn detection_lines(title: &str, detection: &Detection) -> String {
    format!(
        "<b>{}</b> ({})\nDetected mood: {}\nDetected appearance: {}\nDetected outfit: {}",
        escape_html(title),
        detection.gender.as_str(),
        escape_html(&detection.mood),
        escape_html(&detection.appearance),
        escape_html(&detection.outfit),
    )
}

pub fn render_detections(pair_type: PairType, detections: &[Detection; 2]) -> String {
    format!(
        "{}\n\n{}\n\n{}\n\n\
Tell me about you both, one <code>key: value</code> per line:\n\
<code>/me name: ...</code> then <code>personality: ...</code>\n\
<code>/partner name: ...</code> then <code>personality: ...</code>\n\
Optional keys: mood, appearance, outfit, interests.\n\
Then send /analyze.",
        pair_badge(pair_type),
        detection_lines("You", &detections[0]),
        detection_lines("Partner", &detections[1]),
    )
}

pub fn render_form_update(who: &str, form: &ProfileForm, update: &FormUpdate) -> String {
    let mut text = String::new();
    if update.applied.is_empty() {
        text.push_str(&format!("Nothing updated for {}.", escape_html(who)));
    } else {
        text.push_str(&format!(
            "✅ Updated {}: {}",
            escape_html(who),
            update.applied.join(", ")
        ));
    }
    if !update.unknown.is_empty() {
        let unknown = update
            .unknown
            .iter()
            .map(|key| escape_html(key))
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!("\nIgnored: {unknown}"));
    }
    if !form.is_complete() {
        text.push_str("\nStill needed: name and personality.");
    }
    text
}

fn dominant_emotion_line(name: &str, profile: &EmotionProfile) -> String {
    let top = profile
        .scores
        .get(&profile.dominant)
        .map(|score| format!(" ({score:.2}%)"))
        .unwrap_or_default();
    format!("{}: {}{}", escape_html(name), escape_html(&profile.dominant), top)
}

pub fn render_analysis(names: [&str; 2], analysis: &AnalysisResult) -> String {
    let mut text = String::from("✅ Pairfect Analysis Complete!\n\n<b>💞 AI Compatibility Insights</b>\n");
    text.push_str(&escape_html(&analysis.summary));
    text.push_str("\n\n");
    text.push_str(&heart_meter(analysis.score));
    text.push_str("\n\n<b>🎭 Dominant emotions</b>\n");
    text.push_str(&dominant_emotion_line(names[0], &analysis.emotions[0]));
    text.push('\n');
    text.push_str(&dominant_emotion_line(names[1], &analysis.emotions[1]));
    text.push_str("\n\n<b>🎨 Art Prompt</b>\n");
    text.push_str(&wrap_lines(&analysis.art_prompt, "<code>", "</code>"));
    if let Some(poem) = &analysis.poem {
        text.push_str("\n\n<b>📝 Poetic 'Pairfect Thought'</b>\n");
        text.push_str(&wrap_lines(poem, "<i>", "</i>"));
    }
    text
}

pub fn render_coach_history(history: &[ChatTurn]) -> String {
    if history.is_empty() {
        return "<b>🧠 Pairfect Love Coach</b>\nAsk me anything about your relationship.".to_string();
    }
    let mut text = String::from("<b>🧠 Pairfect Love Coach</b>");
    for turn in history {
        let speaker = match turn.role {
            ChatRole::User => "🙋 You",
            ChatRole::Assistant => "💌 Coach",
        };
        text.push_str(&format!("\n\n<b>{speaker}</b>\n{}", escape_html(&turn.text)));
    }
    text
}

pub fn language_keyboard() -> InlineKeyboardMarkup {
    let buttons = LANGUAGES
        .iter()
        .map(|language| {
            InlineKeyboardButton::callback(
                language.to_string(),
                format!("{MUSIC_LANGUAGE_PREFIX}{language}"),
            )
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(buttons.chunks(2).map(|chunk| chunk.to_vec()).collect::<Vec<_>>())
}

pub fn mood_keyboard() -> InlineKeyboardMarkup {
    let buttons = MOODS
        .iter()
        .map(|mood| {
            InlineKeyboardButton::callback(mood.to_string(), format!("{MUSIC_MOOD_PREFIX}{mood}"))
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(buttons.chunks(4).map(|chunk| chunk.to_vec()).collect::<Vec<_>>())
}

pub fn playlist_caption(link: &PlaylistLink) -> String {
    format!(
        "<b>💓 {} Vibes ({})</b>\n✨ Let the rhythm of love play on, and hearts dance to its tune... 💖",
        escape_html(&link.mood),
        escape_html(&link.language)
    )
}

pub fn playlist_keyboard(link: &PlaylistLink) -> Option<InlineKeyboardMarkup> {
    let url = link.open_url().ok()?;
    Some(InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
        "🎧 Open in Spotify",
        url,
    )]]))
}

pub const NO_PLAYLIST_TEXT: &str = "No playlist available for this combination yet 💔";

pub const WELCOME_TEXT: &str = "<b>💞 Pairfect</b>\n\
<i>Where Emotions Become Art &amp; Chemistry Finds Color</i>\n\n\
📸 Send a photo of the two of you to begin.\n\
Use the buttons below to move between views, or /help for commands.";

pub const HELP_TEXT: &str = "<b>Pairfect commands</b>\n\
/compat - Compatibility &amp; Art: send a couple photo, fill in profiles, analyze\n\
/me <code>key: value</code> - your profile (name, personality, mood, appearance, outfit, interests)\n\
/partner <code>key: value</code> - your partner's profile\n\
/analyze - compatibility summary, score, art and poem\n\
/coach - Love Coach chat; plain messages become questions\n\
/music - mood playlists in Tamil, English, Malayalam and Hindi\n\
/gallery - Love Art Gallery (password protected)\n\
/unlock <code>password</code> - unlock the gallery\n\
/render - turn 3 gallery photos into artworks\n\
/reset - forget the current photo and analysis\n\
/about - about Pairfect\n\
/help - show this message";

pub const ABOUT_TEXT: &str = "<b>🌸 About Pairfect</b>\n\
<i>Where Emotion Meets Innovation, and AI Paints the Language of Love 💫</i>\n\n\
<b>💞 Vision &amp; Purpose</b>\n\
Pairfect celebrates relationships with emotional AI: it reads couple dynamics, turns chemistry into art, \
suggests mood playlists and offers personal romantic coaching.\n\n\
<b>🚀 What it does</b>\n\
• <b>AI Compatibility Engine</b>: personalities, emotions and visual cues from your photo\n\
• <b>Vision AI</b>: mood, appearance and gender detection to personalise insights and art\n\
• <b>Love Coach Chat</b>: advice, conflict resolution and growth tips\n\
• <b>Mood Music</b>: Spotify playlists by mood and language\n\
• <b>Love Art Gallery</b>: your photos reimagined as romantic artworks\n\n\
<i>Pairfect isn't just built for love, it's built with love.</i>";

pub fn view_intro(view: View) -> &'static str {
    match view {
        View::CompatibilityArt => "<b>📸 Upload or Capture Your Couple Photo</b>\nSend a JPG or PNG photo of the two of you.",
        View::LoveCoachChat => "<b>🧠 Pairfect Love Coach</b>\nType a message to ask the coach.",
        View::MoodMusic => "<b>🎧 Your Personalized Romantic Vibes</b>\n🎵 Choose your language:",
        View::Gallery => "<b>🖼️ Love Art Gallery – Memories in Motion 💞</b>\n🔐 Send <code>/unlock password</code> to enter.",
        View::About => ABOUT_TEXT,
    }
}

pub const GALLERY_READY_TEXT: &str = "✅ Access Granted! Welcome to the Love Art Gallery 💞\n\
🎭 Every bond tells a story, let AI turn your love into digital art.\n\
Send exactly 3 photos, then /render.";

pub const GALLERY_DONE_TEXT: &str =
    "✨ Love captured, colors revealed: your art speaks the language of your heart 💖";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairfect::Gender;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callback_data(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn escapes_html_specials() {
        assert_eq!(escape_html("<b>Tom & 'Jerry'</b>"), "&lt;b&gt;Tom &amp; &#39;Jerry&#39;&lt;/b&gt;");
    }

    #[test]
    fn heart_meter_fills_and_turns_gold() {
        let low = heart_meter(42);
        assert!(low.starts_with(&"❤️".repeat(4)));
        assert!(low.contains(&"🤍".repeat(6)));
        assert!(low.ends_with("Compatibility Score: 42%</b>"));

        let high = heart_meter(85);
        assert!(high.starts_with(&"💛".repeat(9)));
        assert_eq!(heart_meter(100).matches("🤍").count(), 0);
        assert_eq!(heart_meter(0).matches("🤍").count(), 10);
    }

    #[test]
    fn view_keyboard_marks_the_current_view() {
        let markup = view_keyboard(View::MoodMusic);
        assert_eq!(
            callback_data(&markup),
            vec!["view:compat", "view:coach", "view:music", "view:gallery", "view:about"]
        );
        let labels: Vec<&str> = markup
            .inline_keyboard
            .iter()
            .flatten()
            .map(|button| button.text.as_str())
            .collect();
        assert_eq!(labels[2], "• 🎧 Mood Music");
        assert_eq!(labels[0], "🎨 Compatibility & Art");
    }

    #[test]
    fn music_keyboards_cover_every_option() {
        assert_eq!(callback_data(&language_keyboard()).len(), 4);
        let moods = callback_data(&mood_keyboard());
        assert_eq!(moods.len(), 8);
        assert_eq!(moods[0], "music:mood:Love");
    }

    #[test]
    fn multi_line_styles_close_on_each_line() {
        let analysis = AnalysisResult {
            summary: "Great <match>".to_string(),
            score: 82,
            art_prompt: "line one\nline two".to_string(),
            art_image: None,
            poem: Some("Roses\n\nViolets".to_string()),
            emotions: [EmotionProfile::default(), EmotionProfile::default()],
        };
        let text = render_analysis(["Asha", "Ravi"], &analysis);
        assert!(text.contains("Great &lt;match&gt;"));
        assert!(text.contains("<code>line one</code>\n<code>line two</code>"));
        assert!(text.contains("<i>Roses</i>\n\n<i>Violets</i>"));
        assert!(text.contains("Asha: neutral"));
        for line in text.lines() {
            assert_eq!(line.matches("<i>").count(), line.matches("</i>").count());
        }
    }

    #[test]
    fn analysis_without_poem_has_no_poem_section() {
        let analysis = AnalysisResult {
            summary: "ok".to_string(),
            score: 75,
            art_prompt: "p".to_string(),
            art_image: None,
            poem: None,
            emotions: [EmotionProfile::default(), EmotionProfile::default()],
        };
        assert!(!render_analysis(["A", "B"], &analysis).contains("Pairfect Thought"));
    }

    #[test]
    fn detections_show_badge_and_instructions() {
        let detections = [
            Detection {
                gender: Gender::Female,
                mood: "joyful".to_string(),
                appearance: "long hair".to_string(),
                outfit: "saree".to_string(),
            },
            Detection::default(),
        ];
        let text = render_detections(PairType::Mixed, &detections);
        assert!(text.starts_with("<b>👫 Male + Female</b>"));
        assert!(text.contains("Detected outfit: saree"));
        assert!(text.contains("/analyze"));
    }

    #[test]
    fn coach_history_alternates_speakers() {
        let history = vec![
            ChatTurn {
                role: ChatRole::User,
                text: "hi <3".to_string(),
            },
            ChatTurn {
                role: ChatRole::Assistant,
                text: "hello".to_string(),
            },
        ];
        let text = render_coach_history(&history);
        assert!(text.contains("🙋 You</b>\nhi &lt;3"));
        assert!(text.contains("💌 Coach</b>\nhello"));
    }

    #[test]
    fn form_update_reports_unknown_keys() {
        let mut form = ProfileForm::default();
        let update = form.apply("name: Asha\nhobby: chess");
        let text = render_form_update("you", &form, &update);
        assert!(text.contains("Updated you: name"));
        assert!(text.contains("Ignored: hobby"));
        assert!(text.contains("Still needed"));
    }
}
