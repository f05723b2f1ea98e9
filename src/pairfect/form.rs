use crate::pairfect::emotion::EmotionProfile;
use crate::pairfect::vision::Detection;
use crate::pairfect::Person;

/// User-edited profile fields; detected fields fall back to the vision result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub personality: String,
    pub mood: Option<String>,
    pub appearance: Option<String>,
    pub outfit: Option<String>,
    pub interests: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormUpdate {
    pub applied: Vec<&'static str>,
    pub unknown: Vec<String>,
}

fn field_name(key: &str) -> Option<&'static str> {
    match key.trim().to_lowercase().as_str() {
        "name" => Some("name"),
        "personality" | "desc" | "description" => Some("personality"),
        "mood" => Some("mood"),
        "appearance" => Some("appearance"),
        "outfit" => Some("outfit"),
        "interests" | "interest" => Some("interests"),
        _ => None,
    }
}

fn detected_or(edited: &Option<String>, detected: &str) -> String {
    edited.clone().unwrap_or_else(|| detected.to_string())
}

impl ProfileForm {
    /// Applies `key: value` lines; blank lines are skipped.
    pub fn apply(&mut self, text: &str) -> FormUpdate {
        let mut update = FormUpdate::default();

        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let Some((key, value)) = line.split_once(':') else {
                update.unknown.push(line.to_string());
                continue;
            };
            let Some(field) = field_name(key) else {
                update.unknown.push(key.trim().to_string());
                continue;
            };

            let value = value.trim().to_string();
            match field {
                "name" => self.name = value,
                "personality" => self.personality = value,
                "mood" => self.mood = Some(value),
                "appearance" => self.appearance = Some(value),
                "outfit" => self.outfit = Some(value),
                _ => self.interests = value,
            }
            if !update.applied.contains(&field) {
                update.applied.push(field);
            }
        }

        update
    }

    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.personality.trim().is_empty()
    }

    pub fn to_person(&self, detection: &Detection) -> Person {
        Person {
            name: self.name.trim().to_string(),
            gender: detection.gender,
            personality: self.personality.clone(),
            mood: detected_or(&self.mood, &detection.mood),
            appearance: detected_or(&self.appearance, &detection.appearance),
            outfit: detected_or(&self.outfit, &detection.outfit),
            interests: self.interests.clone(),
            emotion: EmotionProfile::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairfect::Gender;

    #[test]
    fn applies_known_keys_and_reports_unknown_ones() {
        let mut form = ProfileForm::default();
        let update = form.apply(
            "Name: Asha\n\
             desc: Curious, loves sunsets: and tea\n\
             hobby: chess\n\
             just some words\n\
             \n\
             Interests: painting",
        );
        assert_eq!(form.name, "Asha");
        assert_eq!(form.personality, "Curious, loves sunsets: and tea");
        assert_eq!(form.interests, "painting");
        assert_eq!(update.applied, vec!["name", "personality", "interests"]);
        assert_eq!(update.unknown, vec!["hobby".to_string(), "just some words".to_string()]);
    }

    #[test]
    fn later_updates_keep_earlier_fields() {
        let mut form = ProfileForm::default();
        form.apply("name: Ravi");
        form.apply("personality: calm and kind");
        assert!(form.is_complete());
        assert_eq!(form.name, "Ravi");
    }

    #[test]
    fn blank_fields_are_incomplete() {
        let mut form = ProfileForm::default();
        form.apply("name: Ravi\npersonality:   ");
        assert!(!form.is_complete());
    }

    #[test]
    fn detected_fields_fill_the_gaps() {
        let detection = Detection {
            gender: Gender::Female,
            mood: "joyful".to_string(),
            appearance: "long hair".to_string(),
            outfit: "saree".to_string(),
        };
        let mut form = ProfileForm::default();
        form.apply("name: Asha\npersonality: warm\noutfit: blue saree");
        let person = form.to_person(&detection);
        assert_eq!(person.gender, Gender::Female);
        assert_eq!(person.mood, "joyful");
        assert_eq!(person.appearance, "long hair");
        assert_eq!(person.outfit, "blue saree");
    }
}
