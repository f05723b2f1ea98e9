use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::pairfect::art::GalleryPhoto;
use crate::pairfect::coach::{ChatRole, ChatTurn, CoachContext};
use crate::pairfect::form::ProfileForm;
use crate::pairfect::vision::{Detection, PairType, VisionResult};
use crate::pairfect::{AnalysisResult, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    CompatibilityArt,
    LoveCoachChat,
    MoodMusic,
    Gallery,
    About,
}

impl View {
    pub const ALL: [View; 5] = [
        View::CompatibilityArt,
        View::LoveCoachChat,
        View::MoodMusic,
        View::Gallery,
        View::About,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            View::CompatibilityArt => "compat",
            View::LoveCoachChat => "coach",
            View::MoodMusic => "music",
            View::Gallery => "gallery",
            View::About => "about",
        }
    }

    pub fn from_slug(slug: &str) -> Option<View> {
        View::ALL.into_iter().find(|view| view.slug() == slug)
    }

    pub fn title(self) -> &'static str {
        match self {
            View::CompatibilityArt => "🎨 Compatibility & Art",
            View::LoveCoachChat => "🧠 Love Coach Chat",
            View::MoodMusic => "🎧 Mood Music",
            View::Gallery => "🖼️ Love Art Gallery",
            View::About => "ℹ️ About Pairfect",
        }
    }
}

/// Content-derived identity of an uploaded photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Fingerprint(hasher.finish())
    }
}

/// Everything one chat remembers between messages.
#[derive(Debug, Default)]
pub struct Session {
    pub view: View,
    pub photo_fingerprint: Option<Fingerprint>,
    pub vision: Option<VisionResult>,
    pub pair_type: Option<PairType>,
    pub forms: [ProfileForm; 2],
    pub analysis: Option<AnalysisResult>,
    pub coach_context: Option<CoachContext>,
    pub chat_history: Vec<ChatTurn>,
    pub gallery_unlocked: bool,
    pub gallery_photos: Vec<GalleryPhoto>,
    pub music_language: Option<String>,
}

impl Session {
    pub fn navigate(&mut self, view: View) {
        self.view = view;
    }

    /// Records `fingerprint`; returns true and wipes photo-derived state when it is new.
    pub fn register_photo(&mut self, fingerprint: Fingerprint) -> bool {
        if self.photo_fingerprint == Some(fingerprint) && self.vision.is_some() {
            return false;
        }
        self.reset_photo_state();
        self.photo_fingerprint = Some(fingerprint);
        true
    }

    /// Forgets the current photo entirely, as if nothing had been uploaded.
    pub fn clear_photo(&mut self) {
        self.reset_photo_state();
        self.photo_fingerprint = None;
    }

    fn reset_photo_state(&mut self) {
        self.chat_history.clear();
        self.coach_context = None;
        self.analysis = None;
        self.pair_type = None;
        self.vision = None;
        self.forms = Default::default();
        self.gallery_photos.clear();
    }

    pub fn detected_pair(&self) -> Result<(&Detection, &Detection), ValidationError> {
        self.vision
            .as_ref()
            .ok_or(ValidationError::NoPhoto)?
            .pair()
    }

    pub fn require_analysis(&self) -> Result<&AnalysisResult, ValidationError> {
        self.analysis.as_ref().ok_or(ValidationError::AnalysisRequired)
    }

    pub fn record_turn(&mut self, role: ChatRole, text: &str) {
        self.chat_history.push(ChatTurn {
            role,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_round_trip_through_slugs() {
        for view in View::ALL {
            assert_eq!(View::from_slug(view.slug()), Some(view));
        }
        assert_eq!(View::from_slug("settings"), None);
        assert_eq!(Session::default().view, View::CompatibilityArt);
    }

    #[test]
    fn navigation_only_changes_the_view() {
        let mut session = Session::default();
        session.record_turn(ChatRole::User, "hi");
        session.navigate(View::MoodMusic);
        assert_eq!(session.view, View::MoodMusic);
        assert_eq!(session.chat_history.len(), 1);
    }

    #[test]
    fn fingerprints_follow_content() {
        assert_eq!(Fingerprint::of(b"photo"), Fingerprint::of(b"photo"));
        assert_ne!(Fingerprint::of(b"photo"), Fingerprint::of(b"other"));
    }

    #[test]
    fn missing_photo_and_missing_analysis_are_validation_errors() {
        let session = Session::default();
        assert_eq!(session.detected_pair().unwrap_err(), ValidationError::NoPhoto);
        assert_eq!(
            session.require_analysis().unwrap_err(),
            ValidationError::AnalysisRequired
        );
    }

    #[test]
    fn clearing_the_photo_forgets_the_fingerprint() {
        let mut session = Session::default();
        session.register_photo(Fingerprint::of(b"a"));
        session.vision = Some(VisionResult::default());
        session.record_turn(ChatRole::Assistant, "hello");
        session.clear_photo();
        assert!(session.photo_fingerprint.is_none());
        assert!(session.vision.is_none());
        assert!(session.chat_history.is_empty());
    }
}
