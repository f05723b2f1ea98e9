//! Bodies of the user actions, independent of the chat transport.
//!
//! Every function takes the chat's [`Session`] by `&mut`; callers hold the
//! session lock for the whole action so one upload finishes before the next
//! one is looked at.

use tracing::{info, warn};

use crate::llm::provider::{ChatModel, EmotionClassifier, ImageModel};
use crate::pairfect::art::{generate_art, render_gallery, GalleryItem, GalleryPhoto};
use crate::pairfect::coach::{love_coach_reply, ChatRole, CoachContext};
use crate::pairfect::emotion::analyze_emotion;
use crate::pairfect::music::{find_playlist, PlaylistLink};
use crate::pairfect::narrative::{build_art_prompt, extract_score, generate_poem, generate_summary};
use crate::pairfect::vision::{analyze_couple_photo, Detection, PairType};
use crate::pairfect::{AnalysisResult, ModelSettings, ValidationError};
use crate::session::{Fingerprint, Session};

pub const GALLERY_PHOTO_COUNT: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Emotion analysis failed: {0}")]
    Emotion(anyhow::Error),
    #[error("Compatibility analysis failed: {0}")]
    Summary(anyhow::Error),
    #[error("The Love Coach could not reply: {0}")]
    Coach(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// False when the photo matched the previous upload and cached results were reused.
    pub fresh: bool,
    pub warning: Option<String>,
    pub pair: Result<(PairType, [Detection; 2]), ValidationError>,
}

pub async fn handle_photo_upload<C: ChatModel>(
    session: &mut Session,
    chat: &C,
    models: &ModelSettings,
    photo: &[u8],
) -> UploadOutcome {
    let fresh = session.register_photo(Fingerprint::of(photo));
    let mut warning = None;

    if fresh {
        info!("New photo fingerprint; session reset before vision analysis");
        let outcome = analyze_couple_photo(chat, &models.vision_model, photo).await;
        warning = outcome.warning;
        session.vision = Some(outcome.result);
    }

    let pair = session
        .detected_pair()
        .map(|(first, second)| {
            (
                PairType::from_genders(first.gender, second.gender),
                [first.clone(), second.clone()],
            )
        });
    session.pair_type = pair.as_ref().ok().map(|(pair_type, _)| *pair_type);

    UploadOutcome {
        fresh,
        warning,
        pair,
    }
}

/// Runs "Generate Analysis". Artwork and poem failures become warnings.
pub async fn run_analysis<C, I, E>(
    session: &mut Session,
    chat: &C,
    images: &I,
    classifier: &E,
    models: &ModelSettings,
) -> Result<Vec<String>, FlowError>
where
    C: ChatModel,
    I: ImageModel,
    E: EmotionClassifier,
{
    let (mut first, mut second) = {
        let (first_detection, second_detection) = session.detected_pair()?;
        let [first_form, second_form] = &session.forms;
        if !first_form.is_complete() || !second_form.is_complete() {
            return Err(ValidationError::MissingProfileFields.into());
        }
        (
            first_form.to_person(first_detection),
            second_form.to_person(second_detection),
        )
    };
    let mut warnings = Vec::new();

    first.emotion = analyze_emotion(classifier, &first.personality)
        .await
        .map_err(FlowError::Emotion)?;
    second.emotion = analyze_emotion(classifier, &second.personality)
        .await
        .map_err(FlowError::Emotion)?;

    let summary = generate_summary(chat, &models.text_model, &first, &second)
        .await
        .map_err(FlowError::Summary)?;
    let score = extract_score(&summary);
    let art_prompt = build_art_prompt(&first, &second);

    let art_image = match generate_art(images, &models.art_model, &art_prompt).await {
        Ok(image) => Some(image),
        Err(err) => {
            warn!("Analysis artwork skipped: {}", err);
            warnings.push(err.to_string());
            None
        }
    };

    let poem = match generate_poem(chat, &models.text_model, &first, &second).await {
        Ok(poem) if !poem.is_empty() => Some(poem),
        Ok(_) => None,
        Err(err) => {
            warn!("Poem skipped: {}", err);
            warnings.push(format!("Poem generation failed: {err}"));
            None
        }
    };

    session.coach_context = Some(CoachContext {
        first_name: first.name.clone(),
        second_name: second.name.clone(),
        score,
        summary: summary.clone(),
    });
    session.analysis = Some(AnalysisResult {
        summary,
        score,
        art_prompt,
        art_image,
        poem,
        emotions: [first.emotion, second.emotion],
    });
    info!("Analysis complete: score={}", score);

    Ok(warnings)
}

/// One Love Coach exchange. The user turn is kept even when the reply fails.
pub async fn coach_turn<C: ChatModel>(
    session: &mut Session,
    chat: &C,
    models: &ModelSettings,
    message: &str,
) -> Result<String, FlowError> {
    let context = session
        .coach_context
        .clone()
        .ok_or(ValidationError::AnalysisRequired)?;

    session.record_turn(ChatRole::User, message);
    let reply = love_coach_reply(chat, &models.text_model, &context, message)
        .await
        .map_err(FlowError::Coach)?;
    session.record_turn(ChatRole::Assistant, &reply);
    Ok(reply)
}

pub fn select_playlist(
    session: &Session,
    language: &str,
    mood: &str,
) -> Result<Option<PlaylistLink>, ValidationError> {
    session.require_analysis()?;
    Ok(find_playlist(language, mood))
}

fn ensure_gallery_open(session: &Session) -> Result<(), ValidationError> {
    if !session.gallery_unlocked {
        return Err(ValidationError::GalleryLocked);
    }
    session.require_analysis()?;
    Ok(())
}

/// Queues a gallery photo and returns how many are waiting. A full queue turns extra photos away.
pub fn queue_gallery_photo(session: &mut Session, photo: GalleryPhoto) -> Result<usize, ValidationError> {
    ensure_gallery_open(session)?;
    let queued = session.gallery_photos.len();
    if queued >= GALLERY_PHOTO_COUNT {
        return Err(ValidationError::WrongGalleryPhotoCount(queued + 1));
    }
    session.gallery_photos.push(photo);
    Ok(session.gallery_photos.len())
}

/// Turns exactly three queued photos into artworks; the queue is emptied either way.
pub async fn render_gallery_batch<C: ChatModel, I: ImageModel>(
    session: &mut Session,
    chat: &C,
    images: &I,
    models: &ModelSettings,
) -> Result<Vec<GalleryItem>, ValidationError> {
    ensure_gallery_open(session)?;
    let photos = std::mem::take(&mut session.gallery_photos);
    if photos.len() != GALLERY_PHOTO_COUNT {
        return Err(ValidationError::WrongGalleryPhotoCount(photos.len()));
    }
    Ok(render_gallery(chat, images, models, &photos).await)
}
