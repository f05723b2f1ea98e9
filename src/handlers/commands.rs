use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ReplyParameters};
use tracing::{debug, error, info, warn};

use crate::handlers::access::{is_unlock_rate_limited, unlock_gallery};
use crate::handlers::render::{
    escape_html, language_keyboard, render_analysis, render_coach_history, render_detections,
    render_form_update, view_intro, view_keyboard, GALLERY_DONE_TEXT, GALLERY_READY_TEXT,
    HELP_TEXT, WELCOME_TEXT,
};
use crate::handlers::responses::{edit_text_with_retry, send_generated_image, send_html};
use crate::pairfect::flow::{self, FlowError};
use crate::pairfect::vision::PairType;
use crate::pairfect::ValidationError;
use crate::session::{Session, View};
use crate::state::AppState;
use crate::utils::telegram::ChatActionGuard;
use crate::utils::timing::{complete_command_timer, start_command_timer};

pub const ME_SLOT: usize = 0;
pub const PARTNER_SLOT: usize = 1;

const MUSIC_LOCKED_TEXT: &str = "💌 Please complete Compatibility &amp; Art to unlock Mood Music.";

async fn say(bot: &Bot, state: &AppState, chat_id: ChatId, text: &str) -> Result<()> {
    send_html(bot, chat_id, text, state.config.telegram_max_length, None).await
}

async fn say_error(bot: &Bot, state: &AppState, chat_id: ChatId, err: &ValidationError) -> Result<()> {
    say(bot, state, chat_id, &escape_html(&err.to_string())).await
}

/// Sends what the session's current view shows on entry.
pub async fn show_view(bot: &Bot, state: &AppState, chat_id: ChatId, session: &Session) -> Result<()> {
    let keyboard = Some(view_keyboard(session.view));
    let max_length = state.config.telegram_max_length;

    match session.view {
        View::CompatibilityArt => {
            let text = match session.detected_pair() {
                Ok((first, second)) => {
                    let pair_type = session
                        .pair_type
                        .unwrap_or_else(|| PairType::from_genders(first.gender, second.gender));
                    let mut text = render_detections(pair_type, &[first.clone(), second.clone()]);
                    if let Some(analysis) = &session.analysis {
                        text.push_str(&format!(
                            "\n\n💞 Current compatibility score: <b>{}%</b>",
                            analysis.score
                        ));
                    }
                    text
                }
                Err(_) => view_intro(View::CompatibilityArt).to_string(),
            };
            send_html(bot, chat_id, &text, max_length, keyboard).await
        }
        View::LoveCoachChat => {
            if session.coach_context.is_none() {
                let text = escape_html(&ValidationError::AnalysisRequired.to_string());
                return send_html(bot, chat_id, &text, max_length, keyboard).await;
            }
            send_html(bot, chat_id, &render_coach_history(&session.chat_history), max_length, keyboard)
                .await
        }
        View::MoodMusic => {
            if session.require_analysis().is_err() {
                return send_html(bot, chat_id, MUSIC_LOCKED_TEXT, max_length, keyboard).await;
            }
            send_html(bot, chat_id, view_intro(View::MoodMusic), max_length, Some(language_keyboard()))
                .await
        }
        View::Gallery => {
            let text = if !session.gallery_unlocked {
                view_intro(View::Gallery).to_string()
            } else if let Err(err) = session.require_analysis() {
                escape_html(&err.to_string())
            } else {
                format!(
                    "{GALLERY_READY_TEXT}\nQueued photos: {}",
                    session.gallery_photos.len()
                )
            };
            send_html(bot, chat_id, &text, max_length, keyboard).await
        }
        View::About => send_html(bot, chat_id, view_intro(View::About), max_length, keyboard).await,
    }
}

pub async fn navigate_handler(bot: Bot, state: AppState, chat_id: ChatId, view: View) -> Result<()> {
    let shared = state.session(chat_id);
    let mut session = shared.lock().await;
    session.navigate(view);
    info!("Chat {} navigated to {}", chat_id, view.slug());
    show_view(&bot, &state, chat_id, &session).await
}

pub async fn start_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let shared = state.session(message.chat.id);
    let mut session = shared.lock().await;
    session.navigate(View::CompatibilityArt);
    send_html(
        &bot,
        message.chat.id,
        WELCOME_TEXT,
        state.config.telegram_max_length,
        Some(view_keyboard(session.view)),
    )
    .await
}

pub async fn help_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    say(&bot, &state, message.chat.id, HELP_TEXT).await
}

pub async fn profile_handler(
    bot: Bot,
    state: AppState,
    message: Message,
    slot: usize,
    text: String,
) -> Result<()> {
    let chat_id = message.chat.id;
    let who = if slot == ME_SLOT { "you" } else { "your partner" };
    let shared = state.session(chat_id);
    let mut session = shared.lock().await;

    if let Err(err) = session.detected_pair() {
        return say_error(&bot, &state, chat_id, &err).await;
    }
    if text.trim().is_empty() {
        let command = if slot == ME_SLOT { "/me" } else { "/partner" };
        let usage = format!(
            "Usage: <code>{command} name: ...</code> with one <code>key: value</code> per line."
        );
        return say(&bot, &state, chat_id, &usage).await;
    }

    let form = &mut session.forms[slot];
    let update = form.apply(&text);
    let reply = render_form_update(who, form, &update);
    say(&bot, &state, chat_id, &reply).await
}

pub async fn analyze_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let chat_id = message.chat.id;
    let mut timer = start_command_timer("analyze", &message);
    let shared = state.session(chat_id);
    let mut session = shared.lock().await;

    let status = bot
        .send_message(chat_id, "Generating your Pairfect analysis... 💞")
        .reply_parameters(ReplyParameters::new(message.id))
        .await?;
    let typing = ChatActionGuard::start(&bot, chat_id, ChatAction::Typing);

    let outcome = flow::run_analysis(
        &mut session,
        state.openai.as_ref(),
        state.openai.as_ref(),
        state.classifier.as_ref(),
        &state.models,
    )
    .await;
    drop(typing);

    let warnings = match outcome {
        Ok(warnings) => warnings,
        Err(FlowError::Validation(err)) => {
            complete_command_timer(&mut timer, "rejected", Some(format!("{err:?}")));
            edit_text_with_retry(&bot, chat_id, status.id, &err.to_string(), None).await?;
            return Ok(());
        }
        Err(err) => {
            error!("Analysis failed: {err}");
            complete_command_timer(&mut timer, "error", Some(err.to_string()));
            edit_text_with_retry(&bot, chat_id, status.id, &format!("❌ {err}"), None).await?;
            return Ok(());
        }
    };

    let Some(analysis) = session.analysis.as_ref() else {
        return Ok(());
    };
    let names = [session.forms[0].name.trim(), session.forms[1].name.trim()];
    let _ = bot.delete_message(chat_id, status.id).await;
    send_html(
        &bot,
        chat_id,
        &render_analysis(names, analysis),
        state.config.telegram_max_length,
        None,
    )
    .await?;

    if let Some(image) = &analysis.art_image {
        let _upload = ChatActionGuard::start(&bot, chat_id, ChatAction::UploadPhoto);
        if let Err(err) = send_generated_image(&bot, chat_id, image, "🎨 Your Pairfect artwork").await {
            warn!("Failed to deliver analysis artwork: {err}");
            say(&bot, &state, chat_id, "⚠️ The artwork was generated but could not be delivered.").await?;
        }
    }

    for warning in &warnings {
        say(&bot, &state, chat_id, &format!("⚠️ {}", escape_html(warning))).await?;
    }
    send_html(
        &bot,
        chat_id,
        "Explore more with the buttons below.",
        state.config.telegram_max_length,
        Some(view_keyboard(session.view)),
    )
    .await?;

    let status = if warnings.is_empty() { "success" } else { "partial" };
    complete_command_timer(&mut timer, status, None);
    Ok(())
}

pub async fn unlock_handler(bot: Bot, state: AppState, message: Message, password: String) -> Result<()> {
    let chat_id = message.chat.id;
    let mut timer = start_command_timer("unlock", &message);

    // The password should not stay in the chat history.
    if let Err(err) = bot.delete_message(chat_id, message.id).await {
        warn!("Could not delete unlock message: {err}");
    }

    if is_unlock_rate_limited(chat_id.0) {
        complete_command_timer(&mut timer, "rate_limited", None);
        return say(&bot, &state, chat_id, "Please wait a moment before trying again.").await;
    }

    let shared = state.session(chat_id);
    let mut session = shared.lock().await;
    if !unlock_gallery(&mut session, state.config.gallery_password.as_deref(), &password) {
        complete_command_timer(&mut timer, "denied", None);
        return say_error(&bot, &state, chat_id, &ValidationError::GalleryLocked).await;
    }

    complete_command_timer(&mut timer, "success", None);
    session.navigate(View::Gallery);
    show_view(&bot, &state, chat_id, &session).await
}

pub async fn render_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let chat_id = message.chat.id;
    let mut timer = start_command_timer("render", &message);
    let shared = state.session(chat_id);
    let mut session = shared.lock().await;

    let queued = session.gallery_photos.len();
    if queued == flow::GALLERY_PHOTO_COUNT {
        say(
            &bot,
            &state,
            chat_id,
            "✅ Perfect! You've uploaded 3 beautiful memories. Let's turn them into AI art...",
        )
        .await?;
    }

    let upload = ChatActionGuard::start(&bot, chat_id, ChatAction::UploadPhoto);
    let result = flow::render_gallery_batch(
        &mut session,
        state.openai.as_ref(),
        state.openai.as_ref(),
        &state.models,
    )
    .await;

    let items = match result {
        Ok(items) => items,
        Err(err) => {
            drop(upload);
            complete_command_timer(&mut timer, "rejected", Some(format!("{err:?}")));
            return say_error(&bot, &state, chat_id, &err).await;
        }
    };

    let mut delivered = 0;
    for item in &items {
        debug!("Gallery prompt for {}: {}", item.name, item.prompt);
        let outcome = match &item.outcome {
            Ok(image) => send_generated_image(&bot, chat_id, image, &escape_html(&item.name))
                .await
                .map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };
        match outcome {
            Ok(()) => delivered += 1,
            Err(err) => {
                warn!("Gallery item {} failed: {}", item.name, err);
                let text = format!(
                    "Failed to generate art for {}: {}",
                    escape_html(&item.name),
                    escape_html(&err)
                );
                say(&bot, &state, chat_id, &text).await?;
            }
        }
    }
    drop(upload);

    if delivered > 0 {
        say(&bot, &state, chat_id, GALLERY_DONE_TEXT).await?;
    }
    let status = if delivered == items.len() { "success" } else { "partial" };
    complete_command_timer(&mut timer, status, Some(format!("delivered={delivered}")));
    Ok(())
}

pub async fn reset_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let chat_id = message.chat.id;
    let shared = state.session(chat_id);
    let mut session = shared.lock().await;
    session.clear_photo();
    session.navigate(View::CompatibilityArt);
    info!("Chat {} reset its photo", chat_id);
    send_html(
        &bot,
        chat_id,
        "🧹 Photo, profiles and analysis cleared. Send a new couple photo to start again.",
        state.config.telegram_max_length,
        Some(view_keyboard(session.view)),
    )
    .await
}
