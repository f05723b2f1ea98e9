use anyhow::Result;
use teloxide::prelude::*;
use tracing::debug;

use crate::handlers::commands::navigate_handler;
use crate::handlers::render::{
    escape_html, language_keyboard, mood_keyboard, playlist_caption, playlist_keyboard,
    MUSIC_LANGUAGE_PREFIX, MUSIC_MOOD_PREFIX, NO_PLAYLIST_TEXT, VIEW_CALLBACK_PREFIX,
};
use crate::handlers::responses::send_html;
use crate::pairfect::flow;
use crate::pairfect::music::LANGUAGES;
use crate::session::View;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Navigate(View),
    MusicLanguage(String),
    MusicMood(String),
}

pub fn parse_callback(data: &str) -> Option<CallbackAction> {
    if let Some(slug) = data.strip_prefix(VIEW_CALLBACK_PREFIX) {
        return View::from_slug(slug).map(CallbackAction::Navigate);
    }
    if let Some(language) = data.strip_prefix(MUSIC_LANGUAGE_PREFIX) {
        return LANGUAGES
            .iter()
            .find(|known| known.eq_ignore_ascii_case(language))
            .map(|known| CallbackAction::MusicLanguage(known.to_string()));
    }
    data.strip_prefix(MUSIC_MOOD_PREFIX)
        .filter(|mood| !mood.is_empty())
        .map(|mood| CallbackAction::MusicMood(mood.to_string()))
}

async fn pick_language(bot: &Bot, state: &AppState, chat_id: ChatId, language: String) -> Result<()> {
    let shared = state.session(chat_id);
    let mut session = shared.lock().await;
    let max_length = state.config.telegram_max_length;

    if let Err(err) = session.require_analysis() {
        return send_html(bot, chat_id, &escape_html(&err.to_string()), max_length, None).await;
    }
    let text = format!("🎵 {} it is. Now choose a mood:", escape_html(&language));
    session.music_language = Some(language);
    send_html(bot, chat_id, &text, max_length, Some(mood_keyboard())).await
}

async fn pick_mood(bot: &Bot, state: &AppState, chat_id: ChatId, mood: String) -> Result<()> {
    let shared = state.session(chat_id);
    let session = shared.lock().await;
    let max_length = state.config.telegram_max_length;

    let Some(language) = session.music_language.clone() else {
        return send_html(bot, chat_id, "🎵 Choose your language first:", max_length, Some(language_keyboard()))
            .await;
    };

    match flow::select_playlist(&session, &language, &mood) {
        Ok(Some(link)) => {
            send_html(bot, chat_id, &playlist_caption(&link), max_length, playlist_keyboard(&link)).await
        }
        Ok(None) => send_html(bot, chat_id, NO_PLAYLIST_TEXT, max_length, None).await,
        Err(err) => send_html(bot, chat_id, &escape_html(&err.to_string()), max_length, None).await,
    }
}

pub async fn callback_handler(bot: Bot, state: AppState, query: CallbackQuery) -> Result<()> {
    let _ = bot.answer_callback_query(query.id.clone()).await;
    let (Some(data), Some(message)) = (query.data.as_deref(), query.message.as_ref()) else {
        return Ok(());
    };
    let chat_id = message.chat().id;

    let Some(action) = parse_callback(data) else {
        debug!("Ignoring unknown callback data {}", data);
        return Ok(());
    };

    match action {
        CallbackAction::Navigate(view) => navigate_handler(bot, state, chat_id, view).await,
        CallbackAction::MusicLanguage(language) => pick_language(&bot, &state, chat_id, language).await,
        CallbackAction::MusicMood(mood) => pick_mood(&bot, &state, chat_id, mood).await,
    }
}
