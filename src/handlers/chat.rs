use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tracing::error;

use crate::handlers::render::escape_html;
use crate::handlers::responses::send_html;
use crate::pairfect::flow::{self, FlowError};
use crate::session::View;
use crate::state::AppState;
use crate::utils::telegram::ChatActionGuard;

fn hint_for(view: View) -> &'static str {
    match view {
        View::CompatibilityArt => {
            "Send a couple photo, then fill in profiles with /me and /partner."
        }
        View::Gallery => "Send photos for the gallery, or /unlock <code>password</code> first.",
        _ => "Use the buttons or /help to continue.",
    }
}

/// Plain text is a Love Coach question in the coach view and a hint elsewhere.
pub async fn text_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let Some(text) = message.text().map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let max_length = state.config.telegram_max_length;
    let shared = state.session(chat_id);
    let mut session = shared.lock().await;

    if session.view != View::LoveCoachChat {
        return send_html(&bot, chat_id, hint_for(session.view), max_length, None).await;
    }

    let typing = ChatActionGuard::start(&bot, chat_id, ChatAction::Typing);
    let reply = flow::coach_turn(&mut session, state.openai.as_ref(), &state.models, text).await;
    drop(typing);

    let response = match reply {
        Ok(reply) => format!("<b>💌 Coach</b>\n{}", escape_html(&reply)),
        Err(FlowError::Validation(err)) => escape_html(&err.to_string()),
        Err(err) => {
            error!("Love Coach reply failed: {err}");
            escape_html(&err.to_string())
        }
    };
    send_html(&bot, chat_id, &response, max_length, None).await
}
