use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ReplyParameters};
use tracing::{info, warn};

use crate::handlers::media::download_message_photo;
use crate::handlers::render::{escape_html, render_detections, view_keyboard};
use crate::handlers::responses::send_html;
use crate::pairfect::art::GalleryPhoto;
use crate::pairfect::flow::{self, GALLERY_PHOTO_COUNT};
use crate::session::View;
use crate::state::AppState;
use crate::utils::telegram::ChatActionGuard;
use crate::utils::timing::{complete_command_timer, start_command_timer};

fn gallery_progress(count: usize) -> String {
    if count < GALLERY_PHOTO_COUNT {
        format!("📥 Memory {count}/{GALLERY_PHOTO_COUNT} received.")
    } else {
        "📥 All 3 memories received. Send /render to create your Love Art Gallery.".to_string()
    }
}

/// A photo is a gallery memory in the gallery view and the couple photo everywhere else.
pub async fn photo_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let chat_id = message.chat.id;
    let max_length = state.config.telegram_max_length;
    let mut timer = start_command_timer("photo", &message);

    // Held across the download so uploads in one chat apply in arrival order.
    let shared = state.session(chat_id);
    let mut session = shared.lock().await;

    let photo = match download_message_photo(&bot, &state.config.bot_token, &message).await {
        Ok(photo) => photo,
        Err(err) => {
            warn!("Photo download failed: {err}");
            complete_command_timer(&mut timer, "error", Some(err.to_string()));
            send_html(&bot, chat_id, &escape_html(&err.to_string()), max_length, None).await?;
            return Ok(());
        }
    };

    if session.view == View::Gallery {
        let queued = flow::queue_gallery_photo(
            &mut session,
            GalleryPhoto {
                name: photo.name,
                bytes: photo.bytes,
            },
        );
        let text = match queued {
            Ok(count) => gallery_progress(count),
            Err(err) => escape_html(&err.to_string()),
        };
        complete_command_timer(&mut timer, "gallery_photo", None);
        return send_html(&bot, chat_id, &text, max_length, None).await;
    }

    session.navigate(View::CompatibilityArt);
    let status = bot
        .send_message(chat_id, "Analyzing your photo with Vision AI...")
        .reply_parameters(ReplyParameters::new(message.id))
        .await?;
    let typing = ChatActionGuard::start(&bot, chat_id, ChatAction::Typing);
    let outcome =
        flow::handle_photo_upload(&mut session, state.openai.as_ref(), &state.models, &photo.bytes)
            .await;
    drop(typing);
    let _ = bot.delete_message(chat_id, status.id).await;

    if let Some(warning) = &outcome.warning {
        send_html(&bot, chat_id, &format!("⚠️ {}", escape_html(warning)), max_length, None).await?;
    }

    match outcome.pair {
        Ok((pair_type, detections)) => {
            info!("Couple photo accepted (fresh={})", outcome.fresh);
            let mut text = String::new();
            if !outcome.fresh {
                text.push_str("Same photo as before, keeping your profiles.\n\n");
            }
            text.push_str(&render_detections(pair_type, &detections));
            complete_command_timer(&mut timer, "success", None);
            send_html(&bot, chat_id, &text, max_length, Some(view_keyboard(session.view))).await
        }
        Err(err) => {
            complete_command_timer(&mut timer, "rejected", Some(format!("{err:?}")));
            send_html(&bot, chat_id, &escape_html(&err.to_string()), max_length, None).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gallery_progress_counts_towards_three() {
        assert_eq!(gallery_progress(1), "📥 Memory 1/3 received.");
        assert!(gallery_progress(3).contains("/render"));
    }
}
