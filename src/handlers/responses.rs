use std::time::Duration;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, InputFile, MessageId, ParseMode};
use tracing::warn;
use url::Url;

use crate::llm::provider::GeneratedImage;

/// Splits on line boundaries so HTML tags, which never span lines here, stay intact.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > max_chars {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

pub async fn edit_text_with_retry(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: &str,
    parse_mode: Option<ParseMode>,
) -> Result<()> {
    let mut delay = Duration::from_secs_f32(1.5);
    for attempt in 0..3 {
        let request = bot.edit_message_text(chat_id, message_id, text.to_string());
        let request = if let Some(mode) = parse_mode {
            request.parse_mode(mode)
        } else {
            request
        };

        match request.await {
            Ok(_) => return Ok(()),
            Err(err) => {
                if attempt == 2 {
                    return Err(err.into());
                }
                warn!("edit_message_text failed: {err}");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }

    Ok(())
}

/// Sends HTML in Telegram-sized chunks, retrying a chunk as plain text if it is rejected.
/// The keyboard rides on the last chunk.
pub async fn send_html(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    max_length: usize,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    let chunks = split_message(text, max_length);
    let last = chunks.len().saturating_sub(1);

    for (index, chunk) in chunks.into_iter().enumerate() {
        let markup = if index == last { keyboard.clone() } else { None };

        let mut request = bot
            .send_message(chat_id, chunk.clone())
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup.clone() {
            request = request.reply_markup(markup);
        }
        if let Err(err) = request.await {
            warn!("Failed to send formatted response: {err}");
            let mut plain = bot.send_message(chat_id, chunk);
            if let Some(markup) = markup {
                plain = plain.reply_markup(markup);
            }
            plain.await?;
        }
    }

    Ok(())
}

pub fn image_input(image: &GeneratedImage) -> Result<InputFile> {
    Ok(match image {
        GeneratedImage::Url(url) => InputFile::url(Url::parse(url)?),
        GeneratedImage::Inline { bytes, mime_type } => {
            let extension = mime_type.strip_prefix("image/").unwrap_or("png");
            InputFile::memory(bytes.clone()).file_name(format!("pairfect.{extension}"))
        }
    })
}

/// Captions must stay under Telegram's 1024 character limit.
pub async fn send_generated_image(
    bot: &Bot,
    chat_id: ChatId,
    image: &GeneratedImage,
    caption: &str,
) -> Result<()> {
    bot.send_photo(chat_id, image_input(image)?)
        .caption(caption.to_string())
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_message("hello\nworld", 100), vec!["hello\nworld".to_string()]);
        assert!(split_message("", 100).is_empty());
    }

    #[test]
    fn chunks_break_between_lines() {
        let chunks = split_message("aaaa\nbbbb\ncccc", 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn oversized_lines_are_cut_on_char_boundaries() {
        let chunks = split_message("💞💞💞💞💞", 2);
        assert_eq!(chunks, vec!["💞💞", "💞💞", "💞"]);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 2));
    }
}
