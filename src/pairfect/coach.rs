use anyhow::Result;

use crate::config::COACH_SYSTEM_PROMPT;
use crate::llm::provider::{ChatMessage, ChatModel};

/// What the coach knows about the couple; earlier chat turns are never resent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoachContext {
    pub first_name: String,
    pub second_name: String,
    pub score: u8,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

pub fn build_coach_messages(context: &CoachContext, user_message: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(COACH_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Couple: {} & {} ({}%)\nSummary: {}\nUser: {}",
            context.first_name, context.second_name, context.score, context.summary, user_message
        )),
    ]
}

pub async fn love_coach_reply<C: ChatModel>(
    chat: &C,
    model: &str,
    context: &CoachContext,
    user_message: &str,
) -> Result<String> {
    let messages = build_coach_messages(context, user_message);
    Ok(chat.complete(model, &messages).await?.trim().to_string())
}
