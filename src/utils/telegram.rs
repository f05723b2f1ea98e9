use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tokio::task::JoinHandle;
use tracing::debug;

/// Telegram clears a chat action after about five seconds.
const CHAT_ACTION_REFRESH: Duration = Duration::from_secs(4);

/// Keeps "typing…" or "sending photo…" visible until dropped.
pub struct ChatActionGuard {
    task: JoinHandle<()>,
}

impl ChatActionGuard {
    pub fn start(bot: &Bot, chat_id: ChatId, action: ChatAction) -> Self {
        let bot = bot.clone();
        let task = tokio::spawn(async move {
            loop {
                if let Err(err) = bot.send_chat_action(chat_id, action.clone()).await {
                    debug!("send_chat_action failed: {err}");
                }
                tokio::time::sleep(CHAT_ACTION_REFRESH).await;
            }
        });
        ChatActionGuard { task }
    }
}

impl Drop for ChatActionGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
