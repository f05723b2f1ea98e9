use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use teloxide::types::ChatId;

use crate::config::Config;
use crate::llm::huggingface::HuggingFaceClassifier;
use crate::llm::openai::OpenAiClient;
use crate::pairfect::ModelSettings;
use crate::session::Session;

pub type SharedSession = Arc<tokio::sync::Mutex<Session>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub openai: Arc<OpenAiClient>,
    pub classifier: Arc<HuggingFaceClassifier>,
    pub models: Arc<ModelSettings>,
    sessions: Arc<Mutex<HashMap<ChatId, SharedSession>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState {
            openai: Arc::new(OpenAiClient::from_config(&config)),
            classifier: Arc::new(HuggingFaceClassifier::from_config(&config)),
            models: Arc::new(ModelSettings::from_config(&config)),
            config: Arc::new(config),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The chat's session, created on first use. Callers hold its lock for a whole action.
    pub fn session(&self, chat_id: ChatId) -> SharedSession {
        self.sessions
            .lock()
            .entry(chat_id)
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::View;

    fn state() -> AppState {
        let config = Config::from_lookup(|name| match name {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "BOT_TOKEN" => Some("1:abc".to_string()),
            _ => None,
        })
        .unwrap();
        AppState::new(config)
    }

    #[tokio::test]
    async fn sessions_are_per_chat_and_persistent() {
        let state = state();
        state.session(ChatId(1)).lock().await.navigate(View::Gallery);

        assert_eq!(state.session(ChatId(1)).lock().await.view, View::Gallery);
        assert_eq!(state.session(ChatId(2)).lock().await.view, View::CompatibilityArt);
        assert!(Arc::ptr_eq(&state.session(ChatId(1)), &state.session(ChatId(1))));
    }
}
