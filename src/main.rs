use std::error::Error;
use std::future::Future;

use dotenvy::dotenv;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

mod config;
mod handlers;
mod llm;
mod pairfect;
mod session;
mod state;
mod utils;

use config::Config;
use handlers::commands::{self, ME_SLOT, PARTNER_SLOT};
use handlers::media::has_photo;
use handlers::{callbacks, chat, photos};
use session::View;
use state::AppState;
use utils::logging::init_logging;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    Start,
    Help,
    Compat,
    Coach,
    Music,
    Gallery,
    About,
    Me(String),
    Partner(String),
    Analyze,
    Unlock(String),
    Render,
    Reset,
}

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Runs a user action off the dispatcher so slow model calls never block other chats.
fn spawn_action<F>(name: &'static str, action: F)
where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = action.await {
            error!("{name} handler failed: {err}");
        }
    });
}

#[tokio::main]
async fn main() -> HandlerResult {
    dotenv().ok();
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ {err}");
            return Err(err.into());
        }
    };
    let _guards = init_logging(&config.log_level);
    for warning in &config.warnings {
        warn!("{warning}");
    }

    let bot = Bot::new(config.bot_token.clone());
    if config.gallery_password.is_none() {
        info!("LOVE_GALLERY_PASS is not set; the Love Art Gallery stays locked");
    }
    let state = AppState::new(config);
    info!(
        "Starting Pairfect bot (vision={}, text={}, art={})",
        state.models.vision_model, state.models.text_model, state.models.art_model
    );

    let command_handler = dptree::entry()
        .filter_command::<Command>()
        .endpoint(handle_command);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(dptree::filter(|msg: Message| has_photo(&msg)).endpoint(handle_photo))
        .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text))
        .endpoint(ignore_message);

    let callback_handler = Update::filter_callback_query().endpoint(handle_callback_query);

    let handler = dptree::entry()
        .branch(message_handler)
        .branch(callback_handler);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    bot: Bot,
    state: AppState,
    message: Message,
    command: Command,
) -> HandlerResult {
    let chat_id = message.chat.id;
    match command {
        Command::Start => spawn_action("start", commands::start_handler(bot, state, message)),
        Command::Help => spawn_action("help", commands::help_handler(bot, state, message)),
        Command::Compat => spawn_action(
            "compat",
            commands::navigate_handler(bot, state, chat_id, View::CompatibilityArt),
        ),
        Command::Coach => spawn_action(
            "coach",
            commands::navigate_handler(bot, state, chat_id, View::LoveCoachChat),
        ),
        Command::Music => spawn_action(
            "music",
            commands::navigate_handler(bot, state, chat_id, View::MoodMusic),
        ),
        Command::Gallery => spawn_action(
            "gallery",
            commands::navigate_handler(bot, state, chat_id, View::Gallery),
        ),
        Command::About => spawn_action(
            "about",
            commands::navigate_handler(bot, state, chat_id, View::About),
        ),
        Command::Me(text) => spawn_action(
            "me",
            commands::profile_handler(bot, state, message, ME_SLOT, text),
        ),
        Command::Partner(text) => spawn_action(
            "partner",
            commands::profile_handler(bot, state, message, PARTNER_SLOT, text),
        ),
        Command::Analyze => spawn_action("analyze", commands::analyze_handler(bot, state, message)),
        Command::Unlock(password) => spawn_action(
            "unlock",
            commands::unlock_handler(bot, state, message, password),
        ),
        Command::Render => spawn_action("render", commands::render_handler(bot, state, message)),
        Command::Reset => spawn_action("reset", commands::reset_handler(bot, state, message)),
    }
    Ok(())
}

async fn handle_photo(bot: Bot, state: AppState, message: Message) -> HandlerResult {
    spawn_action("photo", photos::photo_handler(bot, state, message));
    Ok(())
}

async fn handle_text(bot: Bot, state: AppState, message: Message) -> HandlerResult {
    if let Some(text) = message.text() {
        if text.trim_start().starts_with('/') {
            return Ok(());
        }
    }
    spawn_action("text", chat::text_handler(bot, state, message));
    Ok(())
}

async fn handle_callback_query(bot: Bot, state: AppState, query: CallbackQuery) -> HandlerResult {
    spawn_action("callback", callbacks::callback_handler(bot, state, query));
    Ok(())
}

async fn ignore_message(_message: Message) -> HandlerResult {
    Ok(())
}
