mod chat;
mod config;
mod quiz;
mod render;

use std::sync::Arc;

use chat::{ControllerError, Sessions, Submission};
use config::Config;
use dotenv::dotenv;
use log::{debug, error, info};
use quiz::client::{QuizClient, QuizSource};
use teloxide::{
    dispatching::dialogue::InMemStorage,
    prelude::*,
    types::ChatAction,
};

type QuizDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    ReceiveFullName,
    Chatting {
        name: String,
    },
}

#[tokio::main]
async fn main() {
    let dotenv_result = dotenv();

    pretty_env_logger::init();
    log::info!("Starting quiz tutor bot...");
    if let Err(e) = dotenv_result {
        // Everything can come from the environment instead
        debug!("No .env loaded: {}", e);
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Quiz service at {} (timeout {:?})",
        config.quiz_api_base_url, config.request_timeout
    );

    let client = match QuizClient::new(&config.quiz_api_base_url, config.request_timeout) {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let source: Arc<dyn QuizSource> = Arc::new(client);
    let sessions = Arc::new(Sessions::new(source, config.bot_name.clone()));

    let bot = Bot::from_env();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, InMemStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveFullName].endpoint(receive_full_name))
            .branch(dptree::case![State::Chatting { name }].endpoint(chatting)),
    )
    .dependencies(dptree::deps![InMemStorage::<State>::new(), sessions])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const GREETING_TEXT: &str = "Hi! I'm a quiz tutor. What's your name?";
async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT).await?;

    dialogue.update(State::ReceiveFullName).await?;
    Ok(())
}

async fn receive_full_name(
    bot: Bot,
    dialogue: QuizDialogue,
    sessions: Arc<Sessions>,
    msg: Message,
) -> HandlerResult {
    let name = match msg.text().map(str::trim) {
        Some(name) if !name.is_empty() && !name.starts_with('/') => name.to_string(),
        _ => {
            bot.send_message(msg.chat.id, "Please enter a username")
                .await?;
            return Ok(());
        }
    };

    start_session(&bot, &sessions, msg.chat.id, &name).await;
    dialogue.update(State::Chatting { name }).await?;
    Ok(())
}

async fn chatting(
    bot: Bot,
    dialogue: QuizDialogue,
    sessions: Arc<Sessions>,
    name: String,
    msg: Message,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let text = match msg.text() {
        Some(text) => text,
        None => {
            bot.send_message(chat_id, "Please send your request as text")
                .await?;
            return Ok(());
        }
    };

    if text.trim() == "/start" {
        sessions.end(chat_id).await;
        bot.send_message(chat_id, GREETING_TEXT).await?;
        dialogue.update(State::ReceiveFullName).await?;
        return Ok(());
    }

    let session = match sessions.get(chat_id).await {
        Some(session) => session,
        None => start_session(&bot, &sessions, chat_id, &name).await,
    };

    match session.submit(text).await {
        Ok(Submission::Fetching(request)) => {
            debug!("{} in {} asks for a quiz on {:?}", name, chat_id, request.topic);
            // Only a nicety, the quiz arrives either way
            let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;
        }
        Ok(other) => debug!("{} in {}: {:?}", name, chat_id, other),
        Err(ControllerError::EmptyInput) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn start_session(
    bot: &Bot,
    sessions: &Sessions,
    chat_id: ChatId,
    name: &str,
) -> Arc<chat::session::ChatSession> {
    let session = sessions.start(chat_id, Some(name)).await;
    let events = session.subscribe().await;
    tokio::spawn(render::render_events(bot.clone(), chat_id, events));
    session
}
