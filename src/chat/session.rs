use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use teloxide::types::ChatId;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;

use super::controller::{ControllerError, ConversationController, QuizRequest, Submission};
use super::conversation::ConversationEvent;
use crate::quiz::client::QuizSource;

/// One chat's conversation plus the machinery to run its quiz fetches.
///
/// Fetches run on their own task; their completion goes back through the same
/// lock as user submissions, so the conversation only changes under it.
pub struct ChatSession {
    controller: Mutex<ConversationController>,
    source: Arc<dyn QuizSource>,
}

impl ChatSession {
    pub fn new(
        display_name: Option<&str>,
        bot_name: &str,
        source: Arc<dyn QuizSource>,
    ) -> Arc<Self> {
        Arc::new(Self {
            controller: Mutex::new(ConversationController::new(display_name, bot_name)),
            source,
        })
    }

    pub async fn subscribe(&self) -> UnboundedReceiver<ConversationEvent> {
        self.controller.lock().await.subscribe()
    }

    pub async fn submit(self: &Arc<Self>, text: &str) -> Result<Submission, ControllerError> {
        let submission = self.controller.lock().await.submit_user_message(text)?;

        if let Submission::Fetching(request) = &submission {
            let session = Arc::clone(self);
            let request = request.clone();
            tokio::spawn(async move { session.fetch(request).await });
        }

        Ok(submission)
    }

    /// Closes the conversation. A fetch still in flight finishes but its
    /// result is dropped, and the renderer's event stream ends.
    pub async fn end(&self) {
        self.controller.lock().await.close();
    }

    async fn fetch(&self, request: QuizRequest) {
        let result = self.source.fetch_quiz(&request.topic).await;

        let mut controller = self.controller.lock().await;
        match controller.on_quiz_fetched(request.id, result) {
            Ok(outcome) => debug!("{} finished: {:?}", request.id, outcome),
            Err(ControllerError::Closed) => {
                debug!("Session ended before {} finished, dropping result", request.id)
            }
            Err(e) => warn!("Dropping quiz result: {}", e),
        }
    }
}

/// Live sessions by Telegram chat. Nothing here outlives the process.
pub struct Sessions {
    source: Arc<dyn QuizSource>,
    bot_name: String,
    by_chat: Mutex<HashMap<ChatId, Arc<ChatSession>>>,
}

impl Sessions {
    pub fn new(source: Arc<dyn QuizSource>, bot_name: impl Into<String>) -> Self {
        Self {
            source,
            bot_name: bot_name.into(),
            by_chat: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces whatever session the chat had with a fresh one.
    pub async fn start(&self, chat_id: ChatId, display_name: Option<&str>) -> Arc<ChatSession> {
        let session = ChatSession::new(display_name, &self.bot_name, Arc::clone(&self.source));
        info!("Starting chat session for {}", chat_id);
        let replaced = self.by_chat.lock().await.insert(chat_id, Arc::clone(&session));
        if let Some(old) = replaced {
            old.end().await;
        }
        session
    }

    pub async fn get(&self, chat_id: ChatId) -> Option<Arc<ChatSession>> {
        self.by_chat.lock().await.get(&chat_id).cloned()
    }

    pub async fn end(&self, chat_id: ChatId) -> bool {
        let removed = self.by_chat.lock().await.remove(&chat_id);
        match removed {
            Some(session) => {
                session.end().await;
                info!("Ended chat session for {}", chat_id);
                true
            }
            None => false,
        }
    }
}
