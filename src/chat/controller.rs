//! Turn-taking for one chat: user message in, at most one quiz request out,
//! exactly one bot answer back.

use std::fmt;

use log::{debug, warn};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

use super::conversation::{Conversation, ConversationEvent};
use super::topic::{extract_topic, should_attempt_quiz};
use super::turn::{Sender, TurnId};
use crate::quiz::{format_quiz_as_text, QuizError, QuizPayload};

pub const DEFAULT_DISPLAY_NAME: &str = "User";
pub const CLARIFICATION_TEXT: &str = "What topic would you like a quiz on?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request-{}", self.0)
    }
}

/// A quiz fetch the caller has to run and report back through
/// [`ConversationController::on_quiz_fetched`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRequest {
    pub id: RequestId,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    AwaitingResponse {
        request: QuizRequest,
        loading_turn: TurnId,
    },
    Fulfilled,
    Failed,
}

impl ControllerState {
    #[cfg(test)]
    pub fn is_awaiting(&self) -> bool {
        matches!(self, ControllerState::AwaitingResponse { .. })
    }
}

/// What a submitted message led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Fetching(QuizRequest),
    Clarifying,
    /// Another request is still outstanding, nothing was issued.
    Busy { topic: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Fulfilled,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("No outstanding quiz request with id {0}")]
    UnknownRequest(RequestId),
    #[error("Conversation has ended")]
    Closed,
}

pub struct ConversationController {
    conversation: Conversation,
    state: ControllerState,
    next_request: u64,
    closed: bool,
}

impl ConversationController {
    /// Starts a conversation with the greeting turn. A blank name falls back
    /// to [`DEFAULT_DISPLAY_NAME`].
    pub fn new(display_name: Option<&str>, bot_name: &str) -> Self {
        let name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME);

        let mut conversation = Conversation::new();
        conversation.append(
            Sender::Bot,
            format!(
                "Hi {}! I'm {}. Ask me to create a quiz on any topic!",
                name, bot_name
            ),
        );

        Self {
            conversation,
            state: ControllerState::Idle,
            next_request: 0,
            closed: false,
        }
    }

    #[cfg(test)]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    #[cfg(test)]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<ConversationEvent> {
        self.conversation.subscribe()
    }

    /// Ends the conversation: subscribers are disconnected and nothing is
    /// accepted afterwards, including the result of a request still in flight.
    pub fn close(&mut self) {
        self.closed = true;
        self.conversation.close_subscriptions();
    }

    pub fn submit_user_message(&mut self, text: &str) -> Result<Submission, ControllerError> {
        if self.closed {
            return Err(ControllerError::Closed);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(ControllerError::EmptyInput);
        }

        self.conversation.append(Sender::User, text);

        if let ControllerState::AwaitingResponse { request, .. } = &self.state {
            let topic = request.topic.clone();
            debug!("Still waiting for {}, not starting another quiz", request.id);
            self.conversation.append(
                Sender::Bot,
                format!(
                    "I'm still working on your quiz on {}. Please wait a moment.",
                    topic
                ),
            );
            return Ok(Submission::Busy { topic });
        }

        let topic = if should_attempt_quiz(text) {
            extract_topic(text)
        } else {
            text.to_string()
        };

        if topic.trim().is_empty() {
            self.conversation.append(Sender::Bot, CLARIFICATION_TEXT);
            return Ok(Submission::Clarifying);
        }

        let loading_turn = self
            .conversation
            .append(Sender::Bot, format!("Generating quiz on {}...", topic));
        let request = QuizRequest {
            id: RequestId(self.next_request),
            topic,
        };
        self.next_request += 1;

        debug!("Issuing {} for topic {:?}", request.id, request.topic);
        self.state = ControllerState::AwaitingResponse {
            request: request.clone(),
            loading_turn,
        };
        Ok(Submission::Fetching(request))
    }

    /// Completes the outstanding request. Each request is accepted once;
    /// anything else is rejected without touching the conversation.
    pub fn on_quiz_fetched(
        &mut self,
        id: RequestId,
        result: Result<QuizPayload, QuizError>,
    ) -> Result<Outcome, ControllerError> {
        if self.closed {
            return Err(ControllerError::Closed);
        }
        let (request, loading_turn) = match &self.state {
            ControllerState::AwaitingResponse {
                request,
                loading_turn,
            } if request.id == id => (request.clone(), *loading_turn),
            _ => return Err(ControllerError::UnknownRequest(id)),
        };

        self.conversation.remove(loading_turn);

        let formatted = result.and_then(|payload| format_quiz_as_text(&request.topic, &payload.quiz));
        match formatted {
            Ok(text) => {
                self.conversation.append(Sender::Bot, text);
                self.state = ControllerState::Fulfilled;
                Ok(Outcome::Fulfilled)
            }
            Err(e) => {
                warn!("Quiz on {:?} failed: {}", request.topic, e);
                self.conversation
                    .append(Sender::Bot, format!("Sorry, I encountered an error: {}", e));
                self.state = ControllerState::Failed;
                Ok(Outcome::Failed)
            }
        }
    }
}
