//! The ordered list of turns a chat shows, and the events the rendering side
//! subscribes to.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::turn::{Sender, Turn, TurnId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    Appended(Turn),
    Removed(Turn),
}

/// Append-only sequence of turns. The only removal allowed is that of a
/// loading turn, which the controller performs through [`Conversation::remove`].
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
    next_id: u64,
    subscribers: Vec<UnboundedSender<ConversationEvent>>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// New receiver that first gets the current turns, then every change.
    pub fn subscribe(&mut self) -> UnboundedReceiver<ConversationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        for turn in &self.turns {
            // Receiver is alive, we are holding it
            let _ = tx.send(ConversationEvent::Appended(turn.clone()));
        }
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn append(&mut self, sender: Sender, text: impl Into<String>) -> TurnId {
        let id = TurnId(self.next_id);
        self.next_id += 1;

        let turn = Turn::new(id, text.into(), sender);
        self.turns.push(turn.clone());
        self.publish(ConversationEvent::Appended(turn));
        id
    }

    pub(crate) fn remove(&mut self, id: TurnId) -> Option<Turn> {
        let position = self.turns.iter().position(|t| t.id() == id)?;
        let turn = self.turns.remove(position);
        self.publish(ConversationEvent::Removed(turn.clone()));
        Some(turn)
    }

    /// Drops every subscriber; their receivers see the end of the stream.
    pub(crate) fn close_subscriptions(&mut self) {
        self.subscribers.clear();
    }

    fn publish(&mut self, event: ConversationEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
