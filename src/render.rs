use std::collections::HashMap;

use log::{debug, warn};
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::chat::turn::Sender;
use crate::chat::{ConversationEvent, TurnId};

// Telegram measures message length in UTF-16 code units.
const MAX_MESSAGE_UNITS: usize = 4096;

/// Mirrors a conversation into a Telegram chat until the session goes away.
///
/// User turns are not echoed, Telegram already shows them. Removing a turn
/// deletes the messages it was sent as.
pub async fn render_events(
    bot: Bot,
    chat_id: ChatId,
    mut events: UnboundedReceiver<ConversationEvent>,
) {
    let mut delivered: HashMap<TurnId, Vec<MessageId>> = HashMap::new();

    while let Some(event) = events.recv().await {
        match event {
            ConversationEvent::Appended(turn) => {
                if turn.sender() == Sender::User {
                    continue;
                }

                let mut sent = Vec::new();
                for chunk in split_message(turn.text(), MAX_MESSAGE_UNITS) {
                    match bot.send_message(chat_id, chunk).await {
                        Ok(message) => sent.push(message.id),
                        Err(e) => warn!("Failed to send {} to {}: {}", turn.id(), chat_id, e),
                    }
                }
                delivered.insert(turn.id(), sent);
            }
            ConversationEvent::Removed(turn) => {
                for message_id in delivered.remove(&turn.id()).unwrap_or_default() {
                    if let Err(e) = bot.delete_message(chat_id, message_id).await {
                        warn!("Failed to delete {} in {}: {}", turn.id(), chat_id, e);
                    }
                }
            }
        }
    }

    debug!("Renderer for {} stopped", chat_id);
}

/// Cuts `text` into pieces of at most `max_units` UTF-16 code units,
/// preferring to break after a newline. Limits below 2 are raised to 2 so a
/// surrogate pair always fits.
pub fn split_message(text: &str, max_units: usize) -> Vec<String> {
    let max_units = max_units.max(2);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut units = 0;
    let mut last_break = None;

    for (i, c) in text.char_indices() {
        let width = c.len_utf16();
        while units + width > max_units {
            let cut = match last_break {
                Some(b) if b > start => b,
                _ => i,
            };
            chunks.push(text[start..cut].to_string());
            units = text[cut..i].encode_utf16().count();
            start = cut;
            last_break = None;
        }
        units += width;
        if c == '\n' {
            last_break = Some(i + 1);
        }
    }

    if start < text.len() || chunks.is_empty() {
        chunks.push(text[start..].to_string());
    }
    chunks
}
