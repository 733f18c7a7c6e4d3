use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Message, Role};
use crate::utils::time::now_millis;

/// Title given to a session before it receives its first message.
pub const DEFAULT_SESSION_TITLE: &str = "New Conversation";

/// Title used when the first message carries attachments but no text.
pub const ATTACHMENT_ONLY_TITLE: &str = "Image Chat";

/// Maximum number of characters taken from the first message for a title.
pub const TITLE_MAX_CHARS: usize = 30;

/// One independent conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// Unique identifier of the session.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Messages in conversational order.
    pub messages: Vec<Message>,

    /// Creation time in Unix epoch milliseconds.
    pub created_at: i64,
}

impl ChatSession {
    /// Create an empty session titled "New Conversation".
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now_millis(),
        }
    }

    /// Return a copy of this session with `message` appended.
    ///
    /// The first user message also fixes the title; later messages never
    /// change it.
    pub fn with_message(&self, message: Message) -> Self {
        let mut next = self.clone();
        if next.messages.is_empty() && message.role == Role::User {
            next.title = title_from(&message.content);
        }
        next.messages.push(message);
        next
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a session title from the text of its first message.
pub fn title_from(text: &str) -> String {
    let title: String = text.chars().take(TITLE_MAX_CHARS).collect();
    if title.is_empty() {
        ATTACHMENT_ONLY_TITLE.to_string()
    } else {
        title
    }
}
