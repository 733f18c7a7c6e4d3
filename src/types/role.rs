use std::fmt;

use serde::{Deserialize, Serialize};

/// The author of a message in a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message typed by the person at the keyboard.
    User,

    /// A reply produced by the remote model, or a synthetic error reply.
    Assistant,

    /// A system note.
    System,
}

impl Role {
    /// The role label the remote API expects for a turn authored by this role.
    ///
    /// The API only knows `user` and `model`; everything that is not the user
    /// is sent as the model side of the conversation.
    pub fn api_label(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant | Role::System => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}
