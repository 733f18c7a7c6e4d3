use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Attachment, GroundingSource, Role};
use crate::utils::time::now_millis;

/// Text shown in place of a reply when the remote call fails.
pub const ERROR_APOLOGY: &str =
    "I encountered an error while processing your request. Please try again.";

/// One turn in a chat session.
///
/// Messages are immutable once created; sessions only ever append them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier of the message.
    pub id: String,

    /// Author of the message.
    pub role: Role,

    /// Message text (Markdown for assistant replies).
    pub content: String,

    /// Creation time in Unix epoch milliseconds.
    pub timestamp: i64,

    /// Files sent with the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,

    /// Reasoning trace returned alongside an assistant reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,

    /// Citations returned when the reply was grounded in search results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<GroundingSource>>,

    /// Set on the synthetic reply produced for a failed remote call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: now_millis(),
            attachments: None,
            thinking: None,
            sources: None,
            is_error: None,
        }
    }

    /// Create a user message carrying optional attachments.
    pub fn user(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        let mut message = Self::with_role(Role::User, content);
        if !attachments.is_empty() {
            message.attachments = Some(attachments);
        }
        message
    }

    /// Create an assistant reply.
    ///
    /// Empty reasoning traces and empty source lists are stored as absent.
    pub fn assistant(
        content: impl Into<String>,
        thinking: Option<String>,
        sources: Vec<GroundingSource>,
    ) -> Self {
        let mut message = Self::with_role(Role::Assistant, content);
        message.thinking = thinking.filter(|t| !t.trim().is_empty());
        if !sources.is_empty() {
            message.sources = Some(sources);
        }
        message
    }

    /// Create the error-flagged reply recorded when a remote call fails.
    pub fn assistant_error() -> Self {
        let mut message = Self::with_role(Role::Assistant, ERROR_APOLOGY);
        message.is_error = Some(true);
        message
    }

    /// Create a system note.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Returns true if this message records a failed remote call.
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// Attachments on this message; empty when there are none.
    pub fn attachments(&self) -> &[Attachment] {
        self.attachments.as_deref().unwrap_or(&[])
    }

    /// Sources on this message; empty when there are none.
    pub fn sources(&self) -> &[GroundingSource] {
        self.sources.as_deref().unwrap_or(&[])
    }

    /// The reasoning trace, if a non-empty one was returned.
    pub fn thinking(&self) -> Option<&str> {
        self.thinking.as_deref().filter(|t| !t.is_empty())
    }
}
