use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Inline binary data carried in a request part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// Content type of the data.
    pub mime_type: String,

    /// Base64-encoded bytes.
    pub data: String,
}

/// One piece of a turn: text, inline data, or a thought.
///
/// The API treats parts as a union keyed by field name, so every field is
/// optional and unknown fields (signatures, function calls) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,

    /// Set on parts that carry the model's reasoning rather than its answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    /// A plain text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// An inline data part.
    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            inline_data: Some(Blob {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
            ..Self::default()
        }
    }

    /// Returns true if this part is marked as a thought.
    pub fn is_thought(&self) -> bool {
        self.thought.unwrap_or(false)
    }
}

/// One turn of the conversation in the API's format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Translate a local message into an API turn.
    ///
    /// Attachments come first as inline data, followed by the text. The text
    /// part is left out only when the message is attachment-only.
    pub fn from_message(message: &Message) -> Self {
        let mut parts: Vec<Part> = message
            .attachments()
            .iter()
            .map(|attachment| {
                Part::inline_data(
                    attachment.wire_mime_type(),
                    attachment.base64.clone().unwrap_or_default(),
                )
            })
            .collect();
        if !message.content.is_empty() || parts.is_empty() {
            parts.push(Part::text(message.content.clone()));
        }
        Self {
            role: Some(message.role.api_label().to_string()),
            parts,
        }
    }
}
