use crate::types::{GenerateContentResponse, GroundingSource};

/// Text substituted when the remote reply carries no answer text.
pub const NO_RESPONSE_TEXT: &str = "No response content.";

/// A completed remote call, reduced to what the chat keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Answer text; never empty.
    pub text: String,

    /// Reasoning trace; empty when none was returned.
    pub thinking: String,

    /// Citations; empty when search grounding was not used.
    pub sources: Vec<GroundingSource>,
}

impl Completion {
    /// Create a completion, substituting placeholder text for an empty answer.
    pub fn new(
        text: impl Into<String>,
        thinking: impl Into<String>,
        sources: Vec<GroundingSource>,
    ) -> Self {
        let text = text.into();
        let text = if text.is_empty() {
            NO_RESPONSE_TEXT.to_string()
        } else {
            text
        };
        Self {
            text,
            thinking: thinking.into(),
            sources,
        }
    }
}

impl From<GenerateContentResponse> for Completion {
    fn from(response: GenerateContentResponse) -> Self {
        Completion::new(response.text(), response.thinking(), response.sources())
    }
}
