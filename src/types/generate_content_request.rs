use serde::{Deserialize, Serialize};

use crate::types::{CompletionOptions, Content, Message, ThinkingConfig};

/// Marker enabling the web search tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleSearch {}

/// A tool the model may use while answering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_search: Option<GoogleSearch>,
}

impl Tool {
    /// The web search tool.
    pub fn google_search() -> Self {
        Self {
            google_search: Some(GoogleSearch {}),
        }
    }
}

/// Sampling and reasoning parameters for a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

/// Body of a `models/{model}:generateContent` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The full conversation, oldest turn first.
    pub contents: Vec<Content>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

impl GenerateContentRequest {
    /// Build a request from the local history and the send options.
    ///
    /// Every message in `history` becomes one turn. Reasoning mode adds a
    /// thinking budget; search mode adds the web search tool.
    pub fn from_history(
        history: &[Message],
        options: &CompletionOptions,
        temperature: Option<f32>,
    ) -> Self {
        let contents = history.iter().map(Content::from_message).collect();
        let thinking_config = options
            .reasoning_enabled
            .then(|| ThinkingConfig::enabled(options.thinking_budget));
        let tools = if options.search_enabled {
            vec![Tool::google_search()]
        } else {
            Vec::new()
        };
        Self {
            contents,
            generation_config: Some(GenerationConfig {
                temperature,
                thinking_config,
            }),
            tools,
        }
    }

    /// Number of inline data parts across all turns.
    pub fn inline_data_count(&self) -> usize {
        self.contents
            .iter()
            .flat_map(|content| content.parts.iter())
            .filter(|part| part.inline_data.is_some())
            .count()
    }
}
