use serde::{Deserialize, Serialize};

/// Configuration for the model's extended thinking.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    /// How many tokens the model may spend deliberating.
    pub thinking_budget: u32,

    /// Whether thought summaries are returned as parts marked `thought`.
    #[serde(default)]
    pub include_thoughts: bool,
}

impl ThinkingConfig {
    /// Create a thinking configuration that returns its thoughts.
    pub fn enabled(thinking_budget: u32) -> Self {
        Self {
            thinking_budget,
            include_thoughts: true,
        }
    }
}
