use crate::types::ModelTier;

/// Thinking budget used when reasoning mode is on and nothing else is configured.
pub const DEFAULT_THINKING_BUDGET: u32 = 16_000;

/// Sampling temperature used when nothing else is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Typed request options for one completion.
///
/// Reasoning and search are independent and may be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionOptions {
    /// Ask the model to deliberate before answering.
    pub reasoning_enabled: bool,

    /// Allow the model to ground its answer in web search.
    pub search_enabled: bool,

    /// Token budget for deliberation; only sent when reasoning is enabled.
    pub thinking_budget: u32,
}

impl CompletionOptions {
    /// Create options with the default thinking budget.
    pub fn new(reasoning_enabled: bool, search_enabled: bool) -> Self {
        Self {
            reasoning_enabled,
            search_enabled,
            thinking_budget: DEFAULT_THINKING_BUDGET,
        }
    }

    /// Sets the thinking budget.
    pub fn with_thinking_budget(mut self, thinking_budget: u32) -> Self {
        self.thinking_budget = thinking_budget;
        self
    }

    /// The model tier these options call for.
    pub fn tier(&self) -> ModelTier {
        ModelTier::for_modes(self.reasoning_enabled, self.search_enabled)
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self::new(false, false)
    }
}
