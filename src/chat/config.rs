//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::types::{
    DEFAULT_TEMPERATURE, DEFAULT_THINKING_BUDGET, KnownModel, Model, ModelTier,
};

/// Directory name used under the platform data directory.
const DATA_DIR_NAME: &str = "sesame";

/// Command-line arguments for the sesame-chat tool.
#[derive(CommandLine, Debug, Default, Eq, PartialEq)]
pub struct ChatArgs {
    /// Model used when neither reasoning nor search is enabled.
    #[arrrg(optional, "Light model (default: gemini-3-flash-preview)", "MODEL")]
    pub light_model: Option<String>,

    /// Model used when reasoning or search is enabled.
    #[arrrg(optional, "Capable model (default: gemini-3-pro-preview)", "MODEL")]
    pub capable_model: Option<String>,

    /// Sampling temperature; parsed when the config is resolved.
    #[arrrg(optional, "Sampling temperature (default: 0.7)", "TEMP")]
    pub temperature: Option<String>,

    /// Thinking budget used in reasoning mode.
    #[arrrg(optional, "Thinking budget in tokens (default: 16000)", "TOKENS")]
    pub thinking_budget: Option<u32>,

    /// Directory holding persisted sessions and the log file.
    #[arrrg(optional, "Data directory (default: platform data dir)/sesame", "DIR")]
    pub store: Option<String>,

    /// Override the API base URL.
    #[arrrg(optional, "API base URL", "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: none)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Start with reasoning mode enabled.
    #[arrrg(flag, "Start with reasoning mode on")]
    pub reasoning: bool,

    /// Start with search mode enabled.
    #[arrrg(flag, "Start with search mode on")]
    pub search: bool,
}

/// Configuration for the chat application.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Model for plain turns.
    pub light_model: Model,

    /// Model for reasoning or search turns.
    pub capable_model: Model,

    /// Sampling temperature sent with every request.
    pub temperature: f32,

    /// Thinking budget sent when reasoning is enabled.
    pub thinking_budget: u32,

    /// Override for the data directory.
    pub store_dir: Option<PathBuf>,

    /// Override for the API base URL.
    pub base_url: Option<String>,

    /// Optional request timeout; none by default.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Initial reasoning mode.
    pub reasoning_enabled: bool,

    /// Initial search mode.
    pub search_enabled: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Light model: gemini-3-flash-preview
    /// - Capable model: gemini-3-pro-preview
    /// - Temperature: 0.7
    /// - Thinking budget: 16000
    /// - Color: enabled
    /// - Reasoning and search: off
    pub fn new() -> Self {
        Self {
            light_model: Model::Known(KnownModel::Gemini3FlashPreview),
            capable_model: Model::Known(KnownModel::Gemini3ProPreview),
            temperature: DEFAULT_TEMPERATURE,
            thinking_budget: DEFAULT_THINKING_BUDGET,
            store_dir: None,
            base_url: None,
            timeout: None,
            use_color: true,
            reasoning_enabled: false,
            search_enabled: false,
        }
    }

    /// The model serving a tier.
    pub fn model_for(&self, tier: ModelTier) -> &Model {
        match tier {
            ModelTier::Light => &self.light_model,
            ModelTier::Capable => &self.capable_model,
        }
    }

    /// The directory holding persisted sessions.
    ///
    /// Falls back to the working directory when the platform has no data
    /// directory.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.store_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join(DATA_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(format!(".{DATA_DIR_NAME}")))
    }

    /// Sets the light model.
    pub fn with_light_model(mut self, model: Model) -> Self {
        self.light_model = model;
        self
    }

    /// Sets the capable model.
    pub fn with_capable_model(mut self, model: Model) -> Self {
        self.capable_model = model;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the thinking budget.
    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = budget;
        self
    }

    /// Sets the data directory.
    pub fn with_store_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.store_dir = dir;
        self
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the initial modes.
    pub fn with_modes(mut self, reasoning_enabled: bool, search_enabled: bool) -> Self {
        self.reasoning_enabled = reasoning_enabled;
        self.search_enabled = search_enabled;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        ChatConfig {
            light_model: args.light_model.map(Model::from).unwrap_or(defaults.light_model),
            capable_model: args
                .capable_model
                .map(Model::from)
                .unwrap_or(defaults.capable_model),
            temperature: parse_temperature(args.temperature.as_deref()),
            thinking_budget: args.thinking_budget.unwrap_or(DEFAULT_THINKING_BUDGET),
            store_dir: args.store.map(PathBuf::from),
            base_url: args.base_url,
            timeout: args.timeout_secs.map(Duration::from_secs),
            use_color: !args.no_color,
            reasoning_enabled: args.reasoning,
            search_enabled: args.search,
        }
    }
}

/// Parse a temperature flag, falling back to the default when absent or malformed.
fn parse_temperature(value: Option<&str>) -> f32 {
    match value.map(|value| value.trim().parse::<f32>()) {
        Some(Ok(temperature)) if temperature.is_finite() && temperature >= 0.0 => temperature,
        Some(_) => {
            tracing::warn!(?value, "ignoring invalid temperature");
            DEFAULT_TEMPERATURE
        }
        None => DEFAULT_TEMPERATURE,
    }
}
