use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents a Gemini model identifier.
///
/// This can be a predefined model version or a custom string value
/// for models that may be added in the future.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier (for future models or private models)
    Custom(String),
}

/// Known Gemini model versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    /// Gemini 3 Flash (preview)
    #[serde(rename = "gemini-3-flash-preview")]
    Gemini3FlashPreview,

    /// Gemini 3 Pro (preview)
    #[serde(rename = "gemini-3-pro-preview")]
    Gemini3ProPreview,

    /// Gemini 2.5 Flash
    #[serde(rename = "gemini-2.5-flash")]
    Gemini25Flash,

    /// Gemini 2.5 Pro
    #[serde(rename = "gemini-2.5-pro")]
    Gemini25Pro,
}

impl KnownModel {
    const ALL: [KnownModel; 4] = [
        KnownModel::Gemini3FlashPreview,
        KnownModel::Gemini3ProPreview,
        KnownModel::Gemini25Flash,
        KnownModel::Gemini25Pro,
    ];
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{}", known_model),
            Model::Custom(custom) => write!(f, "{}", custom),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnownModel::Gemini3FlashPreview => write!(f, "gemini-3-flash-preview"),
            KnownModel::Gemini3ProPreview => write!(f, "gemini-3-pro-preview"),
            KnownModel::Gemini25Flash => write!(f, "gemini-2.5-flash"),
            KnownModel::Gemini25Pro => write!(f, "gemini-2.5-pro"),
        }
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(KnownModel::ALL
            .iter()
            .find(|known| known.to_string() == s)
            .map(|known| Model::Known(*known))
            .unwrap_or_else(|| Model::Custom(s.to_string())))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Model::Custom(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::Custom(model.to_string())
    }
}

/// Which class of model a request should go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelTier {
    /// The lighter, faster variant used for plain chat.
    Light,

    /// The higher-capability variant used for reasoning or search.
    Capable,
}

impl ModelTier {
    /// Choose a tier from the two request modes.
    ///
    /// Plain chat goes to the light model; any request with reasoning or
    /// search enabled goes to the capable model.
    pub fn for_modes(reasoning_enabled: bool, search_enabled: bool) -> Self {
        if reasoning_enabled || search_enabled {
            ModelTier::Capable
        } else {
            ModelTier::Light
        }
    }
}
