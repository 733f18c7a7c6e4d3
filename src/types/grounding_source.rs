use serde::{Deserialize, Serialize};

/// A citation returned when search grounding contributed to an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    /// Human-readable title of the cited page.
    pub title: String,

    /// Address of the cited page.
    pub uri: String,
}

impl GroundingSource {
    /// Create a new grounding source.
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}
