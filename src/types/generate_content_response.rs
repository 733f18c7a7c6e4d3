use serde::{Deserialize, Serialize};

use crate::types::{Content, GroundingSource};

/// A web page cited by a grounded answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One piece of grounding evidence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebChunk>,
}

impl GroundingChunk {
    /// Convert to a citation, if the chunk names a page.
    ///
    /// Chunks without a uri are dropped; a missing title falls back to the uri.
    pub fn to_source(&self) -> Option<GroundingSource> {
        let web = self.web.as_ref()?;
        let uri = web.uri.as_ref().filter(|uri| !uri.is_empty())?;
        let title = web
            .title
            .as_ref()
            .filter(|title| !title.is_empty())
            .unwrap_or(uri);
        Some(GroundingSource::new(title.clone(), uri.clone()))
    }
}

/// Search grounding attached to a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// One generated answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Reply to a `generateContent` call.
///
/// Every field the client reads is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    /// The answer text: the first candidate's non-thought text parts, joined.
    pub fn text(&self) -> String {
        self.first_candidate()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|part| !part.is_thought())
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// The reasoning trace: the text of the first part marked as a thought.
    pub fn thinking(&self) -> String {
        self.first_candidate()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.iter().find(|part| part.is_thought()))
            .and_then(|part| part.text.clone())
            .unwrap_or_default()
    }

    /// Citations from the first candidate's grounding metadata.
    pub fn sources(&self) -> Vec<GroundingSource> {
        self.first_candidate()
            .and_then(|candidate| candidate.grounding_metadata.as_ref())
            .map(|metadata| {
                metadata
                    .grounding_chunks
                    .iter()
                    .filter_map(GroundingChunk::to_source)
                    .collect()
            })
            .unwrap_or_default()
    }
}
