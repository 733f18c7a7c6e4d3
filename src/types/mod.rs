// Public modules
pub mod attachment;
pub mod chat_session;
pub mod completion;
pub mod completion_options;
pub mod content;
pub mod generate_content_request;
pub mod generate_content_response;
pub mod grounding_source;
pub mod message;
pub mod model;
pub mod role;
pub mod thinking_config;

// Re-exports
pub use attachment::{Attachment, AttachmentKind, FALLBACK_MIME_TYPE, media_type_for};
pub use chat_session::{
    ATTACHMENT_ONLY_TITLE, ChatSession, DEFAULT_SESSION_TITLE, TITLE_MAX_CHARS, title_from,
};
pub use completion::{Completion, NO_RESPONSE_TEXT};
pub use completion_options::{CompletionOptions, DEFAULT_TEMPERATURE, DEFAULT_THINKING_BUDGET};
pub use content::{Blob, Content, Part};
pub use generate_content_request::{GenerateContentRequest, GenerationConfig, GoogleSearch, Tool};
pub use generate_content_response::{
    Candidate, GenerateContentResponse, GroundingChunk, GroundingMetadata, WebChunk,
};
pub use grounding_source::GroundingSource;
pub use message::{ERROR_APOLOGY, Message};
pub use model::{KnownModel, Model, ModelTier};
pub use role::Role;
pub use thinking_config::ThinkingConfig;
