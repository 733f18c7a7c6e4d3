// Public modules
pub mod chat;
pub mod client;
pub mod composer;
pub mod error;
pub mod observability;
pub mod render;
pub mod store;
pub mod types;
pub mod utils;

// Re-exports
pub use client::{CompletionClient, Gemini};
pub use composer::{Composer, SUGGESTED_PROMPTS, SendRequest};
pub use error::{ApiErrorKind, Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, RenderOptions, Renderer};
pub use store::{FileStorage, MemoryStorage, SessionStore, Storage, StoreSnapshot};
pub use types::*;
