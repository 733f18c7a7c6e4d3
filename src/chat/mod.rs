//! Chat application module for multi-session conversations with Gemini.
//!
//! This module provides the REPL-facing pieces built on top of the sesame
//! library. It supports:
//!
//! - Several independent conversations with one active at a time
//! - File attachments, reasoning mode and search grounding
//! - Slash commands for session control
//! - Configurable models, temperature and thinking budget
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`controller`]: Send orchestration across store, composer and client
//! - [`commands`]: Slash command parsing and handling

mod commands;
mod config;
mod controller;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, SessionRef, help_text, parse_command, unescape_message};
pub use config::{ChatArgs, ChatConfig};
pub use controller::{ChatController, PendingSend};
