//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to manage sessions, attachments and modes without sending
//! a message to the API.

/// Names a session either by its 1-based position in the list or by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRef {
    Index(usize),
    Id(String),
}

impl SessionRef {
    fn parse(arg: &str) -> Self {
        match arg.parse::<usize>() {
            Ok(index) => SessionRef::Index(index),
            Err(_) => SessionRef::Id(arg.to_string()),
        }
    }
}

/// A parsed chat command.
///
/// These commands control the chat and are not sent to the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Start a new conversation.
    New,

    /// List conversations.
    Sessions,

    /// Switch to another conversation.
    Select(SessionRef),

    /// Delete a conversation; `None` deletes the active one.
    Delete(Option<SessionRef>),

    /// Read files and add them to the next message.
    Attach(Vec<String>),

    /// Drop a pending attachment by 1-based position.
    Detach(usize),

    /// List pending attachments.
    Attachments,

    /// Set reasoning mode; `None` toggles.
    Reasoning(Option<bool>),

    /// Set search mode; `None` toggles.
    Search(Option<bool>),

    /// Show the reasoning trace of a message by 1-based position.
    Expand(usize),

    /// Hide the reasoning trace of a message by 1-based position.
    Collapse(usize),

    /// Re-display the active conversation.
    Show,

    /// Fill the draft with a suggested prompt by 1-based position.
    Suggest(usize),

    /// Write all conversations to a file.
    Export(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message. Lines starting
/// with `//` and lines whose first word is a path (`/etc/hosts ...`) are
/// messages.
///
/// # Examples
///
/// ```
/// # use sesame::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/select 2").is_some());
/// assert!(parse_command("Hello, Sesame!").is_none());
/// assert!(parse_command("/etc/hosts looks odd").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    if command.contains('/') {
        return None;
    }
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" => ChatCommand::New,
        "sessions" | "ls" => ChatCommand::Sessions,
        "select" | "switch" => match argument {
            Some(arg) => ChatCommand::Select(SessionRef::parse(arg)),
            None => ChatCommand::Invalid("/select requires a session number or id".to_string()),
        },
        "delete" | "rm" => ChatCommand::Delete(argument.map(SessionRef::parse)),
        "attach" => match argument {
            Some(arg) => ChatCommand::Attach(arg.split_whitespace().map(str::to_string).collect()),
            None => ChatCommand::Invalid("/attach requires at least one file path".to_string()),
        },
        "detach" => parse_index_command(argument, ChatCommand::Detach, "/detach"),
        "attachments" => ChatCommand::Attachments,
        "reasoning" | "think" => match parse_toggle(argument) {
            Ok(value) => ChatCommand::Reasoning(value),
            Err(()) => ChatCommand::Invalid("/reasoning expects 'on' or 'off'".to_string()),
        },
        "search" => match parse_toggle(argument) {
            Ok(value) => ChatCommand::Search(value),
            Err(()) => ChatCommand::Invalid("/search expects 'on' or 'off'".to_string()),
        },
        "expand" => parse_index_command(argument, ChatCommand::Expand, "/expand"),
        "collapse" => parse_index_command(argument, ChatCommand::Collapse, "/collapse"),
        "show" => ChatCommand::Show,
        "suggest" => parse_index_command(argument, ChatCommand::Suggest, "/suggest"),
        "export" => match argument {
            Some(arg) => ChatCommand::Export(arg.to_string()),
            None => ChatCommand::Invalid("/export requires a file path".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "config" => ChatCommand::ShowConfig,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Strip the `//` escape so the message is sent with a single leading slash.
pub fn unescape_message(input: &str) -> &str {
    match input.trim_start().strip_prefix('/') {
        Some(rest) if rest.starts_with('/') => rest,
        _ => input,
    }
}

fn parse_index_command<F>(argument: Option<&str>, constructor: F, name: &str) -> ChatCommand
where
    F: Fn(usize) -> ChatCommand,
{
    match argument {
        Some(arg) => match arg.parse::<usize>() {
            Ok(value) if value > 0 => constructor(value),
            _ => ChatCommand::Invalid(format!("{} expects a positive number", name)),
        },
        None => ChatCommand::Invalid(format!("{} requires a number", name)),
    }
}

fn parse_toggle(argument: Option<&str>) -> Result<Option<bool>, ()> {
    match argument {
        None => Ok(None),
        Some(arg) => parse_on_off(arg).map(Some).ok_or(()),
    }
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new                   Start a new conversation
  /sessions              List conversations
  /select <n|id>         Switch to a conversation
  /delete [n|id]         Delete a conversation (default: the active one)
  /attach <file>...      Attach files to the next message
  /detach <n>            Remove a pending attachment
  /attachments           List pending attachments
  /reasoning [on|off]    Toggle reasoning mode
  /search [on|off]       Toggle web search grounding
  /expand <n>            Show the reasoning trace of message n
  /collapse <n>          Hide the reasoning trace of message n
  /show                  Show the active conversation
  /suggest <n>           Use a suggested prompt
  /export <file>         Write all conversations to a JSON file
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat

Press Enter to send and Alt+Enter for a new line.
Start a message with // to send it with a leading slash."#
}
