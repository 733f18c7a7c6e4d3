//! Output rendering for the chat transcript.
//!
//! The free functions here are pure: they turn messages and sessions into
//! strings with optional ANSI styling. The [`Renderer`] trait and its
//! [`PlainTextRenderer`] implementation write those strings to a terminal.

use std::collections::HashSet;
use std::io::{self, Stdout, Write};

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::composer::SUGGESTED_PROMPTS;
use crate::types::{Attachment, AttachmentKind, ChatSession, GroundingSource, Message, Role};
use crate::utils::time::format_millis;

/// ANSI escape code for bold text (used for headings and strong emphasis).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for reasoning traces).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text (used for reasoning traces).
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for code).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for attachment chips).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for green text (used for the user label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for failed replies).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for magenta text (used for the assistant label).
const ANSI_MAGENTA: &str = "\x1b[35m";

/// Placeholder shown while a reply is pending.
pub const LOADING_TEXT: &str = "Sesame is thinking...";

/// Heading of the empty-conversation view.
pub const WELCOME_TEXT: &str = "How can I help you today?";

/// Footer printed under the welcome view.
pub const DISCLAIMER_TEXT: &str = "Sesame can make mistakes. Verify important info.";

/// Citation chip titles longer than this are shortened.
pub const SOURCE_TITLE_MAX_CHARS: usize = 30;

/// Styling switches shared by the render functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit ANSI escape codes.
    pub use_color: bool,
}

impl RenderOptions {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn style(&self, code: &'static str) -> &'static str {
        if self.use_color { code } else { "" }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { use_color: true }
    }
}

/// Shorten `title` to `max_chars` characters, marking the cut with `...`.
pub fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() > max_chars {
        let mut short: String = title.chars().take(max_chars).collect();
        short.push_str("...");
        short
    } else {
        title.to_string()
    }
}

/// Display label for a role.
pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Sesame",
        Role::System => "System",
    }
}

/// Render Markdown to terminal text.
///
/// Supports paragraphs, headings, emphasis, bulleted and numbered lists,
/// inline code, fenced and indented code blocks, and links.
pub fn render_markdown(text: &str, opts: &RenderOptions) -> String {
    let mut out = String::new();
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut code_block: Option<String> = None;
    let mut links: Vec<String> = Vec::new();

    for event in Parser::new_ext(text, Options::empty()) {
        if let Some(code) = code_block.as_mut() {
            match &event {
                Event::Text(text) => {
                    code.push_str(text);
                    continue;
                }
                Event::End(TagEnd::CodeBlock) => {}
                _ => continue,
            }
        }
        match event {
            Event::Start(tag) => match tag {
                Tag::Paragraph => {
                    if lists.is_empty() {
                        block_break(&mut out);
                    } else if !out.ends_with(' ') {
                        ensure_newline(&mut out);
                    }
                }
                Tag::Heading { .. } => {
                    block_break(&mut out);
                    out.push_str(opts.style(ANSI_BOLD));
                }
                Tag::CodeBlock(kind) => {
                    if lists.is_empty() {
                        block_break(&mut out);
                    } else {
                        ensure_newline(&mut out);
                    }
                    if let CodeBlockKind::Fenced(lang) = kind {
                        if !lang.is_empty() {
                            out.push_str(opts.style(ANSI_DIM));
                            out.push_str(&format!("    [{lang}]"));
                            out.push_str(opts.style(ANSI_RESET));
                            out.push('\n');
                        }
                    }
                    code_block = Some(String::new());
                }
                Tag::List(start) => {
                    if lists.is_empty() {
                        block_break(&mut out);
                    } else {
                        ensure_newline(&mut out);
                    }
                    lists.push(start);
                }
                Tag::Item => {
                    ensure_newline(&mut out);
                    let depth = lists.len().saturating_sub(1);
                    out.push_str(&"  ".repeat(depth));
                    match lists.last_mut() {
                        Some(Some(n)) => {
                            out.push_str(&format!("{n}. "));
                            *n += 1;
                        }
                        _ => out.push_str("- "),
                    }
                }
                Tag::Emphasis => out.push_str(opts.style(ANSI_ITALIC)),
                Tag::Strong => out.push_str(opts.style(ANSI_BOLD)),
                Tag::Link { dest_url, .. } => links.push(dest_url.to_string()),
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Paragraph => out.push('\n'),
                TagEnd::Heading(_) => {
                    out.push_str(opts.style(ANSI_RESET));
                    out.push('\n');
                }
                TagEnd::CodeBlock => {
                    let code = code_block.take().unwrap_or_default();
                    out.push_str(opts.style(ANSI_CYAN));
                    let lines: Vec<String> = code
                        .trim_end_matches('\n')
                        .lines()
                        .map(|line| format!("    {line}"))
                        .collect();
                    out.push_str(&lines.join("\n"));
                    out.push_str(opts.style(ANSI_RESET));
                    out.push('\n');
                }
                TagEnd::List(_) => {
                    lists.pop();
                    ensure_newline(&mut out);
                }
                TagEnd::Item => ensure_newline(&mut out),
                TagEnd::Emphasis | TagEnd::Strong => out.push_str(opts.style(ANSI_RESET)),
                TagEnd::Link => {
                    if let Some(url) = links.pop() {
                        out.push_str(opts.style(ANSI_DIM));
                        out.push_str(&format!(" ({url})"));
                        out.push_str(opts.style(ANSI_RESET));
                    }
                }
                _ => {}
            },
            Event::Text(text) => out.push_str(&text),
            Event::Code(code) => {
                if opts.use_color {
                    out.push_str(ANSI_CYAN);
                    out.push_str(&code);
                    out.push_str(ANSI_RESET);
                } else {
                    out.push('`');
                    out.push_str(&code);
                    out.push('`');
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => out.push_str(&html),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Rule => {
                block_break(&mut out);
                out.push_str("----\n");
            }
            _ => {}
        }
    }

    out.truncate(out.trim_end().len());
    out
}

fn ensure_newline(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn block_break(out: &mut String) {
    if out.is_empty() {
        return;
    }
    ensure_newline(out);
    if !out.ends_with("\n\n") {
        out.push('\n');
    }
}

/// Render the attachment chips of a message.
pub fn render_attachments(attachments: &[Attachment], opts: &RenderOptions) -> String {
    attachments
        .iter()
        .map(|attachment| {
            let kind = match attachment.kind {
                AttachmentKind::Image => "image",
                AttachmentKind::File => "file",
            };
            format!(
                "{}[{kind}: {}]{}",
                opts.style(ANSI_YELLOW),
                attachment.name,
                opts.style(ANSI_RESET)
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render citation chips, one per line.
pub fn render_sources(sources: &[GroundingSource], opts: &RenderOptions) -> String {
    sources
        .iter()
        .map(|source| {
            format!(
                "  {}↗ {}{} {}{}{}",
                opts.style(ANSI_CYAN),
                truncate_title(&source.title, SOURCE_TITLE_MAX_CHARS),
                opts.style(ANSI_RESET),
                opts.style(ANSI_DIM),
                source.uri,
                opts.style(ANSI_RESET),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a reasoning trace, collapsed to a one-line summary unless `expanded`.
pub fn render_thinking(
    thinking: &str,
    index: usize,
    expanded: bool,
    opts: &RenderOptions,
) -> String {
    if !expanded {
        return format!(
            "{}▸ View Reasoning Process (/expand {index}){}",
            opts.style(ANSI_DIM),
            opts.style(ANSI_RESET)
        );
    }
    let body = render_markdown(thinking, &RenderOptions::new(false));
    let mut out = format!(
        "{}▾ Reasoning Process{}\n",
        opts.style(ANSI_DIM),
        opts.style(ANSI_RESET)
    );
    for line in body.lines() {
        out.push_str(&format!(
            "{}{}│ {line}{}\n",
            opts.style(ANSI_DIM),
            opts.style(ANSI_ITALIC),
            opts.style(ANSI_RESET)
        ));
    }
    out.truncate(out.trim_end().len());
    out
}

/// Render one message. `index` is the 1-based position used by `/expand`.
pub fn render_message(
    message: &Message,
    index: usize,
    expanded: bool,
    opts: &RenderOptions,
) -> String {
    let label_color = match message.role {
        Role::User => ANSI_GREEN,
        Role::Assistant | Role::System => ANSI_MAGENTA,
    };
    let mut sections = vec![format!(
        "{}{}[{index}] {}{} {}{}{}",
        opts.style(ANSI_BOLD),
        opts.style(label_color),
        role_label(message.role),
        opts.style(ANSI_RESET),
        opts.style(ANSI_DIM),
        format_millis(message.timestamp),
        opts.style(ANSI_RESET),
    )];

    if let Some(thinking) = message.thinking() {
        sections.push(render_thinking(thinking, index, expanded, opts));
    }
    if !message.attachments().is_empty() {
        sections.push(render_attachments(message.attachments(), opts));
    }
    if message.is_error() {
        sections.push(format!(
            "{}✗ {}{}",
            opts.style(ANSI_RED),
            message.content,
            opts.style(ANSI_RESET)
        ));
    } else if message.role == Role::Assistant {
        let body = render_markdown(&message.content, opts);
        if !body.is_empty() {
            sections.push(body);
        }
    } else if !message.content.is_empty() {
        sections.push(message.content.clone());
    }
    if !message.sources().is_empty() {
        sections.push(render_sources(message.sources(), opts));
    }
    sections.join("\n")
}

/// Render the welcome view shown for an empty conversation.
pub fn render_welcome(opts: &RenderOptions) -> String {
    let mut out = format!(
        "{}{WELCOME_TEXT}{}\n",
        opts.style(ANSI_BOLD),
        opts.style(ANSI_RESET)
    );
    for (i, prompt) in SUGGESTED_PROMPTS.iter().enumerate() {
        out.push_str(&format!(
            "  {}/suggest {}{}  {prompt}\n",
            opts.style(ANSI_DIM),
            i + 1,
            opts.style(ANSI_RESET)
        ));
    }
    out.push_str(&format!(
        "{}{DISCLAIMER_TEXT}{}",
        opts.style(ANSI_DIM),
        opts.style(ANSI_RESET)
    ));
    out
}

/// Render the loading placeholder.
pub fn render_loading(opts: &RenderOptions) -> String {
    format!(
        "{}{}{LOADING_TEXT}{}",
        opts.style(ANSI_MAGENTA),
        opts.style(ANSI_DIM),
        opts.style(ANSI_RESET)
    )
}

/// Render a whole conversation.
///
/// Reasoning traces are collapsed unless the message id is in `expanded`.
/// The loading placeholder follows the last message while `loading` is set.
pub fn render_transcript(
    messages: &[Message],
    expanded: &HashSet<String>,
    loading: bool,
    opts: &RenderOptions,
) -> String {
    let mut blocks = Vec::with_capacity(messages.len() + 1);
    if messages.is_empty() && !loading {
        blocks.push(render_welcome(opts));
    }
    for (i, message) in messages.iter().enumerate() {
        blocks.push(render_message(
            message,
            i + 1,
            expanded.contains(&message.id),
            opts,
        ));
    }
    if loading {
        blocks.push(render_loading(opts));
    }
    blocks.join("\n\n")
}

/// Render the session list with the active session marked.
pub fn render_session_list(
    sessions: &[ChatSession],
    active_id: &str,
    opts: &RenderOptions,
) -> String {
    let mut out = format!("{}Recent Chats{}\n", opts.style(ANSI_BOLD), opts.style(ANSI_RESET));
    if sessions.is_empty() {
        out.push_str("  No history yet");
        return out;
    }
    let lines: Vec<String> = sessions
        .iter()
        .enumerate()
        .map(|(i, session)| {
            let title = if session.title.is_empty() {
                "Untitled Chat"
            } else {
                session.title.as_str()
            };
            let title = truncate_title(title, SOURCE_TITLE_MAX_CHARS);
            if session.id == active_id {
                format!(
                    "{}* {:>2}. {title}{} ({} messages)",
                    opts.style(ANSI_GREEN),
                    i + 1,
                    opts.style(ANSI_RESET),
                    session.messages.len()
                )
            } else {
                format!("  {:>2}. {title} ({} messages)", i + 1, session.messages.len())
            }
        })
        .collect();
    out.push_str(&lines.join("\n"));
    out
}

///////////////////////////////////////////// Renderer /////////////////////////////////////////////

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Print a whole conversation.
    fn print_transcript(
        &mut self,
        messages: &[Message],
        expanded: &HashSet<String>,
        loading: bool,
    );

    /// Print one message.
    fn print_message(&mut self, message: &Message, index: usize, expanded: bool);

    /// Print the session list.
    fn print_sessions(&mut self, sessions: &[ChatSession], active_id: &str);

    /// Print the loading placeholder.
    fn print_loading(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
///
/// This renderer writes directly to stdout.
pub struct PlainTextRenderer {
    stdout: Stdout,
    opts: RenderOptions,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            opts: RenderOptions::new(use_color),
        }
    }

    /// The styling options in effect.
    pub fn options(&self) -> &RenderOptions {
        &self.opts
    }

    fn write_block(&mut self, block: &str) {
        let mut out = self.stdout.lock();
        let _ = writeln!(out, "{block}");
        let _ = out.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_transcript(
        &mut self,
        messages: &[Message],
        expanded: &HashSet<String>,
        loading: bool,
    ) {
        let block = render_transcript(messages, expanded, loading, &self.opts);
        self.write_block(&block);
    }

    fn print_message(&mut self, message: &Message, index: usize, expanded: bool) {
        let block = render_message(message, index, expanded, &self.opts);
        self.write_block(&format!("{block}\n"));
    }

    fn print_sessions(&mut self, sessions: &[ChatSession], active_id: &str) {
        let block = render_session_list(sessions, active_id, &self.opts);
        self.write_block(&block);
    }

    fn print_loading(&mut self) {
        let block = render_loading(&self.opts);
        self.write_block(&block);
    }

    fn print_error(&mut self, error: &str) {
        if self.opts.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.write_block(info);
    }
}
