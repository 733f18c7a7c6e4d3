//! Interactive chat application for conversing with Gemini.
//!
//! This binary provides a multi-session REPL on top of the sesame library.
//! Conversations persist in the data directory between runs.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! sesame-chat
//!
//! # Start with reasoning and search enabled
//! sesame-chat --reasoning --search
//!
//! # Keep state somewhere else
//! sesame-chat --store /tmp/sesame
//!
//! # Disable colors (useful for piping output)
//! sesame-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/new` - Start a new conversation
//! - `/sessions` - List conversations
//! - `/attach <file>...` - Attach files to the next message
//! - `/reasoning`, `/search` - Toggle modes
//! - `/quit` - Exit the application

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use arrrg::CommandLine;
use rustyline::error::ReadlineError;
use rustyline::{Cmd, DefaultEditor, KeyCode, KeyEvent, Modifiers};
use tracing_subscriber::EnvFilter;

use sesame::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatController, PlainTextRenderer, Renderer, SessionRef,
    help_text, parse_command, unescape_message,
};
use sesame::render::render_attachments;
use sesame::store::export_sessions;
use sesame::{FileStorage, Gemini, SessionStore};

type Chat = ChatController<Gemini>;

/// Main entry point for the sesame-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("sesame-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    init_logging(&data_dir)?;

    let client = Gemini::with_options(None, config.base_url.clone(), config.timeout)?
        .with_temperature(Some(config.temperature));
    let store = SessionStore::load(FileStorage::new(&data_dir));
    let mut chat = ChatController::new(client, store, config);
    let mut renderer = PlainTextRenderer::with_color(use_color);

    let mut rl = DefaultEditor::new()?;
    rl.bind_sequence(KeyEvent(KeyCode::Enter, Modifiers::ALT), Cmd::Newline);

    // Requests are not cancellable; Ctrl+C while one is pending only prints a notice.
    let pending = Arc::new(AtomicBool::new(false));
    let pending_clone = pending.clone();
    ctrlc::set_handler(move || {
        if pending_clone.load(Ordering::Relaxed) {
            eprintln!("\n(waiting for the reply; it cannot be cancelled)");
        }
    })?;

    println!(
        "Sesame Chat (models: {} / {})",
        chat.config().light_model,
        chat.config().capable_model
    );
    println!("Type /help for commands, /quit to exit\n");
    renderer.print_transcript(chat.active_messages(), chat.expanded(), false);

    loop {
        let prompt = prompt_for(&chat);
        let draft = chat.composer().draft().to_string();
        let readline = rl.readline_with_initial(&prompt, (&draft, ""));

        match readline {
            Ok(line) => {
                chat.composer_mut().set_draft("");
                if line.trim().is_empty() && chat.composer().attachments().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                if let Some(cmd) = parse_command(&line) {
                    if !handle_command(cmd, &mut chat, &mut renderer).await {
                        break;
                    }
                    continue;
                }

                chat.composer_mut().set_draft(unescape_message(&line));
                let Some(request) = chat.composer_mut().send() else {
                    continue;
                };
                let has_attachments = !request.attachments.is_empty();
                let Some(pending_send) = chat.begin_send(request) else {
                    continue;
                };
                if has_attachments {
                    let index = chat.active_messages().len();
                    if let Some(message) = chat.active_messages().last() {
                        renderer.print_message(message, index, false);
                    }
                }
                renderer.print_loading();

                pending.store(true, Ordering::Relaxed);
                let result = chat.complete(&pending_send).await;
                pending.store(false, Ordering::Relaxed);

                let reply = chat.finish_send(pending_send, result);
                let index = chat.active_messages().len();
                renderer.print_message(&reply, index, chat.is_expanded(&reply.id));
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - discard the line
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn init_logging(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("sesame.log"))?;
    let filter = EnvFilter::try_from_env("SESAME_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn prompt_for(chat: &Chat) -> String {
    let composer = chat.composer();
    let mut tags = Vec::new();
    if composer.reasoning_enabled() {
        tags.push("reasoning".to_string());
    }
    if composer.search_enabled() {
        tags.push("search".to_string());
    }
    if !composer.attachments().is_empty() {
        tags.push(format!("{} attached", composer.attachments().len()));
    }
    if tags.is_empty() {
        "You: ".to_string()
    } else {
        format!("[{}] You: ", tags.join(", "))
    }
}

/// Runs one slash command. Returns false when the REPL should exit.
async fn handle_command(
    cmd: ChatCommand,
    chat: &mut Chat,
    renderer: &mut PlainTextRenderer,
) -> bool {
    match cmd {
        ChatCommand::Quit => {
            println!("Goodbye!");
            return false;
        }
        ChatCommand::Help => {
            for line in help_text().lines() {
                println!("    {}", line);
            }
        }
        ChatCommand::New => {
            chat.store_mut().create_session();
            renderer.print_info("Started a new conversation.");
            renderer.print_transcript(chat.active_messages(), chat.expanded(), false);
        }
        ChatCommand::Sessions => {
            let sessions = chat.store().list_sessions();
            renderer.print_sessions(&sessions, chat.store().active_id());
        }
        ChatCommand::Select(target) => {
            let selected = resolve_session(chat, &target)
                .is_some_and(|id| chat.store_mut().select_session(&id));
            if selected {
                renderer.print_transcript(chat.active_messages(), chat.expanded(), false);
            } else {
                renderer.print_error("No such conversation.");
            }
        }
        ChatCommand::Delete(target) => {
            let id = match target {
                Some(target) => resolve_session(chat, &target),
                None => Some(chat.store().active_id().to_string()),
            };
            if id.is_some_and(|id| chat.store_mut().delete_session(&id)) {
                renderer.print_info("Conversation deleted.");
                renderer.print_transcript(chat.active_messages(), chat.expanded(), false);
            } else {
                renderer.print_error("No such conversation.");
            }
        }
        ChatCommand::Attach(paths) => {
            let failures = chat.composer_mut().attach_all(&paths).await;
            for (path, err) in failures {
                renderer.print_error(&format!("Could not attach {}: {}", path.display(), err));
            }
            print_attachments(chat, renderer);
        }
        ChatCommand::Detach(index) => {
            let id = chat
                .composer()
                .attachments()
                .get(index - 1)
                .map(|attachment| attachment.id.clone());
            if id.is_some_and(|id| chat.composer_mut().remove_attachment(&id)) {
                print_attachments(chat, renderer);
            } else {
                renderer.print_error("No such attachment.");
            }
        }
        ChatCommand::Attachments => print_attachments(chat, renderer),
        ChatCommand::Reasoning(value) => {
            let enabled = match value {
                Some(enabled) => {
                    chat.composer_mut().set_reasoning(enabled);
                    enabled
                }
                None => chat.composer_mut().toggle_reasoning(),
            };
            renderer.print_info(&format!("Reasoning mode {}.", on_off(enabled)));
        }
        ChatCommand::Search(value) => {
            let enabled = match value {
                Some(enabled) => {
                    chat.composer_mut().set_search(enabled);
                    enabled
                }
                None => chat.composer_mut().toggle_search(),
            };
            renderer.print_info(&format!("Search grounding {}.", on_off(enabled)));
        }
        ChatCommand::Expand(index) => set_trace(chat, renderer, index, true),
        ChatCommand::Collapse(index) => set_trace(chat, renderer, index, false),
        ChatCommand::Show => {
            renderer.print_transcript(chat.active_messages(), chat.expanded(), false);
        }
        ChatCommand::Suggest(index) => match chat.composer_mut().use_suggestion(index - 1) {
            Some(prompt) => renderer.print_info(&format!("Draft: {prompt}")),
            None => renderer.print_error("No such suggestion."),
        },
        ChatCommand::Export(path) => {
            match export_sessions(&chat.store().list_sessions(), &path) {
                Ok(()) => renderer.print_info(&format!("Conversations exported to {}", path)),
                Err(err) => renderer.print_error(&format!("Failed to export: {}", err)),
            }
        }
        ChatCommand::ShowConfig => print_config(chat),
        ChatCommand::Invalid(message) => renderer.print_error(&message),
    }
    true
}

fn set_trace(chat: &mut Chat, renderer: &mut PlainTextRenderer, index: usize, expand: bool) {
    let message = chat.active_messages().get(index - 1).cloned();
    match message {
        Some(message) if message.thinking().is_some() => {
            chat.set_trace_expanded(&message.id, expand);
            renderer.print_message(&message, index, expand);
        }
        Some(_) => renderer.print_error("That message has no reasoning trace."),
        None => renderer.print_error("No such message."),
    }
}

fn resolve_session(chat: &Chat, target: &SessionRef) -> Option<String> {
    let sessions = chat.store().list_sessions();
    match target {
        SessionRef::Index(index) => sessions
            .get(index.checked_sub(1)?)
            .map(|session| session.id.clone()),
        SessionRef::Id(id) => sessions
            .iter()
            .find(|session| session.id == *id || session.id.starts_with(id.as_str()))
            .map(|session| session.id.clone()),
    }
}

fn print_attachments(chat: &Chat, renderer: &mut PlainTextRenderer) {
    let attachments = chat.composer().attachments();
    if attachments.is_empty() {
        renderer.print_info("No pending attachments.");
        return;
    }
    for (i, attachment) in attachments.iter().enumerate() {
        let chip = render_attachments(std::slice::from_ref(attachment), renderer.options());
        renderer.print_info(&format!("  {}. {}", i + 1, chip));
    }
}

fn print_config(chat: &Chat) {
    let config = chat.config();
    let composer = chat.composer();
    println!("    Current Configuration:");
    println!("      Light model: {}", config.light_model);
    println!("      Capable model: {}", config.capable_model);
    println!("      Temperature: {:.2}", config.temperature);
    println!("      Thinking budget: {}", config.thinking_budget);
    println!("      Reasoning: {}", on_off(composer.reasoning_enabled()));
    println!("      Search: {}", on_off(composer.search_enabled()));
    println!("      Data directory: {}", config.data_dir().display());
    match config.base_url.as_deref() {
        Some(url) => println!("      Base URL: {}", url),
        None => println!("      Base URL: (default)"),
    }
    match config.timeout {
        Some(timeout) => println!("      Timeout: {}s", timeout.as_secs()),
        None => println!("      Timeout: (none)"),
    }
    println!("      Sessions: {}", chat.store().list_sessions().len());
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
