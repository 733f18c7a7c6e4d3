//! Send orchestration.
//!
//! The [`ChatController`] ties the session store, the composer and a
//! completion client together. A send happens in two phases so the caller
//! can render between them: [`ChatController::begin_send`] records the user
//! turn and marks the controller as loading, and
//! [`ChatController::finish_send`] records exactly one assistant turn, either
//! the reply or an error-flagged apology.

use std::collections::HashSet;
use std::time::Instant;

use crate::chat::config::ChatConfig;
use crate::client::CompletionClient;
use crate::composer::{Composer, SendRequest};
use crate::error::Result;
use crate::observability::{CHAT_SEND_FAILURES, CHAT_SENDS};
use crate::store::SessionStore;
use crate::types::{Completion, CompletionOptions, Message, Model};

/// A user turn that has been recorded and awaits its reply.
#[derive(Debug, Clone)]
pub struct PendingSend {
    session_id: String,
    model: Model,
    options: CompletionOptions,
    history: Vec<Message>,
    started: Instant,
}

impl PendingSend {
    /// The session the reply will be appended to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The model chosen for this turn.
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn options(&self) -> &CompletionOptions {
        &self.options
    }

    /// The transcript sent to the model, ending with the new user message.
    pub fn history(&self) -> &[Message] {
        &self.history
    }
}

/// Drives conversations: composer in, store and client out.
pub struct ChatController<C: CompletionClient> {
    client: C,
    config: ChatConfig,
    store: SessionStore,
    composer: Composer,
    expanded: HashSet<String>,
    loading: bool,
}

impl<C: CompletionClient> ChatController<C> {
    /// Create a controller; the composer starts in the configured modes.
    pub fn new(client: C, store: SessionStore, config: ChatConfig) -> Self {
        let composer = Composer::with_modes(config.reasoning_enabled, config.search_enabled);
        Self {
            client,
            config,
            store,
            composer,
            expanded: HashSet::new(),
            loading: false,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    /// Returns true while a reply is pending.
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Messages of the active session.
    pub fn active_messages(&self) -> &[Message] {
        self.store
            .active_session()
            .map(|session| session.messages.as_slice())
            .unwrap_or(&[])
    }

    /// Message ids whose reasoning traces are shown.
    pub fn expanded(&self) -> &HashSet<String> {
        &self.expanded
    }

    pub fn is_expanded(&self, message_id: &str) -> bool {
        self.expanded.contains(message_id)
    }

    /// Flip the visibility of a message's reasoning trace; returns the new state.
    pub fn toggle_trace(&mut self, message_id: &str) -> bool {
        if self.expanded.remove(message_id) {
            false
        } else {
            self.expanded.insert(message_id.to_string());
            true
        }
    }

    /// Show or hide a message's reasoning trace.
    pub fn set_trace_expanded(&mut self, message_id: &str, expanded: bool) {
        if expanded {
            self.expanded.insert(message_id.to_string());
        } else {
            self.expanded.remove(message_id);
        }
    }

    /// Record the user turn and mark the controller as loading.
    ///
    /// Returns `None` without side effects when a reply is already pending or
    /// the request carries neither text nor attachments.
    pub fn begin_send(&mut self, request: SendRequest) -> Option<PendingSend> {
        if self.loading {
            return None;
        }
        if request.text.trim().is_empty() && request.attachments.is_empty() {
            return None;
        }
        let options = request.options(self.config.thinking_budget);
        let model = self.config.model_for(options.tier()).clone();
        let session_id = self.store.active_id().to_string();

        let message = Message::user(request.text, request.attachments);
        if !self.store.append_message(&session_id, message) {
            return None;
        }
        let history = self
            .store
            .session(&session_id)
            .map(|session| session.messages.clone())
            .unwrap_or_default();

        CHAT_SENDS.click();
        self.loading = true;
        tracing::debug!(
            session = %session_id,
            %model,
            turns = history.len(),
            reasoning = options.reasoning_enabled,
            search = options.search_enabled,
            "send started"
        );
        Some(PendingSend {
            session_id,
            model,
            options,
            history,
            started: Instant::now(),
        })
    }

    /// Issue the remote call for a pending send.
    pub async fn complete(&self, pending: &PendingSend) -> Result<Completion> {
        self.client
            .complete(&pending.model, &pending.history, &pending.options)
            .await
    }

    /// Record the outcome of a pending send and clear the loading flag.
    ///
    /// Exactly one assistant message is appended to the originating session.
    /// Failures become an error-flagged apology; the underlying error is only
    /// logged.
    pub fn finish_send(&mut self, pending: PendingSend, result: Result<Completion>) -> Message {
        let elapsed = pending.started.elapsed();
        let message = match result {
            Ok(completion) => {
                tracing::info!(
                    session = %pending.session_id,
                    model = %pending.model,
                    elapsed_ms = elapsed.as_millis() as u64,
                    sources = completion.sources.len(),
                    "reply received"
                );
                Message::assistant(
                    completion.text,
                    Some(completion.thinking),
                    completion.sources,
                )
            }
            Err(err) => {
                CHAT_SEND_FAILURES.click();
                tracing::error!(
                    session = %pending.session_id,
                    model = %pending.model,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %err,
                    "completion failed"
                );
                Message::assistant_error()
            }
        };
        if !self.store.append_message(&pending.session_id, message.clone()) {
            tracing::warn!(session = %pending.session_id, "session gone before reply arrived");
        }
        self.loading = false;
        message
    }

    /// Send a request and wait for its reply.
    pub async fn send(&mut self, request: SendRequest) -> Option<Message> {
        let pending = self.begin_send(request)?;
        let result = self.complete(&pending).await;
        Some(self.finish_send(pending, result))
    }

    /// Send whatever the composer holds.
    pub async fn submit(&mut self) -> Option<Message> {
        if self.loading {
            return None;
        }
        let request = self.composer.send()?;
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::MemoryStorage;
    use crate::types::{ERROR_APOLOGY, GroundingSource, Role};

    struct Scripted;

    #[async_trait::async_trait]
    impl CompletionClient for Scripted {
        async fn complete(
            &self,
            _: &Model,
            history: &[Message],
            _: &CompletionOptions,
        ) -> Result<Completion> {
            let last = history.last().map(|m| m.content.clone()).unwrap_or_default();
            if last == "fail" {
                Err(Error::api(500, Some("INTERNAL".to_string()), "boom", None))
            } else {
                Ok(Completion::new(
                    format!("echo: {last}"),
                    "thought",
                    vec![GroundingSource::new("S", "https://s.example")],
                ))
            }
        }
    }

    fn controller() -> ChatController<Scripted> {
        ChatController::new(
            Scripted,
            SessionStore::load(MemoryStorage::new()),
            ChatConfig::new(),
        )
    }

    fn request(text: &str, reasoning: bool, search: bool) -> SendRequest {
        SendRequest {
            text: text.to_string(),
            attachments: Vec::new(),
            reasoning_enabled: reasoning,
            search_enabled: search,
        }
    }

    #[test]
    fn begin_send_records_user_turn_and_loads() {
        let mut chat = controller();
        let pending = chat.begin_send(request("hello", false, false)).unwrap();
        assert!(chat.loading());
        assert_eq!(chat.active_messages().len(), 1);
        assert_eq!(chat.active_messages()[0].role, Role::User);
        assert_eq!(pending.history().len(), 1);
        assert_eq!(pending.model().to_string(), "gemini-3-flash-preview");
        assert!(chat.begin_send(request("again", false, false)).is_none());
    }

    #[test]
    fn modes_select_capable_model() {
        let mut chat = controller();
        let pending = chat.begin_send(request("hello", true, false)).unwrap();
        assert_eq!(pending.model().to_string(), "gemini-3-pro-preview");
        assert!(pending.options().reasoning_enabled);
        assert_eq!(pending.options().thinking_budget, 16_000);
    }

    #[test]
    fn empty_request_is_ignored() {
        let mut chat = controller();
        assert!(chat.begin_send(request("   ", false, false)).is_none());
        assert!(!chat.loading());
        assert!(chat.active_messages().is_empty());
    }

    #[test]
    fn finish_send_error_appends_apology() {
        let mut chat = controller();
        let pending = chat.begin_send(request("hello", false, false)).unwrap();
        let message = chat.finish_send(pending, Err(Error::api(429, None, "slow down", Some(5))));
        assert!(!chat.loading());
        assert!(message.is_error());
        assert_eq!(message.content, ERROR_APOLOGY);
        assert_eq!(chat.active_messages().len(), 2);
    }

    #[test]
    fn finish_send_goes_to_originating_session() {
        let mut chat = controller();
        let origin = chat.store().active_id().to_string();
        let pending = chat.begin_send(request("hello", false, false)).unwrap();
        let other = chat.store_mut().create_session().id;
        chat.finish_send(pending, Ok(Completion::new("hi", "", Vec::new())));
        assert_eq!(chat.store().session(&origin).unwrap().messages.len(), 2);
        assert!(chat.store().session(&other).unwrap().messages.is_empty());
    }

    #[test]
    fn finish_send_after_session_deleted_is_dropped() {
        let mut chat = controller();
        let origin = chat.store().active_id().to_string();
        let pending = chat.begin_send(request("hello", false, false)).unwrap();
        chat.store_mut().delete_session(&origin);
        chat.finish_send(pending, Ok(Completion::new("hi", "", Vec::new())));
        assert!(!chat.loading());
        assert!(chat.store().session(&origin).is_none());
        assert!(chat.active_messages().is_empty());
    }

    #[tokio::test]
    async fn send_success_appends_reply() {
        let mut chat = controller();
        let reply = chat.send(request("ping", false, true)).await.unwrap();
        assert_eq!(reply.content, "echo: ping");
        assert_eq!(reply.thinking(), Some("thought"));
        assert_eq!(reply.sources().len(), 1);
        assert!(!chat.loading());
        let roles: Vec<Role> = chat.active_messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn send_failure_appends_error_message() {
        let mut chat = controller();
        let reply = chat.send(request("fail", false, false)).await.unwrap();
        assert!(reply.is_error());
        assert_eq!(chat.active_messages().len(), 2);
    }

    #[tokio::test]
    async fn submit_drains_composer_and_keeps_modes() {
        let mut chat = controller();
        chat.composer_mut().set_search(true);
        chat.composer_mut().set_draft("  from the composer ");
        let reply = chat.submit().await.unwrap();
        assert_eq!(reply.content, "echo:   from the composer ");
        assert_eq!(chat.active_messages()[0].content, "  from the composer ");
        assert_eq!(chat.composer().draft(), "");
        assert!(chat.composer().search_enabled());
        assert!(chat.submit().await.is_none());
    }

    #[test]
    fn trace_toggling() {
        let mut chat = controller();
        assert!(chat.toggle_trace("m1"));
        assert!(chat.is_expanded("m1"));
        assert!(!chat.toggle_trace("m1"));
        chat.set_trace_expanded("m2", true);
        assert!(chat.expanded().contains("m2"));
        chat.set_trace_expanded("m2", false);
        assert!(chat.expanded().is_empty());
    }
}
