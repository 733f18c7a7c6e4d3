//! End-to-end chat flows driven through the controller with a scripted client.

use std::sync::{Arc, Mutex};

use sesame::chat::{ChatConfig, ChatController};
use sesame::{
    Completion, CompletionClient, CompletionOptions, ERROR_APOLOGY, Error, GenerateContentRequest,
    GroundingSource, MemoryStorage, Message, Model, Result, Role, SendRequest, SessionStore,
    Storage,
};

/// One observed call to the completion client.
#[derive(Debug, Clone)]
struct Call {
    model: Model,
    request: GenerateContentRequest,
}

/// Replies from a script and records every request it sees.
#[derive(Clone, Default)]
struct ScriptedClient {
    replies: Arc<Mutex<Vec<Result<Completion>>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl ScriptedClient {
    fn replying(replies: Vec<Result<Completion>>) -> Self {
        let mut replies = replies;
        replies.reverse();
        Self {
            replies: Arc::new(Mutex::new(replies)),
            calls: Arc::default(),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        model: &Model,
        history: &[Message],
        options: &CompletionOptions,
    ) -> Result<Completion> {
        self.calls.lock().unwrap().push(Call {
            model: model.clone(),
            request: GenerateContentRequest::from_history(history, options, Some(0.7)),
        });
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Ok(Completion::new("ok", "", Vec::new())))
    }
}

fn text_request(text: &str, reasoning: bool, search: bool) -> SendRequest {
    SendRequest {
        text: text.to_string(),
        attachments: Vec::new(),
        reasoning_enabled: reasoning,
        search_enabled: search,
    }
}

fn controller(
    client: ScriptedClient,
    storage: MemoryStorage,
) -> ChatController<ScriptedClient> {
    ChatController::new(client, SessionStore::load(storage), ChatConfig::new())
}

#[test]
fn first_run_has_one_empty_active_session() {
    let chat = controller(ScriptedClient::default(), MemoryStorage::new());
    let sessions = chat.store().list_sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].title, "New Conversation");
    assert!(sessions[0].messages.is_empty());
    assert_eq!(chat.store().active_id(), sessions[0].id);
}

#[tokio::test]
async fn plain_send_uses_light_model_without_search() {
    let client = ScriptedClient::replying(vec![Ok(Completion::new(
        "Here is the latest.",
        "",
        Vec::new(),
    ))]);
    let mut chat = controller(client.clone(), MemoryStorage::new());

    let reply = chat
        .send(text_request("Summarize recent AI news", false, false))
        .await
        .unwrap();

    let session = chat.store().active_session().unwrap();
    assert_eq!(session.title, "Summarize recent AI news");
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].role, Role::User);
    assert_eq!(session.messages[1].role, Role::Assistant);
    assert_eq!(reply.content, "Here is the latest.");

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model.to_string(), "gemini-3-flash-preview");
    assert!(calls[0].request.tools.is_empty());
    let config = calls[0].request.generation_config.as_ref().unwrap();
    assert!(config.thinking_config.is_none());
}

#[tokio::test]
async fn any_mode_uses_capable_model() {
    for (reasoning, search) in [(true, false), (false, true), (true, true)] {
        let client = ScriptedClient::default();
        let mut chat = controller(client.clone(), MemoryStorage::new());
        chat.send(text_request("hi", reasoning, search)).await.unwrap();
        let call = &client.calls()[0];
        assert_eq!(call.model.to_string(), "gemini-3-pro-preview");
        assert_eq!(call.request.tools.len(), usize::from(search));
        let config = call.request.generation_config.as_ref().unwrap();
        assert_eq!(config.thinking_config.is_some(), reasoning);
    }
}

#[tokio::test]
async fn failed_call_appends_one_error_message() {
    let client = ScriptedClient::replying(vec![Err(Error::api(
        503,
        Some("UNAVAILABLE".to_string()),
        "overloaded",
        None,
    ))]);
    let mut chat = controller(client, MemoryStorage::new());

    let reply = chat.send(text_request("hello", false, false)).await.unwrap();
    assert!(!chat.loading());
    assert!(reply.is_error());

    let messages = chat.active_messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, ERROR_APOLOGY);
    assert_eq!(messages[1].is_error, Some(true));
}

#[tokio::test]
async fn attachment_only_send_carries_one_inline_payload() {
    let dir = std::env::temp_dir().join(format!("sesame-flow-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join("chart.png");
    tokio::fs::write(&path, [0x89, b'P', b'N', b'G']).await.unwrap();

    let client = ScriptedClient::default();
    let mut chat = controller(client.clone(), MemoryStorage::new());
    chat.composer_mut().attach(&path).await.unwrap();
    chat.composer_mut().set_draft("");

    let reply = chat.submit().await;
    assert!(reply.is_some());

    let session = chat.store().active_session().unwrap();
    assert_eq!(session.title, "Image Chat");
    assert_eq!(session.messages[0].attachments().len(), 1);

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].request.inline_data_count(), 1);
    let part = &calls[0].request.contents[0].parts[0];
    assert_eq!(part.inline_data.as_ref().unwrap().mime_type, "image/png");

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn every_send_adds_exactly_two_messages_and_title_is_stable() {
    let client = ScriptedClient::replying(vec![
        Ok(Completion::new("one", "", Vec::new())),
        Err(Error::timeout("slow", None)),
        Ok(Completion::new("three", "", Vec::new())),
    ]);
    let mut chat = controller(client.clone(), MemoryStorage::new());
    for (i, text) in ["first question", "second", "third"].iter().enumerate() {
        chat.send(text_request(text, false, false)).await.unwrap();
        assert_eq!(chat.active_messages().len(), (i + 1) * 2);
        assert_eq!(
            chat.store().active_session().unwrap().title,
            "first question"
        );
    }
    // The whole transcript, error turns included, is resent each time.
    let calls = client.calls();
    assert_eq!(calls[2].request.contents.len(), 5);
}

#[tokio::test]
async fn conversations_survive_a_restart() {
    let storage = MemoryStorage::new();
    let client = ScriptedClient::replying(vec![Ok(Completion::new(
        "**A cat.**",
        "looked at whiskers",
        vec![GroundingSource::new("Cats", "https://cats.example")],
    ))]);
    let (before, active) = {
        let mut chat = controller(client, storage.clone());
        chat.send(text_request("What is this?", true, true)).await.unwrap();
        chat.store_mut().create_session();
        (chat.store().list_sessions(), chat.store().active_id().to_string())
    };
    assert!(storage.get("sesame_sessions").unwrap().is_some());

    let chat = controller(ScriptedClient::default(), storage);
    assert_eq!(chat.store().list_sessions(), before);
    assert_eq!(chat.store().active_id(), active);

    let answered = &chat.store().list_sessions()[1];
    let reply = &answered.messages[1];
    assert_eq!(reply.thinking(), Some("looked at whiskers"));
    assert_eq!(reply.sources()[0].uri, "https://cats.example");
}

#[tokio::test]
async fn switching_sessions_keeps_histories_apart() {
    let client = ScriptedClient::default();
    let mut chat = controller(client.clone(), MemoryStorage::new());
    let first = chat.store().active_id().to_string();
    chat.send(text_request("in first", false, false)).await.unwrap();

    let second = chat.store_mut().create_session().id;
    chat.send(text_request("in second", false, false)).await.unwrap();

    assert!(chat.store_mut().select_session(&first));
    assert_eq!(chat.active_messages()[0].content, "in first");
    assert_eq!(
        chat.store().session(&second).unwrap().messages[0].content,
        "in second"
    );
    // Each request only saw its own session.
    assert_eq!(client.calls()[1].request.contents.len(), 1);
}
