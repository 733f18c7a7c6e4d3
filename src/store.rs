//! Session list storage and persistence.
//!
//! The [`SessionStore`] owns the ordered list of chat sessions and the id of
//! the active one. Every change replaces the list with a fresh copy, writes
//! the whole list to a single [`Storage`] slot, and publishes a
//! [`StoreSnapshot`] to subscribers.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::to_writer;
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::observability::{STORE_LOAD_FALLBACKS, STORE_SAVE_ERRORS, STORE_SAVES};
use crate::types::{ChatSession, Message};

/// Key of the slot holding the serialized session list.
pub const SESSIONS_KEY: &str = "sesame_sessions";

/// A durable key-value slot for serialized state.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `dir`. The directory is created on first write.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The directory holding the stored files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::io(format!("failed to read {key}"), err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| Error::io("failed to create storage directory", err))?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        {
            let file = File::create(&tmp)
                .map_err(|err| Error::io(format!("failed to create {}", tmp.display()), err))?;
            let mut writer = BufWriter::new(file);
            writer
                .write_all(value.as_bytes())
                .and_then(|_| writer.flush())
                .map_err(|err| Error::io(format!("failed to write {}", tmp.display()), err))?;
        }
        fs::rename(&tmp, &path)
            .map_err(|err| Error::io(format!("failed to replace {}", path.display()), err))
    }
}

/// Keeps values in memory; used in tests and for throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-seeded with one value.
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::new();
        // A fresh mutex cannot be poisoned.
        if let Ok(mut values) = storage.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        storage
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| Error::validation("memory storage lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| Error::validation("memory storage lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// An immutable view of the store, published after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    /// All sessions, most recently created first.
    pub sessions: Arc<Vec<ChatSession>>,

    /// Id of the active session.
    pub active_id: String,
}

impl StoreSnapshot {
    /// The active session.
    pub fn active(&self) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == self.active_id)
    }
}

/// The ordered list of chat sessions, synchronized to a storage slot.
///
/// The list is never observably empty: deleting the last session creates a
/// fresh one in its place.
pub struct SessionStore {
    storage: Box<dyn Storage>,
    sessions: Arc<Vec<ChatSession>>,
    active_id: String,
    changes: watch::Sender<StoreSnapshot>,
}

impl SessionStore {
    /// Load the store from `storage`.
    ///
    /// A missing, unreadable or malformed slot, or an empty list, counts as
    /// no prior state and yields a single fresh session. Loading never fails.
    pub fn load<S: Storage + 'static>(storage: S) -> Self {
        let loaded = match read_sessions(&storage) {
            Ok(Some(sessions)) if !sessions.is_empty() => Some(sessions),
            Ok(_) => None,
            Err(err) => {
                STORE_LOAD_FALLBACKS.click();
                tracing::warn!(error = %err, "discarding unreadable session state");
                None
            }
        };

        let (sessions, fresh) = match loaded {
            Some(sessions) => (sessions, false),
            None => (vec![ChatSession::new()], true),
        };
        let active_id = sessions[0].id.clone();
        let sessions = Arc::new(sessions);
        let (changes, _) = watch::channel(StoreSnapshot {
            sessions: Arc::clone(&sessions),
            active_id: active_id.clone(),
        });

        let store = Self {
            storage: Box::new(storage),
            sessions,
            active_id,
            changes,
        };
        tracing::info!(
            sessions = store.sessions.len(),
            fresh,
            "session store loaded"
        );
        if fresh {
            store.persist();
        }
        store
    }

    /// All sessions, most recently created first.
    pub fn list_sessions(&self) -> Arc<Vec<ChatSession>> {
        Arc::clone(&self.sessions)
    }

    /// Id of the active session.
    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// The active session.
    pub fn active_session(&self) -> Option<&ChatSession> {
        self.session(&self.active_id)
    }

    /// Look up a session by id.
    pub fn session(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// The current state of the store.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            sessions: Arc::clone(&self.sessions),
            active_id: self.active_id.clone(),
        }
    }

    /// Subscribe to changes; the receiver always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.changes.subscribe()
    }

    /// Create an empty session at the front of the list and make it active.
    pub fn create_session(&mut self) -> ChatSession {
        let session = ChatSession::new();
        let mut sessions = Vec::with_capacity(self.sessions.len() + 1);
        sessions.push(session.clone());
        sessions.extend(self.sessions.iter().cloned());
        self.active_id = session.id.clone();
        tracing::info!(session = %session.id, "created session");
        self.replace(sessions);
        session
    }

    /// Make the session with `id` active. Unknown ids are ignored.
    pub fn select_session(&mut self, id: &str) -> bool {
        if self.session(id).is_none() {
            return false;
        }
        if self.active_id != id {
            self.active_id = id.to_string();
            self.publish();
        }
        true
    }

    /// Remove the session with `id`. Unknown ids are ignored.
    ///
    /// If the active session is removed, the first remaining session becomes
    /// active, or a fresh session is created when none remain.
    pub fn delete_session(&mut self, id: &str) -> bool {
        if self.session(id).is_none() {
            return false;
        }
        let remaining: Vec<ChatSession> = self
            .sessions
            .iter()
            .filter(|s| s.id != id)
            .cloned()
            .collect();
        tracing::info!(session = %id, remaining = remaining.len(), "deleted session");

        if remaining.is_empty() {
            let session = ChatSession::new();
            self.active_id = session.id.clone();
            self.replace(vec![session]);
        } else {
            if self.active_id == id {
                self.active_id = remaining[0].id.clone();
            }
            self.replace(remaining);
        }
        true
    }

    /// Append `message` to the session with `session_id`. Unknown ids are ignored.
    ///
    /// A session's first user message also sets its title.
    pub fn append_message(&mut self, session_id: &str, message: Message) -> bool {
        let Some(index) = self.sessions.iter().position(|s| s.id == session_id) else {
            return false;
        };
        let mut sessions = self.sessions.as_ref().clone();
        sessions[index] = sessions[index].with_message(message);
        self.replace(sessions);
        true
    }

    fn replace(&mut self, sessions: Vec<ChatSession>) {
        self.sessions = Arc::new(sessions);
        self.persist();
        self.publish();
    }

    fn publish(&self) {
        self.changes.send_replace(self.snapshot());
    }

    fn persist(&self) {
        let result = serde_json::to_string(self.sessions.as_ref())
            .map_err(Error::from)
            .and_then(|json| self.storage.set(SESSIONS_KEY, &json));
        match result {
            Ok(()) => STORE_SAVES.click(),
            Err(err) => {
                STORE_SAVE_ERRORS.click();
                tracing::warn!(error = %err, "failed to persist sessions");
            }
        }
    }
}

fn read_sessions(storage: &dyn Storage) -> Result<Option<Vec<ChatSession>>> {
    let Some(json) = storage.get(SESSIONS_KEY)? else {
        return Ok(None);
    };
    let sessions: Vec<ChatSession> = serde_json::from_str(&json)?;
    Ok(Some(sessions))
}

/// Write a session list to a standalone JSON file.
pub fn export_sessions<P: AsRef<Path>>(sessions: &[ChatSession], path: P) -> Result<()> {
    let file = File::create(path.as_ref())
        .map_err(|err| Error::io("failed to create export file", err))?;
    let mut writer = BufWriter::new(file);
    to_writer(&mut writer, sessions)
        .map_err(|err| Error::serialization("failed to serialize sessions", err))?;
    writer
        .flush()
        .map_err(|err| Error::io("failed to write export file", err))
}
