//! # Conversation Store
//!
//! The persistence port the session controller talks to, plus the
//! file-backed implementation used by the binary.
//!
//! `JsonChatStore` keeps one JSON file per conversation (`<id>.json`) and a
//! lightweight index (`index.json`) so listing never reads message bodies.
//! All writes use atomic rename (write `.tmp`, then `rename()`) for crash safety.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::conversation::{ChatId, ConversationLog, ConversationSummary};

#[derive(Debug)]
pub enum StoreError {
    /// Filesystem failure (permissions, disk full, missing directory).
    Io(io::Error),
    /// A stored file could not be (de)serialized.
    Parse(serde_json::Error),
    /// The caller broke a store precondition (e.g. creating an empty log).
    InvalidState(String),
    /// Update of a conversation the store has never seen.
    NotFound(ChatId),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "storage I/O error: {e}"),
            StoreError::Parse(e) => write!(f, "storage parse error: {e}"),
            StoreError::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            StoreError::NotFound(id) => write!(f, "conversation {id} not found"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Parse(e)
    }
}

/// Durable conversation storage.
///
/// Implementations must have their backing storage ready before the first
/// call; the controller never initializes it.
pub trait ChatStore {
    /// Persist a never-saved conversation. Fails with `InvalidState` when the
    /// log has no messages. Returns the stored metadata (assigned id, stamp).
    fn create(&mut self, log: &ConversationLog) -> Result<ConversationSummary, StoreError>;

    /// Overwrite an existing conversation. Returns the new `updated_at`.
    fn update(&mut self, log: &ConversationLog) -> Result<i64, StoreError>;

    /// Metadata for every stored conversation, newest first.
    fn list(&self) -> Result<Vec<ConversationSummary>, StoreError>;

    /// Full conversation by id, `None` if it does not exist.
    fn find(&self, id: ChatId) -> Result<Option<ConversationLog>, StoreError>;
}

/// On-disk index: summaries plus the next id to hand out.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct StoreIndex {
    next_id: ChatId,
    chats: Vec<ConversationSummary>,
}

impl Default for StoreIndex {
    fn default() -> Self {
        Self {
            next_id: 1,
            chats: Vec::new(),
        }
    }
}

/// File-backed store rooted at a data directory.
pub struct JsonChatStore {
    dir: PathBuf,
    index: StoreIndex,
    last_stamp: i64,
}

impl JsonChatStore {
    /// Open (or initialize) the store at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let index_path = dir.join("index.json");
        let index = if index_path.exists() {
            let json = fs::read_to_string(&index_path)?;
            serde_json::from_str(&json)?
        } else {
            StoreIndex::default()
        };

        let last_stamp = index.chats.iter().map(|c| c.updated_at).max().unwrap_or(0);
        info!(
            "Opened chat store at {} ({} conversations)",
            dir.display(),
            index.chats.len()
        );

        Ok(Self {
            dir,
            index,
            last_stamp,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn chat_path(&self, id: ChatId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Strictly increasing millisecond timestamp, so ordering never ties.
    fn stamp(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        self.last_stamp = now.max(self.last_stamp + 1);
        self.last_stamp
    }

    /// Write `index` to disk, adopting it in memory only once the write succeeded.
    fn commit_index(&mut self, index: StoreIndex) -> Result<(), StoreError> {
        atomic_write_json(&self.dir.join("index.json"), &index)?;
        self.index = index;
        Ok(())
    }

    /// A copy of the current index with `summary` inserted or replaced.
    fn index_with(&self, summary: ConversationSummary) -> StoreIndex {
        let mut index = self.index.clone();
        index.chats.retain(|c| c.id != summary.id);
        index.chats.push(summary);
        index.chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        index
    }
}

impl ChatStore for JsonChatStore {
    fn create(&mut self, log: &ConversationLog) -> Result<ConversationSummary, StoreError> {
        if log.messages.is_empty() {
            return Err(StoreError::InvalidState(
                "cannot save an empty chat log".to_string(),
            ));
        }

        let id = self.index.next_id;
        let stored = ConversationLog {
            id,
            title: log.title.clone(),
            updated_at: self.stamp(),
            messages: log.messages.clone(),
        };

        atomic_write_json(&self.chat_path(id), &stored)?;

        let mut index = self.index_with(stored.summary());
        index.next_id = id + 1;
        self.commit_index(index)?;

        debug!("Created conversation {} ({} messages)", id, stored.messages.len());
        Ok(stored.summary())
    }

    fn update(&mut self, log: &ConversationLog) -> Result<i64, StoreError> {
        let Some(existing) = self.index.chats.iter().find(|c| c.id == log.id) else {
            return Err(StoreError::NotFound(log.id));
        };

        let stored = ConversationLog {
            id: log.id,
            title: existing.title.clone(),
            updated_at: self.stamp(),
            messages: log.messages.clone(),
        };

        atomic_write_json(&self.chat_path(log.id), &stored)?;
        self.commit_index(self.index_with(stored.summary()))?;

        debug!("Updated conversation {} ({} messages)", log.id, stored.messages.len());
        Ok(stored.updated_at)
    }

    fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        Ok(self.index.chats.clone())
    }

    fn find(&self, id: ChatId) -> Result<Option<ConversationLog>, StoreError> {
        let path = self.chat_path(id);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }
}

/// Atomically write `data` as JSON to `path` (via `.tmp` + rename).
fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
