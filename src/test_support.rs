//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::conversation::{ChatId, ConversationLog, ConversationSummary, Message};
use crate::core::state::{App, RequestLimits};
use crate::core::store::{ChatStore, StoreError};
use crate::inference::{CompletionProvider, CompletionRequest, ProviderError, with_cancellation};

// ============================================================================
// In-memory store
// ============================================================================

/// `ChatStore` kept in memory, with switches to simulate storage failures.
#[derive(Debug)]
pub struct MemoryChatStore {
    summaries: Vec<ConversationSummary>,
    logs: BTreeMap<ChatId, ConversationLog>,
    next_id: ChatId,
    clock: i64,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl Default for MemoryChatStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self {
            summaries: Vec::new(),
            logs: BTreeMap::new(),
            next_id: 1,
            clock: 0,
            fail_reads: false,
            fail_writes: false,
        }
    }

    /// A store that lists `summaries` but holds no message bodies for them.
    pub fn with_summaries(summaries: Vec<ConversationSummary>) -> Self {
        let mut store = Self::new();
        store.next_id = summaries.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        store.clock = summaries.iter().map(|s| s.updated_at).max().unwrap_or(0);
        store.summaries = summaries;
        store
    }

    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    fn simulated(what: &str) -> StoreError {
        StoreError::Io(io::Error::other(format!("simulated {what} failure")))
    }

    fn upsert(&mut self, summary: ConversationSummary) {
        self.summaries.retain(|s| s.id != summary.id);
        self.summaries.push(summary);
    }
}

impl ChatStore for MemoryChatStore {
    fn create(&mut self, log: &ConversationLog) -> Result<ConversationSummary, StoreError> {
        if self.fail_writes {
            return Err(Self::simulated("write"));
        }
        if log.messages.is_empty() {
            return Err(StoreError::InvalidState(
                "cannot save an empty chat log".to_string(),
            ));
        }
        let id = self.next_id;
        self.next_id += 1;

        let mut stored = log.clone();
        stored.id = id;
        stored.updated_at = self.tick();
        stored.ensure_title();

        let summary = stored.summary();
        self.upsert(summary.clone());
        self.logs.insert(id, stored);
        Ok(summary)
    }

    fn update(&mut self, log: &ConversationLog) -> Result<i64, StoreError> {
        if self.fail_writes {
            return Err(Self::simulated("write"));
        }
        let title = match self.summaries.iter().find(|s| s.id == log.id) {
            Some(s) => s.title.clone(),
            None => return Err(StoreError::NotFound(log.id)),
        };
        let mut stored = log.clone();
        stored.title = title;
        stored.updated_at = self.tick();

        self.upsert(stored.summary());
        let stamp = stored.updated_at;
        self.logs.insert(log.id, stored);
        Ok(stamp)
    }

    fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        if self.fail_reads {
            return Err(Self::simulated("read"));
        }
        let mut listed = self.summaries.clone();
        listed.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(listed)
    }

    fn find(&self, id: ChatId) -> Result<Option<ConversationLog>, StoreError> {
        if self.fail_reads {
            return Err(Self::simulated("read"));
        }
        Ok(self.logs.get(&id).cloned())
    }
}

// ============================================================================
// Scripted provider
// ============================================================================

enum Script {
    Reply(String),
    Fail(fn() -> ProviderError),
    Hang,
}

/// What a `ScriptedProvider` was asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub max_tokens: u32,
}

/// Provider that answers every request the same way.
pub struct ScriptedProvider {
    script: Script,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    fn scripted(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::scripted(Script::Reply(text.to_string()))
    }

    pub fn failing(error: fn() -> ProviderError) -> Self {
        Self::scripted(Script::Fail(error))
    }

    /// Never answers; only cancellation ends the request.
    pub fn hanging() -> Self {
        Self::scripted(Script::Hang)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: CompletionRequest<'_>,
        cancel: CancellationToken,
    ) -> Result<String, ProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                messages: request.messages.to_vec(),
                max_tokens: request.max_tokens,
            });
        }
        match &self.script {
            Script::Reply(text) => {
                let text = text.clone();
                with_cancellation(&cancel, async move { Ok(text) }).await
            }
            Script::Fail(error) => Err(error()),
            Script::Hang => with_cancellation(&cancel, std::future::pending()).await,
        }
    }
}

// ============================================================================
// App builders
// ============================================================================

/// Creates a test App over an empty in-memory store.
pub fn test_app() -> App {
    test_app_with(MemoryChatStore::new(), RequestLimits::default())
}

pub fn test_app_with(store: MemoryChatStore, limits: RequestLimits) -> App {
    App::new(Box::new(store), "test-model".to_string(), limits, (80, 24))
}
