//! # History Directory
//!
//! Read cache of conversation summaries backing the history list.
//! The synthetic "New Chat" entry is always first; the rest is newest first.

use log::debug;

use crate::core::conversation::{ChatId, ConversationSummary};
use crate::core::store::{ChatStore, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryDirectory {
    entries: Vec<ConversationSummary>,
}

impl Default for HistoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryDirectory {
    /// A directory holding only the synthetic entry.
    pub fn new() -> Self {
        Self {
            entries: vec![ConversationSummary::new_chat()],
        }
    }

    /// Replace the snapshot with `[New Chat] + store.list()`.
    ///
    /// On error the previous snapshot is kept.
    pub fn refresh(&mut self, store: &dyn ChatStore) -> Result<(), StoreError> {
        let mut listed = store.list()?;
        listed.retain(|s| !s.is_new_chat());
        // Stable: preserves the store's order for equal stamps.
        listed.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        self.entries = std::iter::once(ConversationSummary::new_chat())
            .chain(listed)
            .collect();
        debug!("History refreshed: {} entries", self.entries.len());
        Ok(())
    }

    pub fn entries(&self) -> &[ConversationSummary] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ConversationSummary> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the entry for `id`. The synthetic entry matches id 0.
    pub fn position_of(&self, id: ChatId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}
