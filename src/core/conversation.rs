//! # Conversation Log
//!
//! The unit of persistence and of API context: an ordered list of
//! role-tagged messages plus the metadata the history list shows.
//!
//! ```text
//! ConversationLog
//! ├── id: ChatId           // 0 = never persisted
//! ├── title: String        // derived once from the first message
//! ├── updated_at: i64      // unix millis, stamped by the store
//! └── messages: Vec<Message>
//! ```

use serde::{Deserialize, Serialize};

/// Storage identifier of a conversation. `0` means "not persisted yet".
pub type ChatId = u64;

/// Maximum number of characters kept when deriving a title.
pub const TITLE_MAX_CHARS: usize = 100;

/// Title of the synthetic history entry that starts a fresh conversation.
pub const NEW_CHAT_TITLE: &str = "New Chat";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Full conversation: metadata + messages.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationLog {
    pub id: ChatId,
    pub title: String,
    pub updated_at: i64,
    pub messages: Vec<Message>,
}

impl ConversationLog {
    /// A fresh, unsaved conversation.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Sets the title from the first message if none has been set yet.
    /// Never overwrites an existing title.
    pub fn ensure_title(&mut self) {
        if !self.title.is_empty() {
            return;
        }
        if let Some(first) = self.messages.first() {
            self.title = derive_title(&first.content);
        }
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            title: self.title.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Metadata only. Never carries message bodies.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: ChatId,
    pub title: String,
    pub updated_at: i64,
}

impl ConversationSummary {
    /// The "start a fresh conversation" entry shown at the top of the history list.
    pub fn new_chat() -> Self {
        Self {
            id: 0,
            title: NEW_CHAT_TITLE.to_string(),
            updated_at: 0,
        }
    }

    pub fn is_new_chat(&self) -> bool {
        self.id == 0
    }
}

/// Derive a conversation title from message content.
pub fn derive_title(content: &str) -> String {
    substr(content.trim(), 0, TITLE_MAX_CHARS).to_string()
}

/// Character-based substring that never splits a multi-byte codepoint.
///
/// `start` and `length` count chars, not bytes. A `start` at or past the end
/// yields `""`; a `length` running past the end is clamped.
pub fn substr(input: &str, start: usize, length: usize) -> &str {
    let mut boundaries = input.char_indices().map(|(i, _)| i).skip(start);
    let Some(begin) = boundaries.next() else {
        return "";
    };
    let end = match length {
        0 => begin,
        n => boundaries.nth(n - 1).unwrap_or(input.len()),
    };
    &input[begin..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_substr_cases {
        ( $($name:ident: ($input:expr, $start:expr, $len:expr) => $expected:expr,)+ ) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(substr($input, $start, $len), $expected);
                }
            )+
        };
    }

    test_substr_cases! {
        test_substr_ascii_prefix: ("Hello world", 0, 5) => "Hello",
        test_substr_middle: ("Hello world", 6, 5) => "world",
        test_substr_clamps_length: ("Hello", 2, 100) => "llo",
        test_substr_start_past_end: ("Hello", 9, 3) => "",
        test_substr_start_at_end: ("Hello", 5, 3) => "",
        test_substr_zero_length: ("Hello", 1, 0) => "",
        test_substr_multibyte_prefix: ("héllo wörld", 0, 2) => "hé",
        test_substr_multibyte_offset: ("日本語のテキスト", 2, 3) => "語のテ",
        test_substr_emoji: ("🦀🦀🦀", 1, 1) => "🦀",
        test_substr_empty_input: ("", 0, 10) => "",
    }

    #[test]
    fn test_substr_never_splits_codepoints() {
        let input = "añb€c😀d";
        let chars = input.chars().count();
        for start in 0..chars + 2 {
            for len in 0..chars + 2 {
                // Slicing would panic on a non-boundary, so reaching the
                // assertion proves the result is valid UTF-8 on char boundaries.
                let out = substr(input, start, len);
                assert!(out.chars().count() <= len);
            }
        }
    }

    #[test]
    fn test_derive_title_truncates_to_max_chars() {
        let long = "é".repeat(TITLE_MAX_CHARS + 20);
        let title = derive_title(&long);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn test_ensure_title_uses_first_message() {
        let mut log = ConversationLog::new();
        log.push(Message::user("  Hello there  "));
        log.push(Message::assistant("Hi"));
        log.ensure_title();
        assert_eq!(log.title, "Hello there");
    }

    #[test]
    fn test_ensure_title_keeps_existing_title() {
        let mut log = ConversationLog::new();
        log.title = "Original".to_string();
        log.push(Message::user("Something else"));
        log.ensure_title();
        assert_eq!(log.title, "Original");
    }

    #[test]
    fn test_ensure_title_without_messages_stays_empty() {
        let mut log = ConversationLog::new();
        log.ensure_title();
        assert!(log.title.is_empty());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }

    #[test]
    fn test_new_chat_summary() {
        let entry = ConversationSummary::new_chat();
        assert!(entry.is_new_chat());
        assert_eq!(entry.title, NEW_CHAT_TITLE);
    }
}
