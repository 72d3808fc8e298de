//! # Application State
//!
//! Core session state. Domain logic only, no TUI-specific types;
//! presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── store: Box<dyn ChatStore>     // persistence port
//! ├── active: ConversationLog       // conversation being viewed
//! ├── history: HistoryDirectory     // summaries for the history list
//! ├── selected: usize               // selected history index
//! ├── focus: Focus                  // which region gets keys
//! ├── request: RequestState         // idle or one pending request
//! ├── layout: PaneLayout            // last observed terminal size
//! ├── notice: Option<String>        // inline failure notice
//! └── max_prev_messages / max_reply_tokens
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use log::warn;

use crate::core::config::ResolvedConfig;
use crate::core::conversation::{ChatId, ConversationLog};
use crate::core::history::HistoryDirectory;
use crate::core::store::ChatStore;
use crate::core::view::PaneLayout;

/// Which UI region receives key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    InputArea,
    HistoryList,
}

impl Focus {
    pub fn toggled(self) -> Focus {
        match self {
            Focus::InputArea => Focus::HistoryList,
            Focus::HistoryList => Focus::InputArea,
        }
    }
}

/// The one request that may be in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: u64,
    pub conversation_id: ChatId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Pending(PendingRequest),
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending(_))
    }
}

/// Request limits taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestLimits {
    /// Most recent messages sent upstream. `0` = all.
    pub max_prev_messages: usize,
    /// Reply length cap. `0` = provider default.
    pub max_reply_tokens: u32,
}

impl From<&ResolvedConfig> for RequestLimits {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            max_prev_messages: config.max_prev_messages,
            max_reply_tokens: config.max_reply_tokens,
        }
    }
}

pub struct App {
    pub store: Box<dyn ChatStore>,
    pub active: ConversationLog,
    pub history: HistoryDirectory,
    pub selected: usize,
    pub focus: Focus,
    pub request: RequestState,
    pub layout: PaneLayout,
    pub notice: Option<String>,
    pub model_name: String,
    pub limits: RequestLimits,
    next_request_id: u64,
}

impl App {
    pub fn new(
        store: Box<dyn ChatStore>,
        model_name: String,
        limits: RequestLimits,
        (width, height): (u16, u16),
    ) -> Self {
        let mut app = Self {
            store,
            active: ConversationLog::new(),
            history: HistoryDirectory::new(),
            selected: 0,
            focus: Focus::default(),
            request: RequestState::Idle,
            layout: PaneLayout::compute(width, height),
            notice: None,
            model_name,
            limits,
            next_request_id: 1,
        };
        if let Err(e) = app.history.refresh(app.store.as_ref()) {
            warn!("Failed to load conversation history: {}", e);
            app.notice = Some(format!("History unavailable: {e}"));
        }
        app
    }

    pub fn from_config(
        store: Box<dyn ChatStore>,
        config: &ResolvedConfig,
        size: (u16, u16),
    ) -> Self {
        Self::new(store, config.model.clone(), RequestLimits::from(config), size)
    }

    pub(crate) fn take_request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }
}
