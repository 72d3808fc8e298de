//! # Render Adapter
//!
//! Turns controller state into what a UI toolkit needs: pane dimensions
//! and the content of each region. Knows nothing about glyphs or colors.
//!
//! ```text
//! ┌──────────────── title bar (1) ─────────────────┐
//! │ conversation pane          │ history pane (25%) │
//! ├──────────────── input box (3) ─────────────────┤
//! ```

use crate::core::conversation::{ConversationSummary, Message, Role};
use crate::core::state::{App, Focus};

/// Fraction of the total width given to the history pane.
pub const HISTORY_WIDTH_FRACTION: f32 = 0.25;
/// Rows used by the input box (including its border).
pub const INPUT_HEIGHT: u16 = 3;
/// Rows used by the title bar.
pub const TITLE_HEIGHT: u16 = 1;

pub const USER_LABEL: &str = "You: ";
pub const ASSISTANT_LABEL: &str = "GPT: ";

/// Pane dimensions for a given terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaneLayout {
    pub width: u16,
    pub height: u16,
    pub history_width: u16,
    pub transcript_width: u16,
    pub pane_height: u16,
}

impl PaneLayout {
    pub fn compute(width: u16, height: u16) -> Self {
        let history_width = (f32::from(width) * HISTORY_WIDTH_FRACTION).floor() as u16;
        Self {
            width,
            height,
            history_width,
            transcript_width: width - history_width,
            pane_height: height.saturating_sub(TITLE_HEIGHT + INPUT_HEIGHT),
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }
}

/// Everything the UI needs for one frame, borrowed from `App`.
pub struct RenderModel<'a> {
    pub messages: &'a [Message],
    pub history: &'a [ConversationSummary],
    pub selected: usize,
    pub focus: Focus,
    pub pending: bool,
    pub notice: Option<&'a str>,
    pub model_name: &'a str,
    pub layout: PaneLayout,
}

impl<'a> RenderModel<'a> {
    pub fn from_app(app: &'a App) -> Self {
        Self {
            messages: &app.active.messages,
            history: app.history.entries(),
            selected: app.selected,
            focus: app.focus,
            pending: app.request.is_pending(),
            notice: app.notice.as_deref(),
            model_name: &app.model_name,
            layout: app.layout,
        }
    }
}

pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => USER_LABEL,
        Role::Assistant => ASSISTANT_LABEL,
    }
}
