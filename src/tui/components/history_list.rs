//! # History List Component
//!
//! Right-hand pane listing saved conversations, newest first, with the
//! "New Chat" entry on top.
//!
//! The list is generic over `ListEntry`, so it renders any `{title,
//! description, filter_key}` item. Selection itself lives in the core `App`
//! (`App::selected`, a snapshot index); this component only tracks the
//! filter and turns keys into `HistoryEvent`s carrying snapshot indices.

use chrono::{Local, TimeZone};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, List, ListItem, ListState};

use crate::core::conversation::ConversationSummary;
use crate::tui::component::Component;
use crate::tui::event::TuiEvent;

pub const HISTORY_TITLE: &str = "Chat History";
pub const NEW_CHAT_DESCRIPTION: &str = "Start a new conversation";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Anything the history list can show.
pub trait ListEntry {
    fn title(&self) -> &str;
    fn description(&self) -> String;
    /// Text matched against the filter.
    fn filter_key(&self) -> &str;
    /// Pinned entries stay visible whatever the filter.
    fn pinned(&self) -> bool {
        false
    }
}

impl ListEntry for ConversationSummary {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> String {
        if self.is_new_chat() {
            return NEW_CHAT_DESCRIPTION.to_string();
        }
        Local
            .timestamp_millis_opt(self.updated_at)
            .single()
            .map(|t| t.format(TIME_FORMAT).to_string())
            .unwrap_or_default()
    }

    fn filter_key(&self) -> &str {
        &self.title
    }

    fn pinned(&self) -> bool {
        self.is_new_chat()
    }
}

/// Events emitted by the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryEvent {
    /// Highlight moved to this snapshot index.
    Select(usize),
    /// Enter: go back to the input box.
    Done,
}

/// Persistent state for the history list.
#[derive(Debug, Default)]
pub struct HistoryListState {
    pub filter: String,
    list_state: ListState,
}

impl HistoryListState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot indices of the entries passing the filter, in order.
    pub fn visible<E: ListEntry>(&self, entries: &[E]) -> Vec<usize> {
        let needle = self.filter.to_lowercase();
        entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.pinned() || e.filter_key().to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }

    /// `true` if the filter was non-empty.
    pub fn clear_filter(&mut self) -> bool {
        let had_filter = !self.filter.is_empty();
        self.filter.clear();
        had_filter
    }

    /// Handle a key while the list has focus. `selected` is the current
    /// snapshot index.
    pub fn handle_event<E: ListEntry>(
        &mut self,
        event: &TuiEvent,
        entries: &[E],
        selected: usize,
    ) -> Option<HistoryEvent> {
        match event {
            TuiEvent::CursorUp => self.step(entries, selected, -1),
            TuiEvent::CursorDown => self.step(entries, selected, 1),
            TuiEvent::Submit => Some(HistoryEvent::Done),
            TuiEvent::InputChar(c) => {
                self.filter.push(*c);
                self.reselect_if_hidden(entries, selected)
            }
            TuiEvent::Paste(text) => {
                self.filter.push_str(text);
                self.reselect_if_hidden(entries, selected)
            }
            TuiEvent::Backspace => {
                self.filter.pop();
                None
            }
            _ => None,
        }
    }

    fn step<E: ListEntry>(&self, entries: &[E], selected: usize, delta: isize) -> Option<HistoryEvent> {
        let visible = self.visible(entries);
        let target = match visible.iter().position(|&i| i == selected) {
            Some(pos) => visible.get(pos.checked_add_signed(delta)?)?,
            None => visible.first()?,
        };
        (*target != selected).then_some(HistoryEvent::Select(*target))
    }

    /// After the filter changes, move off an entry that no longer shows.
    fn reselect_if_hidden<E: ListEntry>(&self, entries: &[E], selected: usize) -> Option<HistoryEvent> {
        let visible = self.visible(entries);
        if visible.contains(&selected) {
            return None;
        }
        visible.first().map(|&i| HistoryEvent::Select(i))
    }
}

/// Transient render wrapper, created each frame.
pub struct HistoryList<'a, E: ListEntry> {
    pub state: &'a mut HistoryListState,
    pub entries: &'a [E],
    pub selected: usize,
    pub focused: bool,
}

impl<'a, E: ListEntry> HistoryList<'a, E> {
    pub fn new(
        state: &'a mut HistoryListState,
        entries: &'a [E],
        selected: usize,
        focused: bool,
    ) -> Self {
        Self {
            state,
            entries,
            selected,
            focused,
        }
    }
}

/// First wrapped line of `title`, marked with an ellipsis when cut.
fn fit_title(title: &str, width: usize) -> String {
    if width < 2 {
        return String::new();
    }
    let lines = textwrap::wrap(title, width - 1);
    match lines.as_slice() {
        [] => String::new(),
        [only] => only.to_string(),
        [first, ..] => format!("{first}…"),
    }
}

impl<'a, E: ListEntry> Component for HistoryList<'a, E> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        let title = if self.state.filter.is_empty() {
            HISTORY_TITLE.to_string()
        } else {
            format!("{HISTORY_TITLE} [/{}]", self.state.filter)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(title);
        let text_width = block.inner(area).width.saturating_sub(2) as usize;

        let visible = self.state.visible(self.entries);
        let items: Vec<ListItem> = visible
            .iter()
            .map(|&i| {
                let entry = &self.entries[i];
                ListItem::new(vec![
                    Line::from(Span::styled(
                        fit_title(entry.title(), text_width),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        entry.description(),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();

        self.state
            .list_state
            .select(visible.iter().position(|&i| i == self.selected));

        let highlight = if self.focused {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().add_modifier(Modifier::REVERSED)
        };
        let list = List::new(items)
            .block(block)
            .highlight_style(highlight)
            .highlight_symbol("▌ ");

        frame.render_stateful_widget(list, area, &mut self.state.list_state);
    }
}
