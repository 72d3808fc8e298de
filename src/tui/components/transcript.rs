//! # Transcript Component
//!
//! Scrollable view of the active conversation.
//!
//! `TranscriptState` (scroll offset, stick-to-bottom flag) persists in
//! `TuiState`; `Transcript` is created each frame with the messages as props.
//! User text is shown verbatim, assistant replies go through the markdown
//! renderer. The view follows new content until the user scrolls up, and
//! re-pins once they scroll back to the bottom.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Wrap};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::conversation::{Message, Role};
use crate::core::view::role_label;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;
use crate::tui::markdown;

pub const WELCOME_TEXT: &str = "Welcome to termchat!";

pub struct TranscriptState {
    pub scroll_state: ScrollViewState,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Content and viewport height from the last render (for scroll clamping)
    content_height: u16,
    viewport_height: u16,
}

impl Default for TranscriptState {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            stick_to_bottom: true,
            content_height: 0,
            viewport_height: 0,
        }
    }

    /// Jump back to the bottom, e.g. after switching conversations.
    pub fn reset(&mut self) {
        self.scroll_state = ScrollViewState::default();
        self.stick_to_bottom = true;
    }

    fn max_offset(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// Re-engage auto-scroll once the user has scrolled to the bottom.
    fn repin_if_at_bottom(&mut self) {
        if self.scroll_state.offset().y >= self.max_offset() {
            self.stick_to_bottom = true;
            self.clamp_scroll();
        }
    }
}

impl EventHandler for TranscriptState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => {}
        }
        None
    }
}

fn label_style(role: Role) -> Style {
    let color = match role {
        Role::User => Color::Cyan,
        Role::Assistant => Color::Green,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Labelled lines for one message: the label opens the first line.
fn message_lines(message: &Message) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = match message.role {
        Role::User => message
            .content
            .lines()
            .map(|l| Line::from(l.to_string()))
            .collect(),
        Role::Assistant => markdown::render(&message.content, Style::default()),
    };
    let label = Span::styled(role_label(message.role), label_style(message.role));
    match lines.first_mut() {
        Some(first) => first.spans.insert(0, label),
        None => lines.push(Line::from(label)),
    }
    lines
}

/// The whole transcript, messages separated by blank lines.
pub fn transcript_text(messages: &[Message]) -> Text<'static> {
    let mut lines = Vec::new();
    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.extend(message_lines(message));
    }
    Text::from(lines)
}

pub struct Transcript<'a> {
    pub state: &'a mut TranscriptState,
    pub messages: &'a [Message],
}

impl<'a> Transcript<'a> {
    pub fn new(state: &'a mut TranscriptState, messages: &'a [Message]) -> Self {
        Self { state, messages }
    }
}

impl<'a> Component for Transcript<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().add_modifier(Modifier::DIM))
            .padding(Padding::horizontal(1));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.messages.is_empty() {
            self.state.reset();
            let welcome = Paragraph::new(WELCOME_TEXT).style(Style::default().fg(Color::DarkGray));
            frame.render_widget(welcome, inner);
            return;
        }

        // -1 for the scrollbar
        let content_width = inner.width.saturating_sub(1);
        let paragraph =
            Paragraph::new(transcript_text(self.messages)).wrap(Wrap { trim: false });
        let height = paragraph.line_count(content_width) as u16;

        self.state.content_height = height;
        self.state.viewport_height = inner.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let mut scroll_view = ScrollView::new(Size::new(content_width, height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);
        scroll_view.render_widget(paragraph, Rect::new(0, 0, content_width, height));

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }
        frame.render_stateful_widget(scroll_view, inner, &mut self.state.scroll_state);
    }
}
