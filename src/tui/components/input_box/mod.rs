//! # InputBox Component
//!
//! Single-row message editor at the bottom of the screen.
//!
//! ## Responsibilities
//!
//! - Capture text input, up to `INPUT_CHAR_LIMIT` characters
//! - Handle editing (backspace, delete, cursor movement, paste)
//! - Handle submission (Enter); `Ctrl+J` inserts a newline instead
//! - Show a placeholder while empty
//!
//! ## State Management
//!
//! The buffer and cursor are internal state. `focused` is a prop from the
//! application state.

mod line_view;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use line_view::{
    adjust_scroll, cursor_column, line_bounds, line_position, next_char_boundary,
    prev_char_boundary, visible_slice,
};

/// Maximum number of characters the buffer holds.
pub const INPUT_CHAR_LIMIT: usize = 1000;
pub const PLACEHOLDER: &str = "Write your message...";

/// Offset from area edge to content (border width)
const BORDER_OFFSET: u16 = 1;

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User submitted the text (Enter pressed)
    Submit(String),
    /// Text or cursor changed
    ContentChanged,
}

pub struct InputBox {
    buffer: String,
    /// Cursor position as byte offset in buffer (0..=buffer.len())
    cursor: usize,
    /// Horizontal scroll in display cells
    scroll: u16,
    /// Whether keys go here (Prop)
    pub focused: bool,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            scroll: 0,
            focused: true,
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Insert at the cursor, dropping whatever exceeds the character limit.
    fn insert(&mut self, text: &str) -> bool {
        let room = INPUT_CHAR_LIMIT.saturating_sub(self.buffer.chars().count());
        let accepted: String = text.chars().take(room).collect();
        if accepted.is_empty() {
            return false;
        }
        self.buffer.insert_str(self.cursor, &accepted);
        self.cursor += accepted.len();
        true
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.scroll = 0;
    }

    fn title(&self) -> String {
        let (line, total) = line_position(&self.buffer, self.cursor);
        if total > 1 {
            format!("Message (line {line}/{total})")
        } else {
            "Message".to_string()
        }
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner_width = area.width.saturating_sub(2 * BORDER_OFFSET);
        let column = cursor_column(&self.buffer, self.cursor);
        self.scroll = adjust_scroll(self.scroll, column, inner_width);

        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(self.title());

        let paragraph = if self.buffer.is_empty() {
            Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
        } else {
            let (start, end) = line_bounds(&self.buffer, self.cursor);
            let visible = visible_slice(&self.buffer[start..end], self.scroll, inner_width);
            Paragraph::new(visible).style(Style::default().fg(Color::Green))
        };
        frame.render_widget(paragraph.block(block), area);

        if self.focused {
            frame.set_cursor_position((
                area.x + BORDER_OFFSET + column.saturating_sub(self.scroll),
                area.y + BORDER_OFFSET,
            ));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                let mut tmp = [0u8; 4];
                self.insert(c.encode_utf8(&mut tmp))
                    .then_some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => self.insert(text).then_some(InputEvent::ContentChanged),
            TuiEvent::Backspace => (self.cursor > 0).then(|| {
                let prev = prev_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                InputEvent::ContentChanged
            }),
            TuiEvent::Delete => (self.cursor < self.buffer.len()).then(|| {
                let next = next_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(self.cursor..next);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorLeft => (self.cursor > 0).then(|| {
                self.cursor = prev_char_boundary(&self.buffer, self.cursor);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorRight => (self.cursor < self.buffer.len()).then(|| {
                self.cursor = next_char_boundary(&self.buffer, self.cursor);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorHome => {
                let (start, _) = line_bounds(&self.buffer, self.cursor);
                (self.cursor != start).then(|| {
                    self.cursor = start;
                    InputEvent::ContentChanged
                })
            }
            TuiEvent::CursorEnd => {
                let (_, end) = line_bounds(&self.buffer, self.cursor);
                (self.cursor != end).then(|| {
                    self.cursor = end;
                    InputEvent::ContentChanged
                })
            }
            // Up/Down jump between lines of a multi-line message.
            TuiEvent::CursorUp => {
                let (start, _) = line_bounds(&self.buffer, self.cursor);
                (start > 0).then(|| {
                    self.cursor = line_bounds(&self.buffer, start - 1).0;
                    InputEvent::ContentChanged
                })
            }
            TuiEvent::CursorDown => {
                let (_, end) = line_bounds(&self.buffer, self.cursor);
                (end < self.buffer.len()).then(|| {
                    self.cursor = end + 1;
                    InputEvent::ContentChanged
                })
            }
            TuiEvent::Submit => {
                if self.buffer.trim().is_empty() {
                    return None;
                }
                let text = std::mem::take(&mut self.buffer);
                self.reset();
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn typed(text: &str) -> InputBox {
        let mut input = InputBox::new();
        for c in text.chars() {
            input.handle_event(&TuiEvent::InputChar(c));
        }
        input
    }

    #[test]
    fn test_handle_input() {
        let mut input = InputBox::new();

        let res = input.handle_event(&TuiEvent::InputChar('a'));
        assert_eq!(res, Some(InputEvent::ContentChanged));
        input.handle_event(&TuiEvent::InputChar('b'));
        assert_eq!(input.buffer(), "ab");

        input.handle_event(&TuiEvent::Backspace);
        assert_eq!(input.buffer(), "a");
    }

    #[test]
    fn test_submit_clears_buffer() {
        let mut input = typed("hello");
        match input.handle_event(&TuiEvent::Submit) {
            Some(InputEvent::Submit(text)) => assert_eq!(text, "hello"),
            other => panic!("Expected Submit event, got {other:?}"),
        }
        assert!(input.buffer().is_empty());
    }

    #[test]
    fn test_submit_ignores_whitespace() {
        let mut input = typed("   ");
        assert_eq!(input.handle_event(&TuiEvent::Submit), None);
        assert_eq!(input.buffer(), "   ");
    }

    #[test]
    fn test_char_limit_is_enforced() {
        let mut input = InputBox::new();
        let long = "x".repeat(INPUT_CHAR_LIMIT + 50);
        input.handle_event(&TuiEvent::Paste(long));
        assert_eq!(input.buffer().chars().count(), INPUT_CHAR_LIMIT);
        assert_eq!(input.handle_event(&TuiEvent::InputChar('y')), None);
    }

    #[test]
    fn test_cursor_editing_multibyte() {
        let mut input = typed("añb");
        input.handle_event(&TuiEvent::CursorLeft);
        input.handle_event(&TuiEvent::Backspace);
        assert_eq!(input.buffer(), "ab");
        input.handle_event(&TuiEvent::CursorHome);
        input.handle_event(&TuiEvent::Delete);
        assert_eq!(input.buffer(), "b");
    }

    #[test]
    fn test_newline_and_line_navigation() {
        let mut input = typed("one");
        input.handle_event(&TuiEvent::InputChar('\n'));
        input.handle_event(&TuiEvent::InputChar('t'));
        assert_eq!(input.buffer(), "one\nt");
        assert_eq!(input.title(), "Message (line 2/2)");

        input.handle_event(&TuiEvent::CursorUp);
        input.handle_event(&TuiEvent::CursorEnd);
        input.handle_event(&TuiEvent::InputChar('!'));
        assert_eq!(input.buffer(), "one!\nt");
    }

    #[test]
    fn test_render_shows_placeholder() {
        let backend = TestBackend::new(40, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut input = InputBox::new();

        terminal.draw(|f| input.render(f, f.area())).unwrap();

        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        assert!(text.contains(PLACEHOLDER));
    }

    #[test]
    fn test_render_scrolls_to_cursor() {
        let backend = TestBackend::new(12, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut input = typed("abcdefghijklmnop");

        terminal.draw(|f| input.render(f, f.area())).unwrap();

        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        assert!(text.contains("hijklmnop"));
        assert!(!text.contains("abc"));
    }
}
