//! Busy indicator shown in place of the input box while a reply is pending.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph};

use crate::tui::component::Component;

pub const WAITING_TEXT: &str = "Waiting for reply...";
const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Spinner frame counter, advanced on every loop tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinnerState {
    frame: usize,
}

impl SpinnerState {
    pub fn tick(&mut self) {
        self.frame = (self.frame + 1) % FRAMES.len();
    }

    pub fn glyph(&self) -> &'static str {
        FRAMES[self.frame]
    }
}

pub struct Spinner {
    pub state: SpinnerState,
}

impl Component for Spinner {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().add_modifier(Modifier::DIM))
            .title("Esc to cancel");
        let line = Line::from(vec![
            Span::styled(self.state.glyph(), Style::default().fg(Color::Cyan)),
            Span::raw(" "),
            Span::styled(WAITING_TEXT, Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}
