//! # TitleBar Component
//!
//! One-line bar at the top: model name, plus the current notice if any.
//!
//! 1. **Notice**: `"termchat (model: gpt-4) | Save failed: ..."`
//! 2. **Default**: `"termchat (model: gpt-4)"`
//!
//! Stateless; everything arrives as props.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;

pub struct TitleBar<'a> {
    pub model_name: &'a str,
    pub notice: Option<&'a str>,
}

impl<'a> TitleBar<'a> {
    pub fn new(model_name: &'a str, notice: Option<&'a str>) -> Self {
        Self { model_name, notice }
    }
}

impl<'a> Component for TitleBar<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::raw(format!("termchat (model: {})", self.model_name))];
        if let Some(notice) = self.notice {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(notice.to_string(), Style::default().fg(Color::Yellow)));
        }
        frame.render_widget(Line::from(spans), area);
    }
}
