//! Markdown → ratatui lines for assistant replies.
//!
//! Walks `pulldown_cmark` events and emits styled `Line`s. Supports headings,
//! emphasis, strikethrough, inline code, fenced code blocks (highlighted with
//! `syntect`), lists, block quotes, links and rules. Anything else (tables,
//! HTML, images) falls through as plain text or is skipped.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-ocean.dark";
const RULE_WIDTH: usize = 32;

fn code_theme() -> Option<&'static Theme> {
    THEMES.themes.get(CODE_THEME)
}

/// Render `content` as owned lines, using `base` for unstyled text.
pub fn render(content: &str, base: Style) -> Vec<Line<'static>> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut builder = LineBuilder::new(base);
    for event in Parser::new_ext(content, options) {
        builder.event(event);
    }
    builder.finish()
}

/// State of an open fenced or indented code block.
struct CodeBlock {
    highlighter: Option<HighlightLines<'static>>,
}

struct LineBuilder {
    lines: Vec<Line<'static>>,
    /// Spans of the line being assembled.
    current: Vec<Span<'static>>,
    base: Style,
    /// Inline styles, innermost last. Each entry already includes its parents.
    styles: Vec<Style>,
    /// Prefix repeated on every line (block quotes).
    quote_depth: usize,
    /// One entry per open list: next number for ordered lists.
    lists: Vec<Option<u64>>,
    code: Option<CodeBlock>,
    link: Option<String>,
    /// A blank line goes before the next block.
    pending_gap: bool,
}

impl LineBuilder {
    fn new(base: Style) -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            base,
            styles: Vec::new(),
            quote_depth: 0,
            lists: Vec::new(),
            code: None,
            link: None,
            pending_gap: false,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or(self.base)
    }

    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn quote_prefix(&self) -> Vec<Span<'static>> {
        (0..self.quote_depth)
            .map(|_| Span::styled("▎ ", Style::default().fg(Color::DarkGray)))
            .collect()
    }

    /// Close the line being assembled, if any.
    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut spans = self.quote_prefix();
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn emit(&mut self, spans: Vec<Span<'static>>) {
        self.flush();
        let mut line = self.quote_prefix();
        line.extend(spans);
        self.lines.push(Line::from(line));
    }

    fn start_block(&mut self) {
        self.flush();
        if self.pending_gap && !self.lines.is_empty() {
            self.emit(Vec::new());
        }
        self.pending_gap = false;
    }

    fn end_block(&mut self) {
        self.flush();
        self.pending_gap = true;
    }

    fn span(&mut self, text: String, style: Style) {
        self.current.push(Span::styled(text, style));
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.span(
                code.to_string(),
                Style::default().fg(Color::Yellow).bg(Color::Black),
            ),
            Event::SoftBreak => self.span(" ".to_string(), self.style()),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.start_block();
                self.emit(vec![Span::styled(
                    "─".repeat(RULE_WIDTH),
                    Style::default().fg(Color::DarkGray),
                )]);
                self.pending_gap = true;
            }
            Event::TaskListMarker(done) => {
                let marker = if done { "[x] " } else { "[ ] " };
                self.span(marker.to_string(), self.style());
            }
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                // Paragraphs inside list items stay on the bullet's line.
                if self.current.is_empty() {
                    self.start_block();
                }
            }
            Tag::Heading { level, .. } => {
                self.start_block();
                let style = heading_style(level);
                self.span(format!("{} ", "#".repeat(heading_level(level))), style);
                self.push_style(style);
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                self.quote_depth += 1;
                self.push_style(Style::default().add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => {
                self.start_block();
                let lang = match &kind {
                    CodeBlockKind::Fenced(lang) => lang.split_whitespace().next().unwrap_or(""),
                    CodeBlockKind::Indented => "",
                };
                if !lang.is_empty() {
                    self.emit(vec![Span::styled(
                        format!("  {lang}"),
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
                    )]);
                }
                let highlighter = SYNTAXES
                    .find_syntax_by_token(lang)
                    .zip(code_theme())
                    .map(|(syntax, theme)| HighlightLines::new(syntax, theme));
                self.code = Some(CodeBlock { highlighter });
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.start_block();
                } else {
                    self.flush();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.span(marker, Style::default().fg(Color::DarkGray));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link = Some(dest_url.to_string());
                self.push_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.end_block();
                } else {
                    self.flush();
                }
            }
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.end_block();
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.styles.pop();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.pending_gap = true;
            }
            TagEnd::CodeBlock => {
                self.code = None;
                self.end_block();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.pending_gap = true;
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link => {
                self.styles.pop();
                if let Some(url) = self.link.take() {
                    self.span(
                        format!(" <{url}>"),
                        Style::default().fg(Color::DarkGray),
                    );
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        // ratatui renders '\t' as zero-width
        let text = text.replace('\t', "    ");

        if let Some(mut block) = self.code.take() {
            self.code_text(&text, &mut block);
            self.code = Some(block);
            return;
        }

        let style = self.style();
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            self.span(first.to_string(), style);
        }
        for part in parts {
            self.flush();
            self.span(part.to_string(), style);
        }
    }

    fn code_text(&mut self, text: &str, block: &mut CodeBlock) {
        for line in LinesWithEndings::from(text) {
            let mut spans = vec![Span::raw("  ")];
            let highlighted = block
                .highlighter
                .as_mut()
                .and_then(|hl| hl.highlight_line(line, &SYNTAXES).ok());
            match highlighted {
                Some(ranges) => spans.extend(ranges.into_iter().filter_map(|(style, piece)| {
                    let piece = piece.trim_end_matches('\n');
                    (!piece.is_empty()).then(|| {
                        let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
                        Span::styled(piece.to_string(), Style::default().fg(fg))
                    })
                })),
                None => spans.push(Span::styled(
                    line.trim_end_matches('\n').to_string(),
                    Style::default().fg(Color::White),
                )),
            }
            self.emit(spans);
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        self.lines
    }
}

fn heading_level(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn heading_style(level: HeadingLevel) -> Style {
    let bold = Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 => bold.add_modifier(Modifier::UNDERLINED),
        HeadingLevel::H2 => bold,
        _ => bold.add_modifier(Modifier::ITALIC),
    }
}
