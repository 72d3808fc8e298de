//! Single-row view over a multi-line buffer.
//!
//! The input box is one row tall, so it shows the logical line holding the
//! cursor, scrolled horizontally so the cursor stays inside the box. Columns
//! are display cells (`unicode-width`), positions are byte offsets.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Byte range `[start, end)` of the logical line containing `pos`.
pub(super) fn line_bounds(text: &str, pos: usize) -> (usize, usize) {
    let start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[pos..]
        .find('\n')
        .map(|i| pos + i)
        .unwrap_or(text.len());
    (start, end)
}

/// 1-based index of the line containing `pos`, and the total line count.
pub(super) fn line_position(text: &str, pos: usize) -> (usize, usize) {
    let current = text[..pos].matches('\n').count() + 1;
    let total = text.matches('\n').count() + 1;
    (current, total)
}

pub(super) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

pub(super) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(text.len())
}

/// Display column of `pos` within its line.
pub(super) fn cursor_column(text: &str, pos: usize) -> u16 {
    let (start, _) = line_bounds(text, pos);
    UnicodeWidthStr::width(&text[start..pos]) as u16
}

/// New horizontal scroll so that `column` is visible in `width` cells.
pub(super) fn adjust_scroll(scroll: u16, column: u16, width: u16) -> u16 {
    if width == 0 {
        return column;
    }
    if column < scroll {
        column
    } else if column >= scroll + width {
        column - width + 1
    } else {
        scroll
    }
}

/// The part of `line` visible after skipping `scroll` cells, at most `width` cells.
pub(super) fn visible_slice(line: &str, scroll: u16, width: u16) -> String {
    let mut skipped = 0u16;
    let mut used = 0u16;
    let mut out = String::new();
    for c in line.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0) as u16;
        if skipped < scroll {
            skipped += w;
            continue;
        }
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}
