//! Terminal input and the event loop's queue.
//!
//! Crossterm events are mapped to `TuiEvent`s. A dedicated input thread
//! feeds them, plus ticks and resizes, into one `mpsc` queue that also
//! carries completion results, so the loop sees a single ordered stream.

use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::core::request::CompletionOutcome;

/// Input poll timeout. A timeout produces a `Tick`, so this is the tick rate (5 Hz).
pub const TICK_INTERVAL: Duration = Duration::from_millis(200);

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    // Global keys
    Quit,        // Ctrl+C
    SwitchFocus, // Tab
    Escape,
    Submit, // Enter

    // Editing
    InputChar(char),
    Paste(String), // Bracketed paste - preserves newlines
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    CursorHome,
    CursorEnd,

    // Transcript scrolling
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
}

/// Everything the event loop reacts to, in arrival order.
#[derive(Debug)]
pub enum LoopEvent {
    Input(TuiEvent),
    Resize(u16, u16),
    Tick,
    Completion(CompletionOutcome),
    /// The terminal input source failed; shut down.
    Quit,
}

/// Translate a raw crossterm event. `None` for events termchat ignores.
pub fn map_event(event: Event) -> Option<LoopEvent> {
    match event {
        Event::Key(key_event) => map_key(key_event).map(LoopEvent::Input),
        Event::Mouse(mouse_event) => match mouse_event.kind {
            MouseEventKind::ScrollUp => Some(LoopEvent::Input(TuiEvent::ScrollUp)),
            MouseEventKind::ScrollDown => Some(LoopEvent::Input(TuiEvent::ScrollDown)),
            _ => None,
        },
        Event::Paste(data) => Some(LoopEvent::Input(TuiEvent::Paste(data))),
        Event::Resize(width, height) => Some(LoopEvent::Resize(width, height)),
        _ => None,
    }
}

fn map_key(key_event: KeyEvent) -> Option<TuiEvent> {
    // Keyboard enhancement reports releases too; only presses count.
    if key_event.kind == KeyEventKind::Release {
        return None;
    }
    debug!("Key event: {:?} with modifiers {:?}", key_event.code, key_event.modifiers);
    match (key_event.modifiers, key_event.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(TuiEvent::Quit),
        // Ctrl+J inserts newline (ASCII LF; Ctrl+Enter sends this in most terminals)
        (KeyModifiers::CONTROL, KeyCode::Char('j')) => Some(TuiEvent::InputChar('\n')),
        (KeyModifiers::CONTROL, _) => None,
        (_, KeyCode::Char(c)) => Some(TuiEvent::InputChar(c)),
        (_, KeyCode::Tab) => Some(TuiEvent::SwitchFocus),
        (_, KeyCode::Esc) => Some(TuiEvent::Escape),
        (_, KeyCode::Enter) => Some(TuiEvent::Submit),
        (_, KeyCode::Backspace) => Some(TuiEvent::Backspace),
        (_, KeyCode::Delete) => Some(TuiEvent::Delete),
        (_, KeyCode::Left) => Some(TuiEvent::CursorLeft),
        (_, KeyCode::Right) => Some(TuiEvent::CursorRight),
        (_, KeyCode::Up) => Some(TuiEvent::CursorUp),
        (_, KeyCode::Down) => Some(TuiEvent::CursorDown),
        (_, KeyCode::Home) => Some(TuiEvent::CursorHome),
        (_, KeyCode::End) => Some(TuiEvent::CursorEnd),
        (_, KeyCode::PageUp) => Some(TuiEvent::ScrollPageUp),
        (_, KeyCode::PageDown) => Some(TuiEvent::ScrollPageDown),
        _ => None,
    }
}

/// Start the thread that turns terminal input into `LoopEvent`s.
///
/// Stops when `shutdown` is cancelled or the queue's receiver is gone.
pub fn spawn_input_thread(tx: Sender<LoopEvent>, shutdown: CancellationToken) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while !shutdown.is_cancelled() {
            let event = match event::poll(TICK_INTERVAL) {
                Ok(true) => match event::read() {
                    Ok(raw) => map_event(raw),
                    Err(e) => {
                        warn!("Failed to read terminal event: {}", e);
                        Some(LoopEvent::Quit)
                    }
                },
                Ok(false) => Some(LoopEvent::Tick),
                Err(e) => {
                    warn!("Failed to poll terminal events: {}", e);
                    Some(LoopEvent::Quit)
                }
            };

            let Some(event) = event else { continue };
            let is_quit = matches!(event, LoopEvent::Quit);
            if tx.send(event).is_err() || is_quit {
                break;
            }
        }
        debug!("Input thread stopped");
    })
}
