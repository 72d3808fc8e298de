//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Event Loop
//!
//! One `mpsc` queue carries everything: key events, resizes and ticks from
//! the input thread, and completion results from background requests. The
//! loop blocks on it, drains whatever else is queued, then redraws once.
//!
//! - Ticks only cause a redraw while a request is pending (spinner).
//! - `Effect::SpawnRequest` starts a background task holding a child of the
//!   shutdown token; `Effect::CancelRequest` cancels that child.
//! - On quit the shutdown token is cancelled, which stops the input thread
//!   and any in-flight request.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call.

pub mod component;
pub mod components;
pub mod event;
pub mod markdown;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use tokio_util::sync::CancellationToken;

use crate::core::action::{Action, Effect, update};
use crate::core::request::spawn_completion;
use crate::core::state::{App, Focus};
use crate::core::view::RenderModel;
use crate::inference::CompletionProvider;
use crate::tui::component::EventHandler;
use crate::tui::components::{
    HistoryEvent, HistoryListState, InputBox, InputEvent, SpinnerState, TranscriptState,
};
use crate::tui::event::{LoopEvent, TuiEvent, spawn_input_thread};

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub transcript: TranscriptState,
    pub history_list: HistoryListState,
    pub input_box: InputBox,
    pub spinner: SpinnerState,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            transcript: TranscriptState::new(),
            history_list: HistoryListState::new(),
            input_box: InputBox::new(),
            spinner: SpinnerState::default(),
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol; terminals without support ignore it.
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Translate one loop event into at most one core action, updating
/// presentation-only state along the way.
fn route_event(app: &App, tui: &mut TuiState, event: LoopEvent) -> Option<Action> {
    let pending = app.request.is_pending();
    match event {
        LoopEvent::Tick => {
            if pending {
                tui.spinner.tick();
            }
            None
        }
        LoopEvent::Resize(width, height) => Some(Action::Resize { width, height }),
        LoopEvent::Completion(outcome) => Some(Action::CompletionReceived(outcome)),
        LoopEvent::Quit => Some(Action::Quit),
        LoopEvent::Input(input) => route_input(app, tui, input),
    }
}

fn route_input(app: &App, tui: &mut TuiState, event: TuiEvent) -> Option<Action> {
    let pending = app.request.is_pending();
    match event {
        TuiEvent::Quit => Some(Action::Quit),
        TuiEvent::SwitchFocus => Some(Action::SwitchFocus),
        // Esc: cancel the request, else clear the filter, else leave the list.
        TuiEvent::Escape if pending => Some(Action::CancelRequest),
        TuiEvent::Escape => match app.focus {
            Focus::HistoryList if !tui.history_list.clear_filter() => Some(Action::SwitchFocus),
            _ => None,
        },
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown => {
            tui.transcript.handle_event(&event);
            None
        }
        _ => match app.focus {
            // The spinner replaces the input box while a reply is pending.
            Focus::InputArea if pending => None,
            Focus::InputArea => match tui.input_box.handle_event(&event)? {
                InputEvent::Submit(text) => Some(Action::Submit(text)),
                InputEvent::ContentChanged => None,
            },
            Focus::HistoryList => {
                match tui
                    .history_list
                    .handle_event(&event, app.history.entries(), app.selected)?
                {
                    HistoryEvent::Select(index) => Some(Action::SelectHistoryEntry(index)),
                    HistoryEvent::Done => Some(Action::SwitchFocus),
                }
            }
        },
    }
}

/// Run the chat UI until the user quits.
///
/// Must be called from within a tokio runtime: requests run as tokio tasks.
pub fn run(mut app: App, provider: Arc<dyn CompletionProvider>) -> std::io::Result<()> {
    let mut terminal = ratatui::init();
    let _terminal_mode_guard = match TerminalModeGuard::new() {
        Ok(guard) => Some(guard),
        Err(e) => {
            warn!("Failed to enable terminal modes: {}", e);
            None
        }
    };

    let shutdown = CancellationToken::new();
    let (tx, rx) = mpsc::channel();
    let input_thread = spawn_input_thread(tx.clone(), shutdown.clone());

    let mut tui = TuiState::new();
    let mut in_flight: Option<CancellationToken> = None;
    let mut needs_redraw = true;
    let mut should_quit = false;

    while !should_quit {
        if needs_redraw {
            let model = RenderModel::from_app(&app);
            terminal.draw(|f| ui::draw_ui(f, &model, &mut tui))?;
            needs_redraw = false;
        }

        let Ok(first) = rx.recv() else {
            warn!("Event queue closed, shutting down");
            break;
        };

        for event in std::iter::once(first).chain(std::iter::from_fn(|| rx.try_recv().ok())) {
            let is_tick = matches!(event, LoopEvent::Tick);
            if !is_tick || app.request.is_pending() {
                needs_redraw = true;
            }

            let mut actions: Vec<Action> = route_event(&app, &mut tui, event).into_iter().collect();
            // Some terminals never report resizes; poll the size on ticks.
            if is_tick
                && let Ok((width, height)) = crossterm::terminal::size()
                && (width, height) != app.layout.size()
            {
                actions.push(Action::Resize { width, height });
                needs_redraw = true;
            }

            for action in actions {
                let switches_conversation = matches!(action, Action::SelectHistoryEntry(_));
                debug!("Event loop dispatching: {:?}", action);
                let before = app.active.id;
                match update(&mut app, action) {
                    Effect::SpawnRequest(job) => {
                        let tx = tx.clone();
                        in_flight = Some(spawn_completion(
                            provider.clone(),
                            job,
                            &shutdown,
                            move |outcome| tx.send(LoopEvent::Completion(outcome)).is_ok(),
                        ));
                        tui.transcript.stick_to_bottom = true;
                    }
                    Effect::CancelRequest => {
                        if let Some(token) = in_flight.take() {
                            info!("Cancelling in-flight request");
                            token.cancel();
                        }
                    }
                    Effect::Quit => should_quit = true,
                    Effect::Render | Effect::None => {}
                }
                if switches_conversation && app.active.id != before {
                    tui.transcript.reset();
                }
                if !app.request.is_pending() {
                    in_flight = None;
                }
            }

            if should_quit {
                break;
            }
        }
    }

    info!("Shutting down");
    shutdown.cancel();
    drop(rx);
    if input_thread.join().is_err() {
        warn!("Input thread panicked");
    }
    ratatui::restore();
    Ok(())
}
