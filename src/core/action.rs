//! # Actions
//!
//! Everything that can happen in termchat becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! The API replies? That's `Action::CompletionReceived(outcome)`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state and returns an `Effect` for the event loop to carry out.
//! Storage calls go through the `ChatStore` port; network I/O never
//! happens here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info, warn};

use crate::core::conversation::{ConversationLog, Message};
use crate::core::request::{CompletionJob, CompletionOutcome, request_window};
use crate::core::state::{App, Focus, PendingRequest, RequestState};
use crate::core::view::PaneLayout;
use crate::inference::ProviderError;

/// Assistant entry appended when the user cancels a pending request.
pub const CANCELLED_REPLY: &str = "Request cancelled.";

#[derive(Debug)]
pub enum Action {
    /// Text entered in the input box.
    Submit(String),
    /// A background completion finished.
    CompletionReceived(CompletionOutcome),
    SwitchFocus,
    /// Highlight (and load) the history entry at this snapshot index.
    SelectHistoryEntry(usize),
    Resize { width: u16, height: u16 },
    /// Cancel the pending request, if any.
    CancelRequest,
    Quit,
}

/// What the event loop should do after `update()`.
#[derive(Debug, PartialEq)]
pub enum Effect {
    None,
    Render,
    SpawnRequest(CompletionJob),
    CancelRequest,
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => submit(app, text),
        Action::CompletionReceived(outcome) => receive_completion(app, outcome),
        Action::SwitchFocus => {
            app.focus = app.focus.toggled();
            debug!("Focus switched to {:?}", app.focus);
            Effect::Render
        }
        Action::SelectHistoryEntry(index) => select_history_entry(app, index),
        Action::Resize { width, height } => {
            if app.layout.size() == (width, height) {
                return Effect::None;
            }
            app.layout = PaneLayout::compute(width, height);
            debug!("Layout recomputed: {:?}", app.layout);
            Effect::Render
        }
        Action::CancelRequest => {
            if app.request.is_pending() {
                info!("User cancelled pending request");
                Effect::CancelRequest
            } else {
                Effect::None
            }
        }
        Action::Quit => {
            // Cancelled on shutdown: no reply will be delivered.
            app.request = RequestState::Idle;
            info!("Quit requested");
            Effect::Quit
        }
    }
}

fn submit(app: &mut App, text: String) -> Effect {
    if app.focus != Focus::InputArea {
        debug!("Submit ignored: input not focused");
        return Effect::None;
    }
    if text.trim().is_empty() {
        return Effect::None;
    }
    if app.request.is_pending() {
        debug!("Submit ignored: a request is already pending");
        return Effect::None;
    }

    app.active.push(Message::user(text));
    persist_active(app);
    refresh_history(app);

    let request_id = app.take_request_id();
    let job = CompletionJob {
        request_id,
        conversation_id: app.active.id,
        messages: request_window(&app.active.messages, app.limits.max_prev_messages).to_vec(),
        max_tokens: app.limits.max_reply_tokens,
    };
    app.request = RequestState::Pending(PendingRequest {
        request_id,
        conversation_id: app.active.id,
    });
    debug!(
        "Submitted message to conversation {} (request #{}, {} messages sent)",
        app.active.id,
        request_id,
        job.messages.len()
    );
    Effect::SpawnRequest(job)
}

fn reply_text(result: Result<String, ProviderError>) -> String {
    match result {
        Ok(reply) => reply,
        Err(ProviderError::Cancelled) => CANCELLED_REPLY.to_string(),
        Err(e) => format!("Error: {e}"),
    }
}

fn receive_completion(app: &mut App, outcome: CompletionOutcome) -> Effect {
    match app.request {
        RequestState::Pending(pending) if pending.request_id == outcome.request_id => {}
        _ => {
            debug!("Dropping stale reply for request #{}", outcome.request_id);
            return Effect::None;
        }
    }
    app.request = RequestState::Idle;

    let target = outcome.conversation_id;
    let reply = Message::assistant(reply_text(outcome.result));

    if target == app.active.id {
        app.active.push(reply);
        persist_active(app);
        refresh_history(app);
    } else if target != 0 {
        redirect_reply(app, target, reply);
    } else {
        warn!("Dropping reply for an unsaved conversation that is no longer active");
    }
    Effect::Render
}

/// Append a reply to a stored conversation that is no longer on screen.
fn redirect_reply(app: &mut App, id: u64, reply: Message) {
    match app.store.find(id) {
        Ok(Some(mut log)) => {
            log.push(reply);
            match app.store.update(&log) {
                Ok(_) => {
                    info!("Reply stored in background conversation {}", id);
                    refresh_history(app);
                }
                Err(e) => {
                    warn!("Failed to store reply for conversation {}: {}", id, e);
                    app.notice = Some(format!("Save failed: {e}"));
                }
            }
        }
        Ok(None) => warn!("Conversation {} disappeared, dropping reply", id),
        Err(e) => {
            warn!("Failed to load conversation {} for reply: {}", id, e);
            app.notice = Some(format!("Load failed: {e}"));
        }
    }
}

fn select_history_entry(app: &mut App, index: usize) -> Effect {
    if app.focus != Focus::HistoryList || index == app.selected {
        return Effect::None;
    }
    let Some(summary) = app.history.get(index).cloned() else {
        return Effect::None;
    };

    if summary.id == app.active.id {
        app.selected = index;
        return Effect::Render;
    }
    if summary.is_new_chat() {
        debug!("Starting a new conversation");
        app.active = ConversationLog::new();
        app.selected = index;
        return Effect::Render;
    }

    // The highlight only moves once the conversation is actually shown.
    match app.store.find(summary.id) {
        Ok(Some(log)) => {
            debug!("Loaded conversation {} ({} messages)", log.id, log.messages.len());
            app.active = log;
            app.selected = index;
        }
        Ok(None) => {
            warn!("Conversation {} not found, starting fresh", summary.id);
            app.active = ConversationLog::new();
            refresh_history(app);
        }
        Err(e) => {
            warn!("Failed to load conversation {}: {}", summary.id, e);
            app.notice = Some(format!("Load failed: {e}"));
        }
    }
    Effect::Render
}

/// Create or update the active conversation. Failures become a notice and
/// are retried by the next mutation.
fn persist_active(app: &mut App) {
    let result = if app.active.is_new() {
        app.active.ensure_title();
        app.store.create(&app.active).map(|summary| {
            info!("Created conversation {} ({:?})", summary.id, summary.title);
            app.active.id = summary.id;
            app.active.updated_at = summary.updated_at;
        })
    } else {
        app.store
            .update(&app.active)
            .map(|stamp| app.active.updated_at = stamp)
    };

    match result {
        Ok(()) => app.notice = None,
        Err(e) => {
            warn!("Failed to save conversation: {}", e);
            app.notice = Some(format!("Save failed: {e}"));
        }
    }
}

/// Reload summaries and point the selection at the active conversation.
fn refresh_history(app: &mut App) {
    if let Err(e) = app.history.refresh(app.store.as_ref()) {
        warn!("Failed to refresh history: {}", e);
        app.notice = Some(format!("History unavailable: {e}"));
    }
    app.selected = app.history.position_of(app.active.id).unwrap_or(0);
}
