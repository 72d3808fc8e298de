//! End-to-end session flows over the on-disk store, with replies injected
//! the way the event loop delivers them.

use std::path::{Path, PathBuf};

use termchat::core::action::{Action, CANCELLED_REPLY, Effect, update};
use termchat::core::conversation::{ChatId, Role};
use termchat::core::request::{CompletionJob, CompletionOutcome};
use termchat::core::state::{App, Focus, RequestLimits, RequestState};
use termchat::core::store::{ChatStore, JsonChatStore};
use termchat::inference::ProviderError;

// ============================================================================
// Helper Functions
// ============================================================================

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("termchat-flow-{}", uuid::Uuid::new_v4()))
}

fn open_app(dir: &Path, limits: RequestLimits) -> App {
    let store = JsonChatStore::open(dir).unwrap();
    App::new(Box::new(store), "test-model".to_string(), limits, (80, 24))
}

fn submit(app: &mut App, text: &str) -> CompletionJob {
    app.focus = Focus::InputArea;
    match update(app, Action::Submit(text.to_string())) {
        Effect::SpawnRequest(job) => job,
        other => panic!("Expected SpawnRequest, got {other:?}"),
    }
}

fn deliver(app: &mut App, job: &CompletionJob, result: Result<String, ProviderError>) -> Effect {
    update(
        app,
        Action::CompletionReceived(CompletionOutcome {
            request_id: job.request_id,
            conversation_id: job.conversation_id,
            result,
        }),
    )
}

fn select(app: &mut App, id: ChatId) {
    app.focus = Focus::HistoryList;
    let index = app.history.position_of(id).unwrap();
    update(app, Action::SelectHistoryEntry(index));
}

fn contents(app: &App) -> Vec<(Role, String)> {
    app.active
        .messages
        .iter()
        .map(|m| (m.role, m.content.clone()))
        .collect()
}

// ============================================================================
// Flows
// ============================================================================

#[test]
fn test_first_exchange_is_persisted() {
    let dir = temp_dir();
    let mut app = open_app(&dir, RequestLimits::default());

    let job = submit(&mut app, "Hello");
    assert!(app.request.is_pending());
    assert_ne!(job.conversation_id, 0);
    assert_eq!(app.history.len(), 2);

    assert_eq!(deliver(&mut app, &job, Ok("Hi there".to_string())), Effect::Render);
    assert_eq!(app.request, RequestState::Idle);
    assert_eq!(
        contents(&app),
        vec![
            (Role::User, "Hello".to_string()),
            (Role::Assistant, "Hi there".to_string())
        ]
    );

    // A fresh process sees the same conversation.
    let store = JsonChatStore::open(&dir).unwrap();
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Hello");
    let log = store.find(listed[0].id).unwrap().unwrap();
    assert_eq!(log.messages.len(), 2);
    assert_eq!(log.messages[1].content, "Hi there");

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_switching_conversations_loads_messages() {
    let dir = temp_dir();
    let mut app = open_app(&dir, RequestLimits::default());

    let job = submit(&mut app, "first chat");
    deliver(&mut app, &job, Ok("reply one".to_string()));
    let first = app.active.id;

    select(&mut app, 0);
    assert!(app.active.is_new());
    let job = submit(&mut app, "second chat");
    deliver(&mut app, &job, Ok("reply two".to_string()));
    let second = app.active.id;
    assert_ne!(first, second);

    select(&mut app, first);
    assert_eq!(app.active.id, first);
    assert_eq!(app.active.messages[1].content, "reply one");
    assert_eq!(app.history.get(app.selected).unwrap().id, first);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_error_reply_is_stored_inline() {
    let dir = temp_dir();
    let mut app = open_app(&dir, RequestLimits::default());

    let job = submit(&mut app, "Hello");
    deliver(&mut app, &job, Err(ProviderError::Timeout));
    assert_eq!(app.active.messages[1].content, "Error: timeout");
    assert_eq!(app.request, RequestState::Idle);

    let job = submit(&mut app, "again");
    deliver(&mut app, &job, Err(ProviderError::Cancelled));
    assert_eq!(app.active.messages[3].content, CANCELLED_REPLY);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_single_request_in_flight() {
    let dir = temp_dir();
    let mut app = open_app(&dir, RequestLimits::default());

    let job = submit(&mut app, "Hello");
    assert_eq!(update(&mut app, Action::Submit("again".to_string())), Effect::None);
    assert_eq!(app.active.messages.len(), 1);

    deliver(&mut app, &job, Ok("Hi".to_string()));
    // A duplicate delivery is stale and ignored.
    assert_eq!(deliver(&mut app, &job, Ok("Hi".to_string())), Effect::None);
    assert_eq!(app.active.messages.len(), 2);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_title_fixed_by_first_message() {
    let dir = temp_dir();
    let mut app = open_app(&dir, RequestLimits::default());

    let job = submit(&mut app, "Plan a trip\nto Lisbon");
    deliver(&mut app, &job, Ok("Sure".to_string()));
    let job = submit(&mut app, "Something else entirely");
    deliver(&mut app, &job, Ok("Ok".to_string()));

    let store = JsonChatStore::open(&dir).unwrap();
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].title.starts_with("Plan a trip"));
    assert_eq!(store.find(listed[0].id).unwrap().unwrap().messages.len(), 4);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_request_window_limits_context_not_storage() {
    let dir = temp_dir();
    let limits = RequestLimits {
        max_prev_messages: 2,
        max_reply_tokens: 128,
    };
    let mut app = open_app(&dir, limits);

    let job = submit(&mut app, "one");
    deliver(&mut app, &job, Ok("two".to_string()));
    let job = submit(&mut app, "three");

    let sent: Vec<&str> = job.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(sent, vec!["two", "three"]);
    assert_eq!(job.max_tokens, 128);
    assert_eq!(app.active.messages.len(), 3);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_reply_follows_its_conversation_after_switch() {
    let dir = temp_dir();
    let mut app = open_app(&dir, RequestLimits::default());

    let job = submit(&mut app, "first chat");
    deliver(&mut app, &job, Ok("reply one".to_string()));
    let first = app.active.id;

    // Ask in the first conversation, then move to a new one before the reply.
    let pending = submit(&mut app, "follow-up");
    select(&mut app, 0);
    assert!(app.active.is_new());

    deliver(&mut app, &pending, Ok("late reply".to_string()));
    assert!(app.active.messages.is_empty());
    assert_eq!(app.request, RequestState::Idle);

    select(&mut app, first);
    let last = app.active.messages.last().unwrap();
    assert_eq!(last.content, "late reply");
    assert_eq!(app.active.messages.len(), 4);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_restart_lists_saved_history() {
    let dir = temp_dir();
    {
        let mut app = open_app(&dir, RequestLimits::default());
        let job = submit(&mut app, "persist me");
        deliver(&mut app, &job, Ok("done".to_string()));
    }

    let app = open_app(&dir, RequestLimits::default());
    assert!(app.active.is_new());
    assert_eq!(app.history.len(), 2);
    assert!(app.history.get(0).unwrap().is_new_chat());
    assert_eq!(app.history.get(1).unwrap().title, "persist me");

    let _ = std::fs::remove_dir_all(dir);
}
