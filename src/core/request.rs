//! # Completion Requests
//!
//! Builds the request a `Submit` sends upstream and runs it in the
//! background. The task only owns a copy of the messages, the provider, and
//! a way to deliver its outcome; it never touches `App`.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::core::conversation::{ChatId, Message};
use crate::inference::{CompletionProvider, CompletionRequest, ProviderError};

/// Everything the background task needs, snapshotted at submit time.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionJob {
    pub request_id: u64,
    /// Conversation the request was issued against.
    pub conversation_id: ChatId,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
}

/// Result of a completion, tagged with where it belongs.
#[derive(Debug)]
pub struct CompletionOutcome {
    pub request_id: u64,
    pub conversation_id: ChatId,
    pub result: Result<String, ProviderError>,
}

/// The tail of `messages` sent upstream.
///
/// `max_prev == 0` means "no limit". Storage is never truncated, only the request.
pub fn request_window(messages: &[Message], max_prev: usize) -> &[Message] {
    if max_prev == 0 || messages.len() <= max_prev {
        messages
    } else {
        &messages[messages.len() - max_prev..]
    }
}

/// Run `job` on the tokio runtime and hand the outcome to `deliver`.
///
/// Returns the token that cancels this request only. Cancelling `shutdown`
/// cancels it too, and in that case nothing is delivered: the event queue
/// may already be gone.
pub fn spawn_completion<F>(
    provider: Arc<dyn CompletionProvider>,
    job: CompletionJob,
    shutdown: &CancellationToken,
    deliver: F,
) -> CancellationToken
where
    F: FnOnce(CompletionOutcome) -> bool + Send + 'static,
{
    let cancel = shutdown.child_token();
    let task_cancel = cancel.clone();
    let shutdown = shutdown.clone();

    info!(
        "Spawning completion request #{} via {} (conversation={}, messages={}, max_tokens={})",
        job.request_id,
        provider.name(),
        job.conversation_id,
        job.messages.len(),
        job.max_tokens
    );

    tokio::spawn(async move {
        let request = CompletionRequest {
            messages: &job.messages,
            max_tokens: job.max_tokens,
        };
        let result = provider.complete(request, task_cancel).await;

        if shutdown.is_cancelled() {
            debug!("Request #{} finished after shutdown, dropping result", job.request_id);
            return;
        }

        match &result {
            Ok(reply) => info!("Request #{} completed ({} bytes)", job.request_id, reply.len()),
            Err(e) => info!("Request #{} failed: {}", job.request_id, e),
        }

        let outcome = CompletionOutcome {
            request_id: job.request_id,
            conversation_id: job.conversation_id,
            result,
        };
        if !deliver(outcome) {
            warn!("Failed to deliver result of request #{}: receiver dropped", job.request_id);
        }
    });

    cancel
}
