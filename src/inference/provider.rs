use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::conversation::Message;

/// Errors that can occur during provider operations.
#[derive(Debug)]
pub enum ProviderError {
    /// Provider misconfigured (missing API key, bad URL). Not retryable.
    Config(String),
    /// Network-level failure (DNS, connection refused, reset). Retryable.
    Network(String),
    /// The request exceeded the configured timeout. Retryable.
    Timeout,
    /// API returned an error response. Retryable if status >= 500 or 429.
    Api { status: u16, message: String },
    /// Failed to parse the provider's response. Not retryable.
    Parse(String),
    /// The caller cancelled the request.
    Cancelled,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Config(msg) => write!(f, "config error: {msg}"),
            ProviderError::Network(msg) => write!(f, "network error: {msg}"),
            ProviderError::Timeout => write!(f, "timeout"),
            ProviderError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            ProviderError::Parse(msg) => write!(f, "parse error: {msg}"),
            ProviderError::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Everything a provider needs to fulfill a completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// Ordered messages, already truncated to the request window.
    pub messages: &'a [Message],
    /// Reply length cap. `0` = provider default.
    pub max_tokens: u32,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the name of the provider.
    fn name(&self) -> &str;

    /// Requests a single (non-streamed) reply.
    ///
    /// Must return `ProviderError::Cancelled` promptly once `cancel` fires.
    async fn complete(
        &self,
        request: CompletionRequest<'_>,
        cancel: CancellationToken,
    ) -> Result<String, ProviderError>;
}

/// Race `work` against `cancel`, mapping cancellation to `ProviderError::Cancelled`.
pub async fn with_cancellation<T, F>(cancel: &CancellationToken, work: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProviderError::Cancelled),
        result = work => result,
    }
}
