pub mod provider;
pub mod providers;

pub use provider::{CompletionProvider, CompletionRequest, ProviderError, with_cancellation};
pub use providers::{DEFAULT_OPENAI_BASE_URL, OpenAiProvider};
