//! OpenAI provider implementation using the Chat Completions API.
//!
//! This module uses Chat Completions terminology:
//! - "messages" (array of `{role, content}`)
//! - "choices" in the response; the first choice carries the reply

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::core::conversation::{Message, Role};
use crate::inference::provider::with_cancellation;
use crate::inference::{CompletionProvider, CompletionRequest, ProviderError};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

// ============================================================================
// Chat Completions API Types
// ============================================================================

#[derive(Serialize, Debug, Clone, PartialEq)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize, Debug)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ============================================================================
// Translation Layer
// ============================================================================

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
    messages
        .iter()
        .map(|m| ApiMessage {
            role: role_name(m.role),
            content: m.content.clone(),
        })
        .collect()
}

/// `0` means "let the provider decide", so the field is omitted.
fn max_tokens_field(max_tokens: u32) -> Option<u32> {
    (max_tokens > 0).then_some(max_tokens)
}

fn map_send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Network(e.to_string())
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// OpenAI-compatible chat completion provider.
pub struct OpenAiProvider {
    api_key: Option<String>,
    organization: Option<String>,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a new provider.
    ///
    /// # Arguments
    /// * `api_key` - API credential; a missing key is reported per request
    /// * `organization` - Optional organization id header
    /// * `base_url` - Optional custom base URL (defaults to OpenAI's API)
    /// * `model` - Model name sent with every request
    /// * `timeout` - Per-request HTTP timeout
    pub fn new(
        api_key: Option<String>,
        organization: Option<String>,
        base_url: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout ({}), using defaults", e);
                reqwest::Client::new()
            });

        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            organization: organization.filter(|o| !o.is_empty()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model,
            client,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::Config(
                "missing API key (set OPEN_AI_TOKEN or [openai] api_key)".to_string(),
            )
        })?;

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(body);
        if let Some(org) = &self.organization {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = builder.send().await.map_err(map_send_error)?;
        debug!("OpenAI response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("OpenAI API error: {} - {}", status, err_body);
            return Err(ProviderError::Api {
                status,
                message: err_body,
            });
        }

        let text = response.text().await.map_err(map_send_error)?;
        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Parse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| ProviderError::Parse("response contained no choices".to_string()))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        request: CompletionRequest<'_>,
        cancel: CancellationToken,
    ) -> Result<String, ProviderError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: to_api_messages(request.messages),
            max_tokens: max_tokens_field(request.max_tokens),
        };

        info!(
            "OpenAI chat completion request: model={}, messages={}, max_tokens={:?}",
            body.model,
            body.messages.len(),
            body.max_tokens
        );

        with_cancellation(&cancel, self.send_request(&body)).await
    }
}
