//! Outbound transport to the hosted chat-completion endpoint.
//!
//! The seam is a trait so the turn service can be driven by scripted fakes
//! in tests; the production implementation is a thin `reqwest` client.

use async_trait::async_trait;
use mindmates_core::{ChatError, Message};
use serde::{Deserialize, Serialize};

/// One outbound chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionPayload {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Error body shape the endpoint returns on failure.
#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

const GENERIC_FAILURE: &str = "Failed to get response from AI";

/// Issues chat-completion requests. One call per invocation; the caller
/// owns all retry policy (which is the single repair step and nothing else).
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Sends one request and returns the model's raw message content.
    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, ChatError>;
}

/// Production transport over HTTPS with a bearer credential.
pub struct HttpTransport {
    client: reqwest::Client,
    api_url: String,
}

impl HttpTransport {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
        }
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, ChatError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            // Surface the server's own message verbatim when it sent one.
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .map(|detail| detail.message)
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            return Err(ChatError::Transport(message));
        }

        let payload: CompletionPayload = response
            .json()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ChatError::Transport("completion response contained no choices".into()))
    }
}
