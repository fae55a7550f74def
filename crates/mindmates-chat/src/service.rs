//! Turn service: drives one chat turn end to end.
//!
//! Per turn: credential precondition, render + send, interpret (with the
//! bounded repair), wholesale-replace the user's tributes, hand back only
//! the reply text. At most two sequential round trips, never concurrent;
//! a second turn for the same user while one is outstanding is rejected.

use crate::interpreter::interpret;
use crate::prompt::PromptTemplate;
use crate::transport::{ChatRequest, CompletionTransport};
use dashmap::DashMap;
use mindmates_core::{ChatError, Message, UserDirectory};
use std::sync::Arc;

/// Bounded response length, fixed for every request.
pub const MAX_TOKENS: u32 = 500;
/// Moderate, non-zero sampling temperature for varied phrasing.
pub const TEMPERATURE: f32 = 0.7;

/// The chat pipeline with its collaborators. Carries the credential source
/// explicitly instead of ambient module state, so fakes slot in cleanly.
pub struct ChatService {
    transport: Arc<dyn CompletionTransport>,
    directory: Arc<UserDirectory>,
    template: PromptTemplate,
    model: String,
    in_flight: DashMap<String, ()>,
}

/// Releases the in-flight slot for a user when the turn ends, on any path.
struct TurnGuard<'a> {
    in_flight: &'a DashMap<String, ()>,
    user_id: String,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.user_id);
    }
}

impl ChatService {
    pub fn new(
        transport: Arc<dyn CompletionTransport>,
        directory: Arc<UserDirectory>,
        template: PromptTemplate,
        model: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            directory,
            template,
            model: model.into(),
            in_flight: DashMap::new(),
        }
    }

    fn begin_turn(&self, user_id: &str) -> Result<TurnGuard<'_>, ChatError> {
        if self.in_flight.insert(user_id.to_string(), ()).is_some() {
            return Err(ChatError::TurnInFlight);
        }
        Ok(TurnGuard {
            in_flight: &self.in_flight,
            user_id: user_id.to_string(),
        })
    }

    /// Runs one chat turn for `user_id`: `history` is the ordered sequence
    /// of the user's prior outgoing message texts (oldest first) and
    /// `message` is the new one. Returns only the reply text; the tribute
    /// set is persisted as a side channel.
    pub async fn send_message(
        &self,
        user_id: &str,
        history: &[String],
        message: &str,
    ) -> Result<String, ChatError> {
        let _guard = self.begin_turn(user_id)?;

        // Credential precondition, checked before any network call.
        let api_key = self.directory.api_key().ok_or_else(|| {
            ChatError::Configuration("API key is not set; set your key before chatting".into())
        })?;

        let mut transcript: Vec<String> = history.to_vec();
        transcript.push(message.to_string());
        let rendered = self.template.render(&transcript);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::user(rendered)],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let primary = self.transport.complete(&api_key, &request).await?;
        let outcome = interpret(self.transport.as_ref(), &api_key, &request, &primary).await?;

        // Best-effort side channel; unknown user is a logged no-op inside
        // the directory and must not fail the turn.
        self.directory
            .replace_mind_tributes(user_id, outcome.mind_tributes)?;

        tracing::info!(
            target: "mindmates::chat",
            user_id = %user_id,
            "chat turn completed"
        );
        Ok(outcome.chat_response)
    }
}
