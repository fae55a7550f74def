//! Response interpreter: decodes the model's structured result, with a
//! single self-repair round trip when the first decode fails.

use crate::transport::{ChatRequest, CompletionTransport};
use mindmates_core::{ChatError, Message, MindTribute};
use serde::{Deserialize, Serialize};

/// The structured result the model is instructed to produce instead of
/// free text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub chat_response: String,
    #[serde(default)]
    pub mind_tributes: Vec<MindTribute>,
}

/// Which decode attempt we are on. Two states, no further transitions:
/// the at-most-one-retry invariant is carried by the type, not by
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairState {
    Primary,
    Repaired,
}

fn decode(content: &str) -> Result<TurnOutcome, serde_json::Error> {
    serde_json::from_str(content.trim())
}

/// Prompt asking the model to re-emit its own previous output as valid
/// JSON. The malformed text is embedded verbatim.
fn repair_prompt(malformed: &str) -> String {
    format!(
        "Your previous reply was not valid JSON. Here it is exactly as received:\n\n{}\n\nReturn the same information as ONLY a valid JSON object with the keys \"chatResponse\" (string) and \"mindTributes\" (array of {{\"type\", \"score\", \"summary\"}}). No commentary, no code fences.",
        malformed
    )
}

/// Decodes `primary_content` as a [`TurnOutcome`]; on failure issues exactly
/// one repair request through `transport` (reusing the fixed request
/// parameters of `request`) and decodes that. A second failure is terminal.
pub async fn interpret(
    transport: &dyn CompletionTransport,
    api_key: &str,
    request: &ChatRequest,
    primary_content: &str,
) -> Result<TurnOutcome, ChatError> {
    let mut state = RepairState::Primary;
    let mut content = primary_content.to_string();

    loop {
        match decode(&content) {
            Ok(outcome) => return Ok(outcome),
            Err(err) => match state {
                RepairState::Primary => {
                    tracing::warn!(
                        target: "mindmates::chat",
                        error = %err,
                        "primary decode failed, issuing one repair request"
                    );
                    let repair = ChatRequest {
                        model: request.model.clone(),
                        messages: vec![Message::user(repair_prompt(&content))],
                        temperature: request.temperature,
                        max_tokens: request.max_tokens,
                    };
                    content = transport.complete(api_key, &repair).await?;
                    state = RepairState::Repaired;
                }
                RepairState::Repaired => {
                    return Err(ChatError::MalformedResponse(err.to_string()));
                }
            },
        }
    }
}
