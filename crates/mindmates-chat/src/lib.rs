//! mindmates-chat: the chat-completion request/response pipeline.
//!
//! A turn flows through three pieces:
//! - [`PromptTemplate`] renders the user's transcript into the instruction
//!   template and the request builder wraps it as a single user message;
//! - a [`CompletionTransport`] issues the request (HTTP in production,
//!   scripted fakes in tests);
//! - the interpreter decodes the structured `{ chatResponse, mindTributes }`
//!   result, with exactly one self-repair round trip on decode failure.
//!
//! [`ChatService`] ties the pieces together and performs the tribute
//! side-effect against the user directory.

mod interpreter;
mod prompt;
mod service;
#[cfg(test)]
pub(crate) mod testing;
mod transport;

pub use interpreter::{interpret, RepairState, TurnOutcome};
pub use prompt::{PromptTemplate, PLACEHOLDER};
pub use service::{ChatService, MAX_TOKENS, TEMPERATURE};
pub use transport::{ChatRequest, CompletionTransport, HttpTransport};
