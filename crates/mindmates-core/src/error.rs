//! Error taxonomy for the chat pipeline.

use thiserror::Error;

/// Errors surfaced at the boundary of a chat turn.
///
/// Nothing here is retried except the single bounded JSON-repair step
/// inside the interpreter; an unknown user on the tribute write is logged
/// rather than raised.
#[derive(Error, Debug)]
pub enum ChatError {
    /// No API credential configured. Raised before any network call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network or HTTP failure, carrying the server-provided message when
    /// one was available.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Model output was not valid structured JSON even after the single
    /// repair round trip. Terminal for the turn.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// A turn for this user is already outstanding.
    #[error("A chat turn is already in flight for this user")]
    TurnInFlight,

    /// Directory storage failure.
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),
}

impl ChatError {
    /// HTTP status code the gateway maps this error to.
    pub fn status_code(&self) -> u16 {
        match self {
            ChatError::Configuration(_) => 412,
            ChatError::TurnInFlight => 409,
            ChatError::Transport(_) => 502,
            ChatError::MalformedResponse(_) => 502,
            ChatError::Storage(_) => 500,
        }
    }
}
