//! Error types for the companion bot

use std::time::Duration;
use thiserror::Error;

/// Result type alias for bot operations
pub type Result<T> = std::result::Result<T, BotError>;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Completion failed: {0}")]
    CompletionFailed(#[source] CompletionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a completion call produced no reply
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("completion API key not configured")]
    NotConfigured,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("provider returned an empty reply")]
    EmptyReply,

    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

impl From<CompletionError> for BotError {
    fn from(cause: CompletionError) -> Self {
        BotError::CompletionFailed(cause)
    }
}
