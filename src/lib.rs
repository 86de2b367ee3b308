//! Companion Bot
//!
//! A small chat bot that:
//! - Listens for prefixed text commands
//! - Forwards `ask` messages to an AI completion API with a bounded per-user history
//! - Scores sentences with a pseudo-random probability
//! - Answers health checks over HTTP
//!
//! FLOW:
//! TRANSPORT → ROUTER → CONVERSATION STORE → COMPLETION CLIENT → REPLY

pub mod commands;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod health;
pub mod probability;
pub mod transport;

pub use error::Result;

// Re-export common types
pub use commands::CommandRouter;
pub use completion::{CompletionClient, CompletionOutcome, OpenAiClient};
pub use config::BotConfig;
pub use conversation::{ConversationLog, ConversationStore, Exchange, Role};
