//! Conversation memory
//!
//! Keeps a bounded chat history per user and feeds it back into every
//! completion call so the bot remembers recent context

pub mod context;
pub mod history;
pub mod store;

pub use context::{ContextConfig, ContextManager};
pub use history::{ConversationLog, Exchange, Role};
pub use store::{ConversationStore, PendingTurn};
