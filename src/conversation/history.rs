//! Conversation history types
//!
//! Role-tagged exchanges and the per-user log that holds them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Role of an exchange author
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exchange {
    role: Role,
    content: String,
}

impl Exchange {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered exchange log for a single user, oldest first.
///
/// The first exchange is the persona (`system`) exchange. It is written once
/// by [`ConversationLog::seeded`] and survives every call to [`ConversationLog::bound_to`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationLog {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    exchanges: VecDeque<Exchange>,
}

impl ConversationLog {
    /// Create a log holding only the persona exchange
    pub fn seeded(user_id: impl Into<String>, persona: impl Into<String>) -> Self {
        let now = Utc::now();
        let mut exchanges = VecDeque::with_capacity(8);
        exchanges.push_back(Exchange::system(persona));

        Self {
            user_id: user_id.into(),
            created_at: now,
            updated_at: now,
            exchanges,
        }
    }

    /// Append an exchange at the end of the log
    pub fn push(&mut self, exchange: Exchange) {
        self.exchanges.push_back(exchange);
        self.updated_at = Utc::now();
    }

    /// Drop the oldest non-system exchanges until at most `limit` remain
    pub fn bound_to(&mut self, limit: usize) {
        let pinned = usize::from(self.has_system());
        let limit = limit.max(pinned);

        while self.exchanges.len() > limit {
            // index `pinned` is the oldest evictable exchange
            self.exchanges.remove(pinned);
        }
    }

    pub fn has_system(&self) -> bool {
        matches!(self.exchanges.front(), Some(e) if e.role() == Role::System)
    }

    pub fn exchanges(&self) -> impl DoubleEndedIterator<Item = &Exchange> + ExactSizeIterator {
        self.exchanges.iter()
    }

    /// Owned copy of the exchanges, in order, for a completion request
    pub fn to_request(&self) -> Vec<Exchange> {
        self.exchanges.iter().cloned().collect()
    }

    pub fn first(&self) -> Option<&Exchange> {
        self.exchanges.front()
    }

    pub fn last(&self) -> Option<&Exchange> {
        self.exchanges.back()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}
