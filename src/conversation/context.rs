//! Context Window Management
//!
//! Holds the persona text and the bounding policy applied to every
//! conversation log before it is sent to the completion provider

use crate::conversation::history::ConversationLog;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_PERSONA: &str = "You are a friendly and helpful assistant in a chat server. \
Keep answers short, clear and conversational.";

pub const DEFAULT_HISTORY_LIMIT: usize = 6;

pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for per-user conversation context
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Text of the pinned system exchange
    pub persona: String,
    /// Maximum exchanges retained per user, system exchange included
    pub history_limit: usize,
    /// Upper bound on a single completion call
    pub completion_timeout: Duration,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }
}

/// Applies the bounding policy to conversation logs
#[derive(Debug, Clone)]
pub struct ContextManager {
    config: ContextConfig,
}

impl ContextManager {
    pub fn new() -> Self {
        Self {
            config: ContextConfig::default(),
        }
    }

    /// Limits below 2 are raised to 2 so one turn always fits beside the persona.
    pub fn with_config(mut config: ContextConfig) -> Self {
        config.history_limit = config.history_limit.max(2);
        Self { config }
    }

    /// Seed a fresh log for `user_id`
    pub fn seed(&self, user_id: &str) -> ConversationLog {
        ConversationLog::seeded(user_id, self.config.persona.as_str())
    }

    /// Trim `log` to the configured limit, keeping the system exchange pinned
    pub fn apply_bound(&self, log: &mut ConversationLog) {
        let before = log.len();
        log.bound_to(self.config.history_limit);

        if log.len() < before {
            debug!(
                user_id = %log.user_id,
                evicted = before - log.len(),
                "Trimmed conversation history"
            );
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::history::{Exchange, Role};

    #[test]
    fn test_context_manager_creation() {
        let manager = ContextManager::new();
        assert_eq!(manager.config().history_limit, 6);
        assert_eq!(manager.config().completion_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_limit_is_raised_to_two() {
        let manager = ContextManager::with_config(ContextConfig {
            history_limit: 1,
            ..ContextConfig::default()
        });
        assert_eq!(manager.config().history_limit, 2);
    }

    #[test]
    fn test_apply_bound() {
        let manager = ContextManager::with_config(ContextConfig {
            persona: "Be terse.".to_string(),
            history_limit: 3,
            ..ContextConfig::default()
        });

        let mut log = manager.seed("bob");
        log.push(Exchange::user("one"));
        log.push(Exchange::assistant("two"));
        log.push(Exchange::user("three"));
        manager.apply_bound(&mut log);

        let exchanges: Vec<&Exchange> = log.exchanges().collect();
        assert_eq!(exchanges.len(), 3);
        assert_eq!(exchanges[0].role(), Role::System);
        assert_eq!(exchanges[0].content(), "Be terse.");
        assert_eq!(exchanges[1].content(), "two");
        assert_eq!(exchanges[2].content(), "three");
    }
}
