//! Command Router
//!
//! Turns prefixed chat messages into command invocations:
//! - `ask <text>`: talk to the AI with per-user memory
//! - `probability <sentence>`: pseudo-random score for a sentence
//! - `help`: usage

use crate::completion::CompletionClient;
use crate::conversation::ConversationStore;
use crate::error::BotError;
use crate::probability;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const APOLOGY: &str = "Sorry, I couldn't get an answer from the AI right now. Please try again in a moment.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Probability(String),
    Help,
    Unknown(String),
}

/// Parse `text` into a command if it starts with `prefix`
pub fn parse(prefix: &str, text: &str) -> Option<Command> {
    let rest = text.trim_start().strip_prefix(prefix)?;

    let rest = rest.trim_start();
    let (name, remainder) = match rest.find(char::is_whitespace) {
        Some(split) => (&rest[..split], rest[split..].trim()),
        None => (rest, ""),
    };

    if name.is_empty() {
        return None;
    }

    let command = match name.to_lowercase().as_str() {
        "ask" | "chat" | "ai" => Command::Ask(remainder.to_string()),
        "probability" | "prob" => Command::Probability(remainder.to_string()),
        "help" => Command::Help,
        other => Command::Unknown(other.to_string()),
    };

    Some(command)
}

/// Dispatches parsed commands to their handlers
pub struct CommandRouter {
    prefix: String,
    store: Arc<ConversationStore>,
    client: Arc<dyn CompletionClient>,
}

impl CommandRouter {
    pub fn new(
        prefix: impl Into<String>,
        store: Arc<ConversationStore>,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            store,
            client,
        }
    }

    /// Handle one inbound message. `None` means the bot stays silent.
    pub async fn handle(&self, user_id: &str, text: &str) -> Option<String> {
        let command = parse(&self.prefix, text)?;

        match command {
            Command::Ask(message) if message.is_empty() => {
                Some(format!("Usage: {}ask <your message>", self.prefix))
            }
            Command::Ask(message) => Some(self.ask(user_id, &message).await),
            Command::Probability(sentence) if sentence.is_empty() => {
                Some(format!("Usage: {}probability <your sentence>", self.prefix))
            }
            Command::Probability(sentence) => Some(probability::score_sentence(&sentence)),
            Command::Help => Some(self.help()),
            Command::Unknown(name) => {
                debug!(user_id = %user_id, command = %name, "Ignoring unknown command");
                None
            }
        }
    }

    async fn ask(&self, user_id: &str, message: &str) -> String {
        info!(user_id = %user_id, "Handling ask command");

        match self
            .store
            .converse(user_id, message, self.client.as_ref())
            .await
        {
            Ok(reply) => reply,
            Err(BotError::CompletionFailed(cause)) => {
                error!(user_id = %user_id, error = %cause, "AI completion failed");
                APOLOGY.to_string()
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Ask command failed");
                APOLOGY.to_string()
            }
        }
    }

    fn help(&self) -> String {
        format!(
            "Commands:\n\
             {p}ask <message> - chat with the AI (remembers your recent messages)\n\
             {p}probability <sentence> - get a random probability (0-100%) for a sentence\n\
             {p}help - show this message",
            p = self.prefix
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionOutcome;
    use crate::conversation::{ContextConfig, Exchange, Role};
    use crate::error::CompletionError;
    use async_trait::async_trait;

    struct FixedReply(&'static str);

    #[async_trait]
    impl CompletionClient for FixedReply {
        async fn complete(&self, _exchanges: &[Exchange]) -> CompletionOutcome {
            CompletionOutcome::Reply(self.0.to_string())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl CompletionClient for Unreachable {
        async fn complete(&self, _exchanges: &[Exchange]) -> CompletionOutcome {
            CompletionOutcome::Failed(CompletionError::NotConfigured)
        }
    }

    fn router(client: Arc<dyn CompletionClient>) -> (CommandRouter, Arc<ConversationStore>) {
        let store = Arc::new(ConversationStore::new(ContextConfig::default()));
        (CommandRouter::new("!", Arc::clone(&store), client), store)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse("!", "!ask  what is rust? "),
            Some(Command::Ask("what is rust?".to_string()))
        );
        assert_eq!(
            parse("!", "!PROB it will rain"),
            Some(Command::Probability("it will rain".to_string()))
        );
        assert_eq!(parse("!", "!help"), Some(Command::Help));
        assert_eq!(
            parse("!", "!dance now"),
            Some(Command::Unknown("dance".to_string()))
        );
        assert_eq!(parse("!", "!ask"), Some(Command::Ask(String::new())));
    }

    #[test]
    fn test_parse_ignores_plain_text() {
        assert_eq!(parse("!", "hello there"), None);
        assert_eq!(parse("!", "!"), None);
        assert_eq!(parse("$", "!ask hi"), None);
    }

    #[tokio::test]
    async fn test_ask_records_conversation() {
        let (router, store) = router(Arc::new(FixedReply("hi!")));

        let reply = router.handle("alice", "!ask hello").await;
        assert_eq!(reply.as_deref(), Some("hi!"));

        let log = store.get_or_create("alice").await;
        assert_eq!(log.len(), 3);
        assert_eq!(log.last().map(Exchange::role), Some(Role::Assistant));
    }

    #[tokio::test]
    async fn test_ask_failure_replies_with_apology() {
        let (router, store) = router(Arc::new(Unreachable));

        let reply = router.handle("alice", "!ask hello").await;
        assert_eq!(reply.as_deref(), Some(APOLOGY));

        let log = store.get_or_create("alice").await;
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().map(Exchange::content), Some("hello"));
    }

    #[tokio::test]
    async fn test_empty_ask_leaves_store_untouched() {
        let (router, store) = router(Arc::new(FixedReply("unused")));

        let reply = router.handle("alice", "!ask   ").await;
        assert_eq!(reply.as_deref(), Some("Usage: !ask <your message>"));
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_probability_and_unknown() {
        let (router, store) = router(Arc::new(FixedReply("unused")));

        let reply = router.handle("bob", "!probability  Pigs   CAN fly").await;
        assert!(reply.unwrap().contains("\"pigs can fly\""));

        assert_eq!(router.handle("bob", "!dance").await, None);
        assert_eq!(router.handle("bob", "just chatting").await, None);
        assert_eq!(store.user_count().await, 0);
    }
}
