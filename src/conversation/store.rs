//! Per-user conversation store
//!
//! Owns every conversation log and mediates each call to the completion
//! provider. Each user's log sits behind its own async mutex, so turns from
//! the same user run one at a time while different users proceed in parallel.

use crate::completion::{CompletionClient, CompletionOutcome};
use crate::conversation::context::{ContextConfig, ContextManager};
use crate::conversation::history::{ConversationLog, Exchange};
use crate::error::{BotError, CompletionError};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{info, warn};

type Slot = Arc<Mutex<ConversationLog>>;

/// Process-wide store of conversation logs keyed by user id
pub struct ConversationStore {
    logs: RwLock<HashMap<String, Slot>>,
    context: ContextManager,
}

impl ConversationStore {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            logs: RwLock::new(HashMap::new()),
            context: ContextManager::with_config(config),
        }
    }

    /// Return the lock guarding `user_id`'s log, seeding the log if absent.
    ///
    /// The map lock is released before the caller awaits the per-user lock.
    async fn slot(&self, user_id: &str) -> Slot {
        {
            let logs = self.logs.read().await;
            if let Some(slot) = logs.get(user_id) {
                return Arc::clone(slot);
            }
        }

        let mut logs = self.logs.write().await;
        let slot = logs.entry(user_id.to_string()).or_insert_with(|| {
            info!(user_id = %user_id, "Seeding conversation history");
            Arc::new(Mutex::new(self.context.seed(user_id)))
        });

        Arc::clone(slot)
    }

    /// Snapshot of `user_id`'s log, creating it with the persona exchange if needed
    pub async fn get_or_create(&self, user_id: &str) -> ConversationLog {
        let slot = self.slot(user_id).await;
        let log = slot.lock().await;
        log.clone()
    }

    /// Append the user's message, apply the bound and return the pending turn.
    ///
    /// The turn keeps `user_id`'s lock until it is passed to
    /// [`ConversationStore::complete_and_record`] or dropped, so no other
    /// operation on that user's log can run in between.
    pub async fn record_user_turn(&self, user_id: &str, text: &str) -> PendingTurn {
        let slot = self.slot(user_id).await;
        let mut guard = slot.lock_owned().await;
        self.push_bounded(&mut guard, Exchange::user(text));

        PendingTurn {
            request: guard.clone(),
            guard,
        }
    }

    /// Send the turn's request to `client` and record the reply.
    ///
    /// On failure the stored log is left as it was and the cause is returned
    /// as [`BotError::CompletionFailed`].
    pub async fn complete_and_record(
        &self,
        turn: PendingTurn,
        client: &dyn CompletionClient,
    ) -> Result<String> {
        let PendingTurn { request, mut guard } = turn;
        self.complete_locked(&mut guard, request.to_request(), client)
            .await
    }

    /// Run one full turn for `user_id`
    pub async fn converse(
        &self,
        user_id: &str,
        text: &str,
        client: &dyn CompletionClient,
    ) -> Result<String> {
        let turn = self.record_user_turn(user_id, text).await;
        self.complete_and_record(turn, client).await
    }

    /// Number of users with a conversation log
    pub async fn user_count(&self) -> usize {
        self.logs.read().await.len()
    }

    pub async fn contains(&self, user_id: &str) -> bool {
        self.logs.read().await.contains_key(user_id)
    }

    pub fn config(&self) -> &ContextConfig {
        self.context.config()
    }

    fn push_bounded(&self, log: &mut ConversationLog, exchange: Exchange) {
        log.push(exchange);
        self.context.apply_bound(log);
    }

    async fn complete_locked(
        &self,
        log: &mut ConversationLog,
        request: Vec<Exchange>,
        client: &dyn CompletionClient,
    ) -> Result<String> {
        let timeout = self.config().completion_timeout;

        let outcome = match tokio::time::timeout(timeout, client.complete(&request)).await {
            Ok(outcome) => outcome,
            Err(_) => CompletionOutcome::Failed(CompletionError::Timeout(timeout)),
        };

        match outcome {
            CompletionOutcome::Reply(reply) => {
                self.push_bounded(log, Exchange::assistant(reply.as_str()));
                Ok(reply)
            }
            CompletionOutcome::Failed(cause) => {
                warn!(
                    user_id = %log.user_id,
                    error = %cause,
                    "Completion failed, leaving history unchanged"
                );
                Err(BotError::CompletionFailed(cause))
            }
        }
    }
}

/// A recorded user message awaiting its reply.
///
/// Holds the user's lock. Dropping it without completing leaves the user
/// message recorded with no reply, the same state as a failed completion.
pub struct PendingTurn {
    request: ConversationLog,
    guard: OwnedMutexGuard<ConversationLog>,
}

impl PendingTurn {
    /// The log as it stood after the user message, i.e. the completion request
    pub fn request(&self) -> &ConversationLog {
        &self.request
    }

    pub fn user_id(&self) -> &str {
        &self.guard.user_id
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}
