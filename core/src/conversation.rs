//! Conversation store: appends the final assistant turn, plus its thinking-step
//! log, once a stream completes successfully (C5 end-of-stream persistence).
//!
//! Mirrors the teacher's `user_message` store shape (`append`/`list` on a
//! thread-keyed store), but append-only at turn granularity rather than
//! per-message, since the persisted unit here is "one completed turn plus its
//! reasoning timeline", not a raw message stream.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::message::Message;

/// One reasoning or tool-call phase surfaced to the UI during a turn. The
/// persisted list of these lets a client reconstruct the timeline without
/// re-running the model.
#[derive(Clone, Debug, PartialEq)]
pub struct ThinkingStepRecord {
    pub id: String,
    pub title: String,
    pub status: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub group: Option<String>,
}

/// One turn appended at end-of-stream: the user message that started it, the
/// assistant's final message, and the full thinking log observed while
/// producing it.
#[derive(Clone, Debug)]
pub struct ConversationTurn {
    pub conversation_id: String,
    pub owner_user_id: Option<String>,
    pub user_message: Message,
    pub assistant_message: Message,
    pub thinking_steps: Vec<ThinkingStepRecord>,
    pub created_at: DateTime<Utc>,
}

/// Error from [`ConversationStore`] operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConversationStoreError {
    #[error("conversation store error: {0}")]
    Other(String),
}

/// Store for completed turns, keyed by conversation id. Only ever called once
/// a stream finishes without error or client disconnect: spec.md requires
/// the partial assistant content accumulated so far NOT be persisted on
/// error or disconnect.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn append_turn(&self, turn: ConversationTurn) -> Result<(), ConversationStoreError>;
}

/// In-memory [`ConversationStore`]: a process-local `RwLock<HashMap<..>>`,
/// same shape as the other mocked collaborators in `executor::adapters`. A
/// durable (SQLite-backed) adapter is out of scope (mocked collaborator, per
/// spec.md §1's "adapter implementations for the three upstream systems
/// (mock catalogs only)" — conversation persistence is the fourth).
#[derive(Default)]
pub struct MockConversationStore {
    turns: RwLock<HashMap<String, Vec<ConversationTurn>>>,
}

impl MockConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All turns recorded for `conversation_id`, oldest first.
    pub fn turns_for(&self, conversation_id: &str) -> Vec<ConversationTurn> {
        self.turns.read().expect("lock poisoned").get(conversation_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ConversationStore for MockConversationStore {
    async fn append_turn(&self, turn: ConversationTurn) -> Result<(), ConversationStoreError> {
        let mut turns = self
            .turns
            .write()
            .map_err(|_| ConversationStoreError::Other("lock poisoned".to_string()))?;
        turns.entry(turn.conversation_id.clone()).or_default().push(turn);
        Ok(())
    }
}
