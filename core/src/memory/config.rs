//! Run-scoped configuration threaded through a graph invocation.

/// Identifies the conversation (thread) and user behind a single graph run, and
/// optionally pins the run to resume from a specific checkpoint.
///
/// **Interaction**: built by `orch-serve` from the incoming chat request, passed to
/// [`crate::graph::RunContext::new`] and to every [`crate::memory::Checkpointer`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunnableConfig {
    /// Conversation id. Required for checkpoint persistence; a run without one
    /// is not saved.
    pub thread_id: Option<String>,
    /// Resume from this checkpoint id instead of the latest one for `thread_id`.
    pub checkpoint_id: Option<String>,
    /// Authenticated user id, used by the permission filter and tool context.
    pub user_id: Option<String>,
}

impl RunnableConfig {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            checkpoint_id: None,
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_checkpoint_id(mut self, checkpoint_id: impl Into<String>) -> Self {
        self.checkpoint_id = Some(checkpoint_id.into());
        self
    }
}
