//! Checkpoint records: one saved state per node transition, keyed by thread id.

use chrono::{DateTime, Utc};

/// Why a checkpoint was written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckpointSource {
    /// The initial state passed into a run.
    Input,
    /// Written after a node completed during normal execution.
    Loop,
}

/// A full snapshot of state `S` after one node transition.
#[derive(Clone, Debug)]
pub struct Checkpoint<S> {
    pub id: String,
    pub state: S,
    pub created_at: DateTime<Utc>,
    pub source: CheckpointSource,
    /// Which node produced this checkpoint, for diagnostics.
    pub node_id: String,
    /// Monotonic step counter within the run, starting at 0 for the input checkpoint.
    pub step: i64,
}

impl<S> Checkpoint<S> {
    pub fn new(id: impl Into<String>, state: S, source: CheckpointSource, node_id: impl Into<String>, step: i64) -> Self {
        Self {
            id: id.into(),
            state,
            created_at: Utc::now(),
            source,
            node_id: node_id.into(),
            step,
        }
    }
}

/// Metadata returned alongside a checkpoint by [`crate::memory::Checkpointer::get_tuple`].
#[derive(Clone, Debug)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    pub step: i64,
}

/// A lightweight checkpoint summary returned by [`crate::memory::Checkpointer::list`],
/// without the full state payload.
#[derive(Clone, Debug)]
pub struct CheckpointListItem {
    pub checkpoint_id: String,
    pub created_at: DateTime<Utc>,
    pub step: i64,
}
