//! Per-conversation checkpoint persistence.
//!
//! State is saved as a full snapshot after every node transition, keyed by
//! thread id. There is no cross-conversation store: long-term memory beyond
//! a conversation's own checkpoint history is out of scope.

mod checkpoint;
mod checkpointer;
mod config;
mod memory_saver;
mod serializer;
mod sqlite_saver;

pub use checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use memory_saver::MemorySaver;
pub use serializer::{JsonSerializer, Serializer};
pub use sqlite_saver::SqliteSaver;
