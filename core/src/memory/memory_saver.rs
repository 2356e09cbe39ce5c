//! In-memory [`Checkpointer`]: keeps checkpoints in a process-local map.
//!
//! Used by default and in tests; state is lost when the process exits. For
//! durable storage across restarts use [`crate::memory::sqlite_saver::SqliteSaver`].

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata};
use crate::memory::checkpointer::{CheckpointError, Checkpointer};
use crate::memory::config::RunnableConfig;

/// Checkpoints for one thread, newest last.
struct ThreadHistory<S> {
    checkpoints: Vec<Checkpoint<S>>,
}

/// Default [`Checkpointer`]: an in-process `RwLock<HashMap<thread_id, Vec<Checkpoint<S>>>>`.
pub struct MemorySaver<S> {
    threads: RwLock<HashMap<String, ThreadHistory<S>>>,
}

impl<S> Default for MemorySaver<S> {
    fn default() -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
        }
    }
}

impl<S> MemorySaver<S> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let thread_id = config
            .thread_id
            .clone()
            .ok_or(CheckpointError::ThreadIdRequired)?;
        let mut threads = self
            .threads
            .write()
            .map_err(|_| CheckpointError::Storage("lock poisoned".into()))?;
        threads
            .entry(thread_id)
            .or_insert_with(|| ThreadHistory { checkpoints: Vec::new() })
            .checkpoints
            .push(checkpoint.clone());
        Ok(checkpoint.id.clone())
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError> {
        let thread_id = config
            .thread_id
            .clone()
            .ok_or(CheckpointError::ThreadIdRequired)?;
        let threads = self
            .threads
            .read()
            .map_err(|_| CheckpointError::Storage("lock poisoned".into()))?;
        let Some(history) = threads.get(&thread_id) else {
            return Ok(None);
        };
        let found = match &config.checkpoint_id {
            Some(id) => history.checkpoints.iter().find(|c| &c.id == id),
            None => history.checkpoints.last(),
        };
        Ok(found.map(|c| {
            (
                c.clone(),
                CheckpointMetadata {
                    source: c.source,
                    step: c.step,
                },
            )
        }))
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let thread_id = config
            .thread_id
            .clone()
            .ok_or(CheckpointError::ThreadIdRequired)?;
        let threads = self
            .threads
            .read()
            .map_err(|_| CheckpointError::Storage("lock poisoned".into()))?;
        let Some(history) = threads.get(&thread_id) else {
            return Ok(Vec::new());
        };

        let before_step = before
            .and_then(|id| history.checkpoints.iter().find(|c| c.id == id))
            .map(|c| c.step);
        let after_step = after
            .and_then(|id| history.checkpoints.iter().find(|c| c.id == id))
            .map(|c| c.step);

        let mut items: Vec<CheckpointListItem> = history
            .checkpoints
            .iter()
            .rev()
            .filter(|c| before_step.map(|s| c.step < s).unwrap_or(true))
            .filter(|c| after_step.map(|s| c.step > s).unwrap_or(true))
            .map(|c| CheckpointListItem {
                checkpoint_id: c.id.clone(),
                created_at: c.created_at,
                step: c.step,
            })
            .collect();

        if let Some(limit) = limit {
            items.truncate(limit);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::checkpoint::CheckpointSource;

    fn cp(id: &str, step: i64) -> Checkpoint<i32> {
        Checkpoint::new(id, step as i32, CheckpointSource::Loop, "n", step)
    }

    #[tokio::test]
    async fn put_requires_thread_id() {
        let saver: MemorySaver<i32> = MemorySaver::new();
        let err = saver.put(&RunnableConfig::default(), &cp("a", 0)).await.unwrap_err();
        assert!(matches!(err, CheckpointError::ThreadIdRequired));
    }

    #[tokio::test]
    async fn get_tuple_returns_latest_by_default() {
        let saver: MemorySaver<i32> = MemorySaver::new();
        let config = RunnableConfig::new("t1");
        saver.put(&config, &cp("a", 0)).await.unwrap();
        saver.put(&config, &cp("b", 1)).await.unwrap();
        let (checkpoint, meta) = saver.get_tuple(&config).await.unwrap().unwrap();
        assert_eq!(checkpoint.id, "b");
        assert_eq!(meta.step, 1);
    }

    #[tokio::test]
    async fn get_tuple_honors_pinned_checkpoint_id() {
        let saver: MemorySaver<i32> = MemorySaver::new();
        let config = RunnableConfig::new("t1");
        saver.put(&config, &cp("a", 0)).await.unwrap();
        saver.put(&config, &cp("b", 1)).await.unwrap();
        let pinned = config.clone().with_checkpoint_id("a");
        let (checkpoint, _) = saver.get_tuple(&pinned).await.unwrap().unwrap();
        assert_eq!(checkpoint.id, "a");
    }

    #[tokio::test]
    async fn list_respects_limit_and_order() {
        let saver: MemorySaver<i32> = MemorySaver::new();
        let config = RunnableConfig::new("t1");
        for i in 0..5 {
            saver.put(&config, &cp(&format!("c{i}"), i)).await.unwrap();
        }
        let items = saver.list(&config, Some(2), None, None).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].checkpoint_id, "c4");
        assert_eq!(items[1].checkpoint_id, "c3");
    }

    #[tokio::test]
    async fn unknown_thread_returns_empty() {
        let saver: MemorySaver<i32> = MemorySaver::new();
        let config = RunnableConfig::new("missing");
        assert!(saver.get_tuple(&config).await.unwrap().is_none());
        assert!(saver.list(&config, None, None, None).await.unwrap().is_empty());
    }
}
