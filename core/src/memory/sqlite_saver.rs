//! SQLite-backed checkpointer. Persistent across process restarts.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::params;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource};
use crate::memory::checkpointer::{CheckpointError, Checkpointer};
use crate::memory::config::RunnableConfig;
use crate::memory::serializer::Serializer;

fn source_to_str(s: CheckpointSource) -> &'static str {
    match s {
        CheckpointSource::Input => "input",
        CheckpointSource::Loop => "loop",
    }
}

fn str_to_source(s: &str) -> CheckpointSource {
    match s {
        "input" => CheckpointSource::Input,
        _ => CheckpointSource::Loop,
    }
}

fn created_at_to_millis(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

fn millis_to_created_at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}

/// SQLite-backed [`Checkpointer`]. Keyed by (thread_id, checkpoint_id); each row
/// stores one serialized state snapshot. For single-node deployments and local
/// development; swap for a networked store only if the scope grows past that.
pub struct SqliteSaver<S> {
    db_path: std::path::PathBuf,
    serializer: Arc<dyn Serializer<S>>,
}

impl<S> SqliteSaver<S>
where
    S: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    pub fn new(path: impl AsRef<Path>, serializer: Arc<dyn Serializer<S>>) -> Result<Self, CheckpointError> {
        let db_path = path.as_ref().to_path_buf();
        let conn = rusqlite::Connection::open(&db_path).map_err(|e| CheckpointError::Storage(e.to_string()))?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id TEXT NOT NULL,
                checkpoint_id TEXT NOT NULL,
                node_id TEXT NOT NULL,
                step INTEGER NOT NULL,
                source TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                payload BLOB NOT NULL,
                PRIMARY KEY (thread_id, checkpoint_id)
            )
            "#,
            [],
        )
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Ok(Self { db_path, serializer })
    }

    fn thread_id(config: &RunnableConfig) -> Result<String, CheckpointError> {
        config.thread_id.clone().ok_or(CheckpointError::ThreadIdRequired)
    }
}

#[async_trait]
impl<S> Checkpointer<S> for SqliteSaver<S>
where
    S: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn put(&self, config: &RunnableConfig, checkpoint: &Checkpoint<S>) -> Result<String, CheckpointError> {
        let thread_id = Self::thread_id(config)?;
        let payload = self.serializer.serialize(&checkpoint.state)?;
        let id = checkpoint.id.clone();
        let node_id = checkpoint.node_id.clone();
        let step = checkpoint.step;
        let source = source_to_str(checkpoint.source).to_string();
        let created_at = created_at_to_millis(checkpoint.created_at);
        let db_path = self.db_path.clone();

        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(|e| CheckpointError::Storage(e.to_string()))?;
            conn.execute(
                r#"
                INSERT OR REPLACE INTO checkpoints
                (thread_id, checkpoint_id, node_id, step, source, created_at, payload)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![thread_id, id, node_id, step, source, created_at, payload],
            )
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            Ok::<String, CheckpointError>(id)
        })
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))?
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError> {
        let thread_id = Self::thread_id(config)?;
        let want_id = config.checkpoint_id.clone();
        let db_path = self.db_path.clone();

        type Row = (String, String, i64, String, i64, Vec<u8>);
        let row: Option<Row> = tokio::task::spawn_blocking(move || -> Result<Option<Row>, CheckpointError> {
            let conn = rusqlite::Connection::open(&db_path).map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let sql = if want_id.is_some() {
                "SELECT checkpoint_id, node_id, step, source, created_at, payload
                 FROM checkpoints WHERE thread_id = ?1 AND checkpoint_id = ?2"
            } else {
                "SELECT checkpoint_id, node_id, step, source, created_at, payload
                 FROM checkpoints WHERE thread_id = ?1
                 ORDER BY created_at DESC LIMIT 1"
            };
            let mut stmt = conn.prepare(sql).map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let mut rows = if let Some(cid) = &want_id {
                stmt.query(params![thread_id, cid])
            } else {
                stmt.query(params![thread_id])
            }
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let Some(row) = rows.next().map_err(|e| CheckpointError::Storage(e.to_string()))? else {
                return Ok(None);
            };
            Ok(Some((
                row.get(0).map_err(|e| CheckpointError::Storage(e.to_string()))?,
                row.get(1).map_err(|e| CheckpointError::Storage(e.to_string()))?,
                row.get(2).map_err(|e| CheckpointError::Storage(e.to_string()))?,
                row.get(3).map_err(|e| CheckpointError::Storage(e.to_string()))?,
                row.get(4).map_err(|e| CheckpointError::Storage(e.to_string()))?,
                row.get(5).map_err(|e| CheckpointError::Storage(e.to_string()))?,
            )))
        })
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))??;

        let Some((checkpoint_id, node_id, step, source, created_at, payload)) = row else {
            return Ok(None);
        };

        let state = self.serializer.deserialize(&payload)?;
        let source = str_to_source(&source);
        let checkpoint = Checkpoint {
            id: checkpoint_id,
            state,
            created_at: millis_to_created_at(created_at),
            source,
            node_id,
            step,
        };
        let metadata = CheckpointMetadata { source, step };
        Ok(Some((checkpoint, metadata)))
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let thread_id = Self::thread_id(config)?;
        let db_path = self.db_path.clone();
        let before = before.map(String::from);
        let after = after.map(String::from);

        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let mut stmt = conn
                .prepare(
                    "SELECT checkpoint_id, step, created_at FROM checkpoints
                     WHERE thread_id = ?1 ORDER BY created_at ASC",
                )
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let rows = stmt
                .query_map(params![thread_id], |row| {
                    let created_at: i64 = row.get(2)?;
                    Ok(CheckpointListItem {
                        checkpoint_id: row.get(0)?,
                        step: row.get(1)?,
                        created_at: millis_to_created_at(created_at),
                    })
                })
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let mut list: Vec<CheckpointListItem> =
                rows.collect::<Result<Vec<_>, _>>().map_err(|e| CheckpointError::Storage(e.to_string()))?;

            if let Some(a) = &after {
                if let Some(pos) = list.iter().position(|i| &i.checkpoint_id == a) {
                    list = list[pos + 1..].to_vec();
                }
            }
            if let Some(b) = &before {
                if let Some(pos) = list.iter().position(|i| &i.checkpoint_id == b) {
                    list = list[..pos].to_vec();
                }
            }
            if let Some(n) = limit {
                let len = list.len();
                if len > n {
                    list = list[len - n..].to_vec();
                }
            }
            Ok::<Vec<CheckpointListItem>, CheckpointError>(list)
        })
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::serializer::JsonSerializer;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        n: i32,
    }

    fn cp(id: &str, n: i32, step: i64) -> Checkpoint<Sample> {
        Checkpoint::new(id, Sample { n }, CheckpointSource::Loop, "node", step)
    }

    #[tokio::test]
    async fn put_then_get_latest_round_trips() {
        let dir = tempdir().unwrap();
        let saver: SqliteSaver<Sample> =
            SqliteSaver::new(dir.path().join("cp.db"), Arc::new(JsonSerializer)).unwrap();
        let config = RunnableConfig::new("t1");
        saver.put(&config, &cp("a", 1, 0)).await.unwrap();
        saver.put(&config, &cp("b", 2, 1)).await.unwrap();

        let (checkpoint, meta) = saver.get_tuple(&config).await.unwrap().unwrap();
        assert_eq!(checkpoint.id, "b");
        assert_eq!(checkpoint.state, Sample { n: 2 });
        assert_eq!(meta.step, 1);
    }

    #[tokio::test]
    async fn get_tuple_honors_pinned_checkpoint_id() {
        let dir = tempdir().unwrap();
        let saver: SqliteSaver<Sample> =
            SqliteSaver::new(dir.path().join("cp.db"), Arc::new(JsonSerializer)).unwrap();
        let config = RunnableConfig::new("t1");
        saver.put(&config, &cp("a", 1, 0)).await.unwrap();
        saver.put(&config, &cp("b", 2, 1)).await.unwrap();

        let pinned = config.with_checkpoint_id("a");
        let (checkpoint, _) = saver.get_tuple(&pinned).await.unwrap().unwrap();
        assert_eq!(checkpoint.id, "a");
    }

    #[tokio::test]
    async fn list_is_chronological_and_respects_limit() {
        let dir = tempdir().unwrap();
        let saver: SqliteSaver<Sample> =
            SqliteSaver::new(dir.path().join("cp.db"), Arc::new(JsonSerializer)).unwrap();
        let config = RunnableConfig::new("t1");
        for i in 0..3 {
            saver.put(&config, &cp(&format!("c{i}"), i, i as i64)).await.unwrap();
        }
        let items = saver.list(&config, Some(2), None, None).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].checkpoint_id, "c1");
        assert_eq!(items[1].checkpoint_id, "c2");
    }
}
