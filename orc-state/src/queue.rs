//! Task queue: durable FIFO-per-queue work items for a queue-worker
//! deployment mode, backed by the same SQLite-single-writer discipline
//! as [`orc_artifacts::ArtifactStore`].

use crate::db::{init_schema, open_connection};
use crate::error::StateError;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A claimed or pending unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Auto-assigned task id.
    pub id: i64,
    /// The named queue this task belongs to.
    pub queue: String,
    /// Opaque JSON payload the worker interprets.
    pub payload: serde_json::Value,
    /// Number of times this task has been claimed and failed.
    pub attempts: u32,
    /// When the task was first enqueued.
    pub created_at: DateTime<Utc>,
}

/// Durable task queue over a SQLite `tasks` table.
///
/// One row per task; `claim` atomically selects and marks the oldest
/// pending row in a queue as claimed, so concurrent workers never
/// double-claim the same task. Writes are serialized through an
/// internal async mutex matching SQLite's single-writer model.
pub struct TaskQueue {
    db_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl TaskQueue {
    /// Open (creating if absent) the state database rooted at the
    /// given workspace, running schema migrations idempotently.
    pub async fn open(workspace: &orc_workspace::Workspace) -> Result<Self, StateError> {
        workspace.ensure_layout()?;
        let db_path = workspace.state_db_path();
        let init_path = db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StateError> {
            let conn = open_connection(&init_path)?;
            init_schema(&conn)?;
            Ok(())
        })
        .await??;

        Ok(Self {
            db_path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Append a new pending task to `queue`, returning its id.
    pub async fn enqueue(&self, queue: &str, payload: serde_json::Value) -> Result<i64, StateError> {
        let db_path = self.db_path.clone();
        let queue = queue.to_string();
        let _guard = self.write_lock.lock().await;

        tokio::task::spawn_blocking(move || -> Result<i64, StateError> {
            let conn = open_connection(&db_path)?;
            conn.execute(
                "INSERT INTO tasks (queue, payload, status, created_at) VALUES (?1, ?2, 'pending', ?3)",
                params![queue, payload.to_string(), Utc::now().to_rfc3339()],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await?
    }

    /// Atomically claim the oldest pending task in `queue` for
    /// `worker_id`, marking it `claimed`. Returns `None` if the queue
    /// has no pending work.
    pub async fn claim(&self, queue: &str, worker_id: &str) -> Result<Option<Task>, StateError> {
        let db_path = self.db_path.clone();
        let queue = queue.to_string();
        let worker_id = worker_id.to_string();
        let _guard = self.write_lock.lock().await;

        tokio::task::spawn_blocking(move || -> Result<Option<Task>, StateError> {
            let mut conn = open_connection(&db_path)?;
            let tx = conn.transaction()?;

            let claimed: Option<(i64, String, u32, String)> = tx
                .query_row(
                    "SELECT id, payload, attempts, created_at FROM tasks
                     WHERE queue = ?1 AND status = 'pending'
                     ORDER BY id LIMIT 1",
                    params![queue],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .optional()?;

            let Some((id, payload, attempts, created_at)) = claimed else {
                return Ok(None);
            };

            tx.execute(
                "UPDATE tasks SET status = 'claimed', claimed_by = ?1, claimed_at = ?2 WHERE id = ?3",
                params![worker_id, Utc::now().to_rfc3339(), id],
            )?;
            tx.commit()?;

            Ok(Some(Task {
                id,
                queue,
                payload: serde_json::from_str(&payload).unwrap_or(serde_json::Value::Null),
                attempts,
                created_at: created_at.parse().unwrap_or_else(|_| Utc::now()),
            }))
        })
        .await?
    }

    /// Mark a claimed task done, removing it from the table.
    pub async fn complete(&self, task_id: i64) -> Result<(), StateError> {
        let db_path = self.db_path.clone();
        let _guard = self.write_lock.lock().await;

        tokio::task::spawn_blocking(move || -> Result<(), StateError> {
            let conn = open_connection(&db_path)?;
            let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            if rows == 0 {
                return Err(StateError::TaskNotFound(task_id));
            }
            Ok(())
        })
        .await?
    }

    /// Report a claimed task's failure. Below `max_attempts`, the task
    /// is requeued as pending with `attempts` incremented; at or above
    /// it, the task is marked `dead` and left in the table for
    /// inspection rather than retried again.
    pub async fn fail(&self, task_id: i64, max_attempts: u32) -> Result<(), StateError> {
        let db_path = self.db_path.clone();
        let _guard = self.write_lock.lock().await;

        tokio::task::spawn_blocking(move || -> Result<(), StateError> {
            let conn = open_connection(&db_path)?;
            let attempts: u32 = conn
                .query_row("SELECT attempts FROM tasks WHERE id = ?1", params![task_id], |row| row.get(0))
                .optional()?
                .ok_or(StateError::TaskNotFound(task_id))?;

            let next_attempts = attempts + 1;
            if next_attempts >= max_attempts {
                conn.execute(
                    "UPDATE tasks SET status = 'dead', attempts = ?1 WHERE id = ?2",
                    params![next_attempts, task_id],
                )?;
            } else {
                conn.execute(
                    "UPDATE tasks SET status = 'pending', attempts = ?1, claimed_by = NULL, claimed_at = NULL WHERE id = ?2",
                    params![next_attempts, task_id],
                )?;
            }
            Ok(())
        })
        .await?
    }

    /// Count pending tasks in `queue` (for monitoring / backpressure).
    pub async fn pending_count(&self, queue: &str) -> Result<u64, StateError> {
        let db_path = self.db_path.clone();
        let queue = queue.to_string();

        tokio::task::spawn_blocking(move || -> Result<u64, StateError> {
            let conn = open_connection(&db_path)?;
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tasks WHERE queue = ?1 AND status = 'pending'",
                params![queue],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_workspace::Workspace;
    use tempfile::TempDir;

    async fn queue() -> (TempDir, TaskQueue) {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path()).unwrap();
        let q = TaskQueue::open(&ws).await.unwrap();
        (tmp, q)
    }

    #[tokio::test]
    async fn enqueue_and_claim_is_fifo() {
        let (_tmp, q) = queue().await;
        q.enqueue("jobs", serde_json::json!({"n": 1})).await.unwrap();
        q.enqueue("jobs", serde_json::json!({"n": 2})).await.unwrap();

        let first = q.claim("jobs", "worker-a").await.unwrap().unwrap();
        assert_eq!(first.payload, serde_json::json!({"n": 1}));

        let second = q.claim("jobs", "worker-a").await.unwrap().unwrap();
        assert_eq!(second.payload, serde_json::json!({"n": 2}));

        assert!(q.claim("jobs", "worker-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn claimed_task_is_not_claimed_twice() {
        let (_tmp, q) = queue().await;
        q.enqueue("jobs", serde_json::json!(1)).await.unwrap();
        let claimed = q.claim("jobs", "a").await.unwrap();
        assert!(claimed.is_some());
        assert!(q.claim("jobs", "b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn complete_removes_the_task() {
        let (_tmp, q) = queue().await;
        let id = q.enqueue("jobs", serde_json::json!(1)).await.unwrap();
        q.claim("jobs", "a").await.unwrap();
        q.complete(id).await.unwrap();
        assert_eq!(q.pending_count("jobs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn fail_requeues_until_max_attempts_then_goes_dead() {
        let (_tmp, q) = queue().await;
        let id = q.enqueue("jobs", serde_json::json!(1)).await.unwrap();

        q.claim("jobs", "a").await.unwrap();
        q.fail(id, 2).await.unwrap();
        // Requeued: claimable again.
        let retried = q.claim("jobs", "b").await.unwrap();
        assert!(retried.is_some());
        assert_eq!(retried.unwrap().attempts, 1);

        q.fail(id, 2).await.unwrap();
        // Attempts now at max: no longer pending, not claimable.
        assert!(q.claim("jobs", "c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn complete_on_unknown_task_errors() {
        let (_tmp, q) = queue().await;
        let err = q.complete(9999).await.unwrap_err();
        assert!(matches!(err, StateError::TaskNotFound(9999)));
    }
}
