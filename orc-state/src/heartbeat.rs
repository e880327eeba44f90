//! Agent heartbeats: last-seen liveness records for a queue-worker
//! deployment's pool of agent processes.

use crate::db::open_connection;
use crate::error::StateError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rusqlite::params;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A recorded heartbeat for one agent process.
#[derive(Debug, Clone, PartialEq)]
pub struct Heartbeat {
    /// The agent's node id, as attributed on events and tool calls.
    pub agent_id: String,
    /// Free-form status the agent last reported (e.g. `"idle"`, `"busy"`).
    pub status: String,
    /// Optional human-readable detail.
    pub message: Option<String>,
    /// When this heartbeat was recorded.
    pub last_seen: DateTime<Utc>,
}

/// Heartbeat tracker over the same state database as [`crate::TaskQueue`].
///
/// One row per agent, upserted on every call; staleness is a read-time
/// computation against `last_seen`, not a background sweep.
pub struct HeartbeatTracker {
    db_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl HeartbeatTracker {
    /// Open the tracker over the workspace's shared state database.
    pub async fn open(workspace: &orc_workspace::Workspace) -> Result<Self, StateError> {
        workspace.ensure_layout()?;
        let db_path = workspace.state_db_path();
        let init_path = db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StateError> {
            let conn = open_connection(&init_path)?;
            crate::db::init_schema(&conn)?;
            Ok(())
        })
        .await??;

        Ok(Self {
            db_path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Record (upsert) a heartbeat for `agent_id`.
    pub async fn beat(&self, agent_id: &str, status: &str, message: Option<&str>) -> Result<(), StateError> {
        let db_path = self.db_path.clone();
        let agent_id = agent_id.to_string();
        let status = status.to_string();
        let message = message.map(str::to_string);
        let _guard = self.write_lock.lock().await;

        tokio::task::spawn_blocking(move || -> Result<(), StateError> {
            let conn = open_connection(&db_path)?;
            conn.execute(
                "INSERT INTO heartbeats (agent_id, status, message, last_seen) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(agent_id) DO UPDATE SET status = excluded.status, message = excluded.message, last_seen = excluded.last_seen",
                params![agent_id, status, message, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .await?
    }

    /// Fetch the single most recent heartbeat for `agent_id`, if any.
    pub async fn get(&self, agent_id: &str) -> Result<Option<Heartbeat>, StateError> {
        let db_path = self.db_path.clone();
        let agent_id = agent_id.to_string();

        tokio::task::spawn_blocking(move || -> Result<Option<Heartbeat>, StateError> {
            let conn = open_connection(&db_path)?;
            let row = conn
                .query_row(
                    "SELECT agent_id, status, message, last_seen FROM heartbeats WHERE agent_id = ?1",
                    params![agent_id],
                    row_to_heartbeat,
                )
                .map(Some)
                .or_else(|e| if e == rusqlite::Error::QueryReturnedNoRows { Ok(None) } else { Err(e) })?;
            Ok(row)
        })
        .await?
    }

    /// Every agent whose last heartbeat is older than `stale_after_secs`,
    /// for a monitor to flag as down.
    pub async fn stale(&self, stale_after_secs: i64) -> Result<Vec<Heartbeat>, StateError> {
        let db_path = self.db_path.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<Heartbeat>, StateError> {
            let conn = open_connection(&db_path)?;
            let cutoff = (Utc::now() - ChronoDuration::seconds(stale_after_secs)).to_rfc3339();
            let mut stmt = conn.prepare(
                "SELECT agent_id, status, message, last_seen FROM heartbeats WHERE last_seen < ?1",
            )?;
            let rows = stmt
                .query_map(params![cutoff], row_to_heartbeat)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await?
    }
}

fn row_to_heartbeat(row: &rusqlite::Row<'_>) -> rusqlite::Result<Heartbeat> {
    let last_seen: String = row.get(3)?;
    Ok(Heartbeat {
        agent_id: row.get(0)?,
        status: row.get(1)?,
        message: row.get(2)?,
        last_seen: last_seen.parse().unwrap_or_else(|_| Utc::now()),
    })
}
