//! Shared SQLite connection setup for the state database.

use crate::error::StateError;
use rusqlite::Connection;
use std::path::Path;

pub(crate) fn open_connection(path: &Path) -> Result<Connection, StateError> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

pub(crate) fn init_schema(conn: &Connection) -> Result<(), StateError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            queue       TEXT NOT NULL,
            payload     TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'pending',
            attempts    INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL,
            claimed_by  TEXT,
            claimed_at  TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_tasks_queue_status ON tasks(queue, status, id);

        CREATE TABLE IF NOT EXISTS heartbeats (
            agent_id    TEXT PRIMARY KEY,
            status      TEXT NOT NULL,
            message     TEXT,
            last_seen   TEXT NOT NULL
        );",
    )?;
    Ok(())
}
