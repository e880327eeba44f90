//! [`ArtifactStore`] — content-addressed blob storage with an indexed
//! metadata table.

use crate::error::ArtifactError;
use chrono::{DateTime, Utc};
use orc_core::{ArtifactId, ArtifactRecord};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A retrieved artifact: its metadata row plus its blob bytes.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// The metadata row.
    pub metadata: ArtifactRecord,
    /// The blob's raw content.
    pub content: Vec<u8>,
}

/// Content-addressed artifact store.
///
/// Backed by a SQLite metadata table (`artifacts`) with indexes on
/// `content_hash`, `tags`, and `created_at`, and a directory of blobs
/// addressed by `blobs/<date>/<hash prefix>/<hash prefix>/<hash>`.
/// Writing identical content twice creates at most one blob file, but
/// may create multiple metadata rows (distinct title/tags/author).
///
/// Every write runs in a SQLite transaction serialized through an
/// internal async mutex, matching SQLite's single-writer model; SQLite's
/// WAL journal mode lets readers proceed concurrently with that writer.
pub struct ArtifactStore {
    db_path: PathBuf,
    artifacts_root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl ArtifactStore {
    /// Open (creating if absent) the artifact store rooted at the given
    /// workspace, running schema migrations idempotently.
    pub async fn open(workspace: &orc_workspace::Workspace) -> Result<Self, ArtifactError> {
        workspace.ensure_layout()?;
        let db_path = workspace.artifacts_db_path();
        let artifacts_root = workspace
            .blobs_root()
            .parent()
            .expect("blobs_root has a parent")
            .to_path_buf();

        let db_path_for_init = db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), ArtifactError> {
            let conn = open_connection(&db_path_for_init)?;
            init_schema(&conn)?;
            Ok(())
        })
        .await??;

        Ok(Self {
            db_path,
            artifacts_root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn blob_rel_path(hash: &str, created_at: DateTime<Utc>) -> String {
        format!(
            "blobs/{}/{}/{}/{}",
            created_at.format("%Y/%m/%d"),
            &hash[0..2],
            &hash[2..4],
            hash,
        )
    }

    /// Hash, write the blob if absent, and insert a metadata row.
    /// Returns the new row's id.
    pub async fn save(
        &self,
        content: impl Into<Vec<u8>>,
        title: impl Into<String>,
        author: impl Into<String>,
        group: impl Into<String>,
        tags: Vec<String>,
        mime: Option<String>,
    ) -> Result<ArtifactId, ArtifactError> {
        let content = content.into();
        let title = title.into();
        let author = author.into();
        let group = group.into();
        let now = Utc::now();

        let mut hasher = Sha256::new();
        hasher.update(&content);
        let hash = hex::encode(hasher.finalize());

        let rel_path = Self::blob_rel_path(&hash, now);
        let abs_path = self.artifacts_root.join(&rel_path);
        let size = content.len() as u64;

        if tokio::fs::metadata(&abs_path).await.is_err() {
            if let Some(parent) = abs_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&abs_path, &content).await?;
        }

        let _guard = self.write_lock.lock().await;
        let db_path = self.db_path.clone();
        let tags_json = serde_json::to_string(&tags).unwrap_or_else(|_| "[]".into());

        let id = tokio::task::spawn_blocking(move || -> Result<i64, ArtifactError> {
            let mut conn = open_connection(&db_path)?;
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO artifacts (content_hash, group_id, title, tags, author, created_at, path, size, mime)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![hash, group, title, tags_json, author, now.to_rfc3339(), rel_path, size as i64, mime],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(id)
        })
        .await??;

        tracing::debug!(id, hash = %hash, "artifact saved");
        Ok(ArtifactId(id))
    }

    /// Fetch one artifact's metadata and content. Returns `None` if the
    /// row or the blob file is missing.
    pub async fn get(&self, id: ArtifactId) -> Result<Option<Artifact>, ArtifactError> {
        let db_path = self.db_path.clone();
        let record = tokio::task::spawn_blocking(move || -> Result<Option<ArtifactRecord>, ArtifactError> {
            let conn = open_connection(&db_path)?;
            fetch_record(&conn, id.0)
        })
        .await??;

        let Some(record) = record else {
            return Ok(None);
        };

        let abs_path = self.artifacts_root.join(&record.path);
        match tokio::fs::read(&abs_path).await {
            Ok(content) => Ok(Some(Artifact { metadata: record, content })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List metadata rows, optionally filtered by group and/or tag.
    /// Tag matching is a JSON-substring match on the serialized array.
    pub async fn list(
        &self,
        group: Option<String>,
        tag: Option<String>,
    ) -> Result<Vec<ArtifactRecord>, ArtifactError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<ArtifactRecord>, ArtifactError> {
            let conn = open_connection(&db_path)?;
            let mut sql = String::from("SELECT id, content_hash, group_id, title, tags, author, created_at, path, size, mime FROM artifacts WHERE 1=1");
            let mut bind: Vec<String> = Vec::new();
            if let Some(g) = &group {
                sql.push_str(" AND group_id = ?");
                bind.push(g.clone());
            }
            if let Some(t) = &tag {
                sql.push_str(" AND tags LIKE ?");
                bind.push(format!("%\"{t}\"%"));
            }
            sql.push_str(" ORDER BY created_at DESC");

            let mut stmt = conn.prepare(&sql)?;
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                bind.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
            let rows = stmt.query_map(params_refs.as_slice(), row_to_record)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await?
    }

    /// Delete one metadata row. Never touches the blob file — orphaned
    /// blobs are reclaimed by [`crate::gc::GarbageCollector`].
    pub async fn delete(&self, id: ArtifactId) -> Result<(), ArtifactError> {
        let _guard = self.write_lock.lock().await;
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), ArtifactError> {
            let conn = open_connection(&db_path)?;
            conn.execute("DELETE FROM artifacts WHERE id = ?1", params![id.0])?;
            Ok(())
        })
        .await?
    }

    /// The artifacts root directory (parent of `blobs/`), used by GC.
    pub(crate) fn artifacts_root(&self) -> &Path {
        &self.artifacts_root
    }

    pub(crate) fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub(crate) fn write_lock(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.write_lock)
    }
}

pub(crate) fn open_connection(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS artifacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content_hash TEXT NOT NULL,
            group_id TEXT NOT NULL,
            title TEXT NOT NULL,
            tags TEXT NOT NULL,
            author TEXT NOT NULL,
            created_at TEXT NOT NULL,
            path TEXT NOT NULL,
            size INTEGER NOT NULL,
            mime TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_artifacts_content_hash ON artifacts(content_hash);
        CREATE INDEX IF NOT EXISTS idx_artifacts_tags ON artifacts(tags);
        CREATE INDEX IF NOT EXISTS idx_artifacts_created_at ON artifacts(created_at);",
    )
}

pub(crate) fn fetch_record(
    conn: &Connection,
    id: i64,
) -> Result<Option<ArtifactRecord>, ArtifactError> {
    conn.query_row(
        "SELECT id, content_hash, group_id, title, tags, author, created_at, path, size, mime
         FROM artifacts WHERE id = ?1",
        params![id],
        row_to_record,
    )
    .optional()
    .map_err(ArtifactError::from)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArtifactRecord> {
    let tags_json: String = row.get(4)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
    let created_at_str: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(ArtifactRecord {
        id: ArtifactId(row.get(0)?),
        content_hash: row.get(1)?,
        group_id: row.get(2)?,
        title: row.get(3)?,
        tags,
        author: row.get(5)?,
        created_at,
        path: row.get(7)?,
        size: row.get::<_, i64>(8)? as u64,
        mime: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_workspace::Workspace;
    use tempfile::TempDir;

    async fn store() -> (TempDir, ArtifactStore) {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path()).unwrap();
        let store = ArtifactStore::open(&ws).await.unwrap();
        (tmp, store)
    }

    #[tokio::test]
    async fn save_and_get_roundtrip() {
        let (_tmp, store) = store().await;
        let id = store
            .save("hello", "greeting", "alice", "g1", vec!["user".into()], None)
            .await
            .unwrap();
        let artifact = store.get(id).await.unwrap().unwrap();
        assert_eq!(artifact.content, b"hello");
        assert_eq!(artifact.metadata.title, "greeting");
    }

    #[tokio::test]
    async fn get_missing_id_returns_none() {
        let (_tmp, store) = store().await;
        assert!(store.get(ArtifactId(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dedup_writes_one_blob_two_rows() {
        let (_tmp, store) = store().await;
        let id1 = store
            .save("hello", "t1", "a", "g", vec!["sys:ephemeral".into()], None)
            .await
            .unwrap();
        let id2 = store
            .save("hello", "t2", "a", "g", vec!["user".into()], None)
            .await
            .unwrap();
        assert_ne!(id1, id2);

        let a1 = store.get(id1).await.unwrap().unwrap();
        let a2 = store.get(id2).await.unwrap().unwrap();
        assert_eq!(a1.metadata.path, a2.metadata.path);
        assert_eq!(a1.metadata.content_hash, a2.metadata.content_hash);
    }

    #[tokio::test]
    async fn list_filters_by_group_and_tag() {
        let (_tmp, store) = store().await;
        store.save("a", "a", "u", "g1", vec!["x".into()], None).await.unwrap();
        store.save("b", "b", "u", "g2", vec!["y".into()], None).await.unwrap();

        let g1 = store.list(Some("g1".into()), None).await.unwrap();
        assert_eq!(g1.len(), 1);
        assert_eq!(g1[0].group_id, "g1");

        let tagged = store.list(None, Some("y".into())).await.unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].group_id, "g2");
    }

    #[tokio::test]
    async fn delete_removes_row_not_blob() {
        let (_tmp, store) = store().await;
        let id = store.save("hello", "t", "a", "g", vec![], None).await.unwrap();
        let blob_path = store.artifacts_root.join(&store.get(id).await.unwrap().unwrap().metadata.path);
        store.delete(id).await.unwrap();
        assert!(store.get(id).await.unwrap().is_none());
        assert!(blob_path.exists());
    }
}
