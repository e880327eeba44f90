//! [`GarbageCollector`] — two-phase pruning under a process-exclusive
//! file lock.

use crate::error::GcError;
use crate::store::{open_connection, ArtifactStore};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use fs2::FileExt;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Tunables for [`GarbageCollector`]. Defaults match the design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GcConfig {
    /// Ephemeral metadata rows older than this many days are pruned in
    /// phase 1.
    pub retention_days: i64,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self { retention_days: 3 }
    }
}

/// Outcome of one [`GarbageCollector::run_once`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcReport {
    /// The lock could not be acquired; no work was done.
    pub skipped: bool,
    /// Ephemeral metadata rows deleted in phase 1.
    pub phase1_deleted: u64,
    /// Orphan blob files deleted in phase 2.
    pub phase2_deleted: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct GcState {
    last_run: DateTime<Utc>,
}

/// Two-phase garbage collector over an [`ArtifactStore`]'s metadata and
/// blobs, serialized against concurrent invocations (in this process or
/// any other) by a non-blocking exclusive file lock.
pub struct GarbageCollector {
    store: Arc<ArtifactStore>,
    blobs_root: PathBuf,
    archive_root: PathBuf,
    lock_path: PathBuf,
    state_path: PathBuf,
    config: GcConfig,
}

impl GarbageCollector {
    /// Build a collector over `store`, using the workspace's fixed
    /// lock/state/archive paths.
    pub fn new(store: Arc<ArtifactStore>, workspace: &orc_workspace::Workspace, config: GcConfig) -> Self {
        Self {
            blobs_root: workspace.blobs_root(),
            archive_root: workspace.archive_root(),
            lock_path: workspace.gc_lock_path(),
            state_path: workspace.gc_state_path(),
            store,
            config,
        }
    }

    /// Whether at least `hours` have elapsed since the last recorded
    /// run (or no run has ever been recorded).
    pub async fn should_run(&self, hours: u64) -> bool {
        let state_path = self.state_path.clone();
        tokio::task::spawn_blocking(move || {
            let Ok(raw) = std::fs::read_to_string(&state_path) else {
                return true;
            };
            let Ok(state) = serde_json::from_str::<GcState>(&raw) else {
                return true;
            };
            Utc::now() - state.last_run >= ChronoDuration::hours(hours as i64)
        })
        .await
        .unwrap_or(true)
    }

    fn record_run(&self) -> Result<(), GcError> {
        if let Some(parent) = self.state_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let state = GcState { last_run: Utc::now() };
        std::fs::write(&self.state_path, serde_json::to_vec(&state).unwrap())?;
        Ok(())
    }

    /// Run one GC pass under the exclusive lock. If the lock cannot be
    /// acquired (another process or task holds it), returns
    /// `{skipped: true}` without error. `skip_phase2` disables the
    /// (comparatively expensive) orphan blob scan.
    pub async fn run_once(&self, skip_phase2: bool) -> Result<GcReport, GcError> {
        let lock_path = self.lock_path.clone();
        let db_path = self.store.db_path().to_path_buf();
        let artifacts_root = self.store.artifacts_root().to_path_buf();
        let blobs_root = self.blobs_root.clone();
        let retention_days = self.config.retention_days;
        let _write_guard = Arc::clone(&self.store.write_lock()).lock_owned().await;

        let report = tokio::task::spawn_blocking(move || -> Result<GcReport, GcError> {
            if let Some(parent) = lock_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let lock_file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .open(&lock_path)?;
            if lock_file.try_lock_exclusive().is_err() {
                return Ok(GcReport { skipped: true, ..Default::default() });
            }

            let conn = open_connection(&db_path)?;
            let cutoff = (Utc::now() - ChronoDuration::days(retention_days)).to_rfc3339();
            let phase1_deleted = conn.execute(
                "DELETE FROM artifacts WHERE tags LIKE '%\"sys:ephemeral\"%' AND created_at < ?1",
                params![cutoff],
            )? as u64;

            let phase2_deleted = if skip_phase2 {
                0
            } else {
                let mut stmt = conn.prepare("SELECT DISTINCT content_hash FROM artifacts")?;
                let referenced: HashSet<String> = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .filter_map(Result::ok)
                    .collect();
                prune_orphans(&artifacts_root, &blobs_root, &referenced)?
            };

            lock_file.unlock().ok();
            Ok(GcReport { skipped: false, phase1_deleted, phase2_deleted })
        })
        .await??;

        if !report.skipped {
            self.record_run()?;
        }
        tracing::info!(?report, "garbage collection pass complete");
        Ok(report)
    }

    /// Move non-ephemeral blobs whose row is older than `days` into
    /// `archive/YYYY-MM-DD/<id>_<safe-title>_<hash8>.blob`, tagging the
    /// row `sys:archived`. Returns the number of rows archived.
    pub async fn archive_by_date(&self, days: i64) -> Result<u64, GcError> {
        let db_path = self.store.db_path().to_path_buf();
        let artifacts_root = self.store.artifacts_root().to_path_buf();
        let archive_root = self.archive_root.clone();
        let _write_guard = Arc::clone(&self.store.write_lock()).lock_owned().await;

        tokio::task::spawn_blocking(move || -> Result<u64, GcError> {
            let conn = open_connection(&db_path)?;
            let cutoff = (Utc::now() - ChronoDuration::days(days)).to_rfc3339();

            let mut stmt = conn.prepare(
                "SELECT id, content_hash, title, tags, created_at, path FROM artifacts
                 WHERE created_at < ?1 AND tags NOT LIKE '%\"sys:ephemeral\"%'",
            )?;
            let rows: Vec<(i64, String, String, String, String, String)> = stmt
                .query_map(params![cutoff], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                })?
                .filter_map(Result::ok)
                .collect();

            let mut archived = 0u64;
            for (id, hash, title, tags_json, created_at, rel_path) in rows {
                let created: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_at)
                    .map(|d| d.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());
                let dest_dir = archive_root.join(created.format("%Y-%m-%d").to_string());
                std::fs::create_dir_all(&dest_dir)?;
                let safe_title = safe_filename(&title);
                let hash8 = &hash[..hash.len().min(8)];
                let dest = dest_dir.join(format!("{id}_{safe_title}_{hash8}.blob"));

                let src = artifacts_root.join(&rel_path);
                match std::fs::rename(&src, &dest) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        // Already moved by an earlier row sharing this blob.
                    }
                    Err(e) => return Err(e.into()),
                }

                let mut tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
                if !tags.iter().any(|t| t == "sys:archived") {
                    tags.push("sys:archived".into());
                }
                conn.execute(
                    "UPDATE artifacts SET tags = ?1 WHERE id = ?2",
                    params![serde_json::to_string(&tags).unwrap(), id],
                )?;
                archived += 1;
            }
            Ok(archived)
        })
        .await?
    }
}

fn safe_filename(title: &str) -> String {
    let mut out: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    out.truncate(64);
    if out.is_empty() {
        out.push_str("untitled");
    }
    out
}

/// Walk every file under `blobs_root`; delete any whose filename (the
/// content hash) is not in `referenced`.
fn prune_orphans(_artifacts_root: &Path, blobs_root: &Path, referenced: &HashSet<String>) -> Result<u64, GcError> {
    let mut deleted = 0u64;
    let mut stack = vec![blobs_root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !referenced.contains(name) {
                    std::fs::remove_file(&path)?;
                    deleted += 1;
                }
            }
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_workspace::Workspace;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Arc<ArtifactStore>, GarbageCollector) {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path()).unwrap();
        let store = Arc::new(ArtifactStore::open(&ws).await.unwrap());
        let gc = GarbageCollector::new(Arc::clone(&store), &ws, GcConfig { retention_days: 0 });
        (tmp, store, gc)
    }

    #[tokio::test]
    async fn dedup_gc_scenario_from_spec() {
        let (_tmp, store, gc) = setup().await;
        let ephemeral_id = store
            .save("hello", "t1", "a", "g", vec!["sys:ephemeral".into()], None)
            .await
            .unwrap();
        let user_id = store
            .save("hello", "t2", "a", "g", vec!["user".into()], None)
            .await
            .unwrap();

        // Phase 1 with retention_days=0 deletes exactly the ephemeral row.
        let report = gc.run_once(true).await.unwrap();
        assert!(!report.skipped);
        assert_eq!(report.phase1_deleted, 1);
        assert!(store.get(ephemeral_id).await.unwrap().is_none());
        assert!(store.get(user_id).await.unwrap().is_some());

        // Phase 2: the blob is still referenced by the remaining row.
        let report = gc.run_once(false).await.unwrap();
        assert_eq!(report.phase2_deleted, 0);

        // Delete the remaining row; now phase 2 reclaims the orphan blob.
        store.delete(user_id).await.unwrap();
        let report = gc.run_once(false).await.unwrap();
        assert_eq!(report.phase2_deleted, 1);
    }

    #[tokio::test]
    async fn should_run_true_when_never_run() {
        let (_tmp, _store, gc) = setup().await;
        assert!(gc.should_run(1).await);
    }

    #[tokio::test]
    async fn should_run_false_immediately_after_run() {
        let (_tmp, _store, gc) = setup().await;
        gc.run_once(true).await.unwrap();
        assert!(!gc.should_run(24).await);
    }

    #[tokio::test]
    async fn archive_by_date_moves_blob_and_tags_row() {
        let (_tmp, store, gc) = setup().await;
        let id = store
            .save("hello", "old report", "a", "g", vec!["user".into()], None)
            .await
            .unwrap();
        let archived = gc.archive_by_date(0).await.unwrap();
        assert_eq!(archived, 1);

        let record = store.list(None, Some("sys:archived".into())).await.unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record[0].id, id);
    }
}
