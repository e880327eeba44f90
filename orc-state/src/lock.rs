//! Named, process-exclusive file locks for coordinating a pool of
//! queue workers, following the same non-blocking `fs2` discipline as
//! `orc_artifacts::GarbageCollector`'s lock file.

use crate::error::StateError;
use fs2::FileExt;
use std::fs::File;
use std::path::PathBuf;

/// A held named lock. Releases and closes the underlying file on drop.
pub struct LockGuard {
    file: File,
    name: String,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

impl LockGuard {
    /// The lock's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A namespace of exclusive locks, each backed by one file under the
/// workspace's `locks/` directory.
pub struct NamedLock {
    locks_root: PathBuf,
}

impl NamedLock {
    /// Open the lock namespace rooted at the workspace's fixed
    /// `locks/` directory.
    pub fn new(workspace: &orc_workspace::Workspace) -> Result<Self, StateError> {
        workspace.ensure_layout()?;
        Ok(Self {
            locks_root: workspace.locks_root(),
        })
    }

    /// Try to acquire the named lock without blocking. Returns `None`
    /// if another holder (in this process or another) already holds
    /// it, matching the GC lock's non-blocking, skip-don't-error policy.
    pub async fn try_acquire(&self, name: &str) -> Result<Option<LockGuard>, StateError> {
        let path = self.locks_root.join(format!("{name}.lock"));
        let name = name.to_string();

        tokio::task::spawn_blocking(move || -> Result<Option<LockGuard>, StateError> {
            let file = std::fs::OpenOptions::new().create(true).write(true).open(&path)?;
            if file.try_lock_exclusive().is_err() {
                return Ok(None);
            }
            Ok(Some(LockGuard { file, name }))
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_workspace::Workspace;
    use tempfile::TempDir;

    #[tokio::test]
    async fn acquires_an_unheld_lock() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path()).unwrap();
        let locks = NamedLock::new(&ws).unwrap();
        let guard = locks.try_acquire("gc").await.unwrap();
        assert!(guard.is_some());
        assert_eq!(guard.unwrap().name(), "gc");
    }

    #[tokio::test]
    async fn distinct_names_do_not_contend() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path()).unwrap();
        let locks = NamedLock::new(&ws).unwrap();
        let a = locks.try_acquire("a").await.unwrap();
        let b = locks.try_acquire("b").await.unwrap();
        assert!(a.is_some());
        assert!(b.is_some());
    }

    #[tokio::test]
    async fn second_acquire_while_held_is_none() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path()).unwrap();
        let locks = NamedLock::new(&ws).unwrap();
        let _held = locks.try_acquire("gc").await.unwrap().unwrap();
        assert!(locks.try_acquire("gc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dropping_a_guard_releases_the_lock() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path()).unwrap();
        let locks = NamedLock::new(&ws).unwrap();
        {
            let _guard = locks.try_acquire("gc").await.unwrap().unwrap();
        }
        let reacquired = locks.try_acquire("gc").await.unwrap();
        assert!(reacquired.is_some());
    }
}
