//! Sandboxed path resolution and the fixed on-disk layout beneath a
//! workspace root.
//!
//! Every other component addresses its files relative to a
//! [`Workspace`]: `.soloqueue/artifacts.db`, `.soloqueue/artifacts/blobs/`,
//! `.soloqueue/archive/`, `.soloqueue/logs/conversations.jsonl`,
//! `.soloqueue/semantic/<group>/`, `.soloqueue/.gc.lock`,
//! `.soloqueue/.gc_state`, `config/skills/`.

#![deny(missing_docs)]

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors resolving a path against a workspace root.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The resolved path lies outside the workspace root.
    #[error("permission denied: {path} escapes workspace root")]
    PermissionDenied {
        /// The path that was rejected.
        path: String,
    },

    /// Canonicalizing the path failed (e.g. a symlink cycle).
    #[error("failed to resolve path: {0}")]
    Io(#[from] std::io::Error),
}

/// A sandboxed view over a single root directory.
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Open a workspace rooted at `root`. The root itself is
    /// canonicalized eagerly so later resolutions compare against its
    /// real, symlink-free path.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let root = root.canonicalize()?;
        Ok(Self { root })
    }

    /// The canonical workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` against the workspace root, following any
    /// symlinks, and reject it with [`WorkspaceError::PermissionDenied`]
    /// if the result lies outside the root. Empty path or `.` resolves
    /// to the root itself.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, WorkspaceError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() || path == Path::new(".") {
            return Ok(self.root.clone());
        }

        let candidate = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let resolved = resolve_following_symlinks(&candidate)?;

        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(WorkspaceError::PermissionDenied {
                path: path.display().to_string(),
            })
        }
    }

    /// Create the fixed directory layout beneath the root, idempotently.
    /// Does not create any of the files themselves.
    pub fn ensure_layout(&self) -> Result<(), WorkspaceError> {
        for rel in [
            ".soloqueue/artifacts/blobs",
            ".soloqueue/archive",
            ".soloqueue/logs",
            ".soloqueue/semantic",
            ".soloqueue/locks",
            "config/skills",
        ] {
            std::fs::create_dir_all(self.root.join(rel))?;
        }
        tracing::debug!(root = %self.root.display(), "workspace layout ensured");
        Ok(())
    }

    /// Path to the artifact metadata database, relative layout per §6.
    pub fn artifacts_db_path(&self) -> PathBuf {
        self.root.join(".soloqueue/artifacts.db")
    }

    /// Root directory under which content-addressed blobs are written.
    pub fn blobs_root(&self) -> PathBuf {
        self.root.join(".soloqueue/artifacts/blobs")
    }

    /// Root directory for date-archived artifacts.
    pub fn archive_root(&self) -> PathBuf {
        self.root.join(".soloqueue/archive")
    }

    /// Path to the append-only session log.
    pub fn conversations_log_path(&self) -> PathBuf {
        self.root.join(".soloqueue/logs/conversations.jsonl")
    }

    /// Root directory for a group's semantic store.
    pub fn semantic_root(&self, group: &str) -> PathBuf {
        self.root.join(".soloqueue/semantic").join(group)
    }

    /// Path to the GC's exclusive lock file.
    pub fn gc_lock_path(&self) -> PathBuf {
        self.root.join(".soloqueue/.gc.lock")
    }

    /// Path to the GC's last-run cooldown state file.
    pub fn gc_state_path(&self) -> PathBuf {
        self.root.join(".soloqueue/.gc_state")
    }

    /// Root directory searched first for project-local skills.
    pub fn skills_root(&self) -> PathBuf {
        self.root.join("config/skills")
    }

    /// Path to the optional state database (task queue, heartbeats).
    pub fn state_db_path(&self) -> PathBuf {
        self.root.join(".soloqueue/state.db")
    }

    /// Root directory for the optional state DB's named lock files.
    pub fn locks_root(&self) -> PathBuf {
        self.root.join(".soloqueue/locks")
    }
}

/// Resolve `candidate` to an absolute, symlink-free path, without
/// requiring the full path to exist: canonicalize the longest existing
/// ancestor (following any symlinks, surfacing cycles as `io::Error`),
/// then rejoin the remaining, not-yet-existing components verbatim.
fn resolve_following_symlinks(candidate: &Path) -> Result<PathBuf, std::io::Error> {
    let mut existing = candidate;
    let mut remainder: Vec<&std::ffi::OsStr> = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(base) => {
                let mut resolved = base;
                for component in remainder.into_iter().rev() {
                    resolved.push(component);
                }
                return Ok(resolved);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let Some(parent) = existing.parent() else {
                    return Err(e);
                };
                if let Some(name) = existing.file_name() {
                    remainder.push(name);
                }
                existing = parent;
            }
            Err(e) => return Err(e),
        }
    }
}
