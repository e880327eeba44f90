//! [`ArtifactError`] and [`GcError`] — failures in the artifact store
//! and its garbage collector.

use thiserror::Error;

/// Errors raised by [`crate::store::ArtifactStore`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The underlying database returned an error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A filesystem operation on a blob failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Workspace path resolution rejected a blob path.
    #[error("workspace error: {0}")]
    Workspace(#[from] orc_workspace::WorkspaceError),

    /// The background task running the blocking operation panicked.
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by [`crate::gc::GarbageCollector`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GcError {
    /// The artifact store backing GC failed.
    #[error("artifact store error: {0}")]
    Store(#[from] ArtifactError),

    /// A filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
