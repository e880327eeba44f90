//! Errors from the optional state database and named-lock layer.

use thiserror::Error;

/// Errors from [`crate::StateDb`] and [`crate::NamedLock`] operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StateError {
    /// The referenced task id does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(i64),

    /// The database rejected a query or schema operation.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem I/O failed (workspace layout, lock file, blocking pool).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A `spawn_blocking` task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
