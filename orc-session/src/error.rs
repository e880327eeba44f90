//! Errors produced by the conversation log and session manager.

/// Errors reading, appending to, or archiving the conversation log.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The underlying workspace path could not be resolved.
    #[error(transparent)]
    Workspace(#[from] orc_workspace::WorkspaceError),

    /// An I/O error reading, writing, or rotating the log file.
    #[error("session log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A session id failed to parse.
    #[error(transparent)]
    SessionId(#[from] orc_core::SessionIdError),

    /// Archiving a session's text into semantic memory failed.
    #[error("failed to archive session into semantic memory: {0}")]
    Semantic(#[from] orc_semantic::SemanticError),

    /// Catch-all for errors outside the above categories.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
