//! Error type for the memory façade.

use thiserror::Error;

/// Errors from façade operations, wrapping the underlying store errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MemoryError {
    /// An artifact-store operation failed.
    #[error("artifact store error: {0}")]
    Artifacts(#[from] orc_artifacts::ArtifactError),

    /// A semantic-store operation failed.
    #[error("semantic store error: {0}")]
    Semantic(#[from] orc_semantic::SemanticError),

    /// A session-log operation failed.
    #[error("session error: {0}")]
    Session(#[from] orc_session::SessionError),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
