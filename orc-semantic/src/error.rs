//! [`SemanticError`] — failures embedding, indexing, or querying.

use thiserror::Error;

/// Errors raised by [`crate::store::SemanticStore`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SemanticError {
    /// The embedding adapter failed.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The underlying vector collection failed.
    #[error("vector collection error: {0}")]
    VectorCollection(String),

    /// The summarization model failed.
    #[error("summarization failed: {0}")]
    Summarization(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
