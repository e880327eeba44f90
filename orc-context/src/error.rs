//! [`ContextError`] — failures assembling a bounded context.

use thiserror::Error;

/// Errors raised while estimating tokens or assembling context.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ContextError {
    /// The supplied limit leaves no room for even the system prompt
    /// after accounting for the response buffer.
    #[error("budget exhausted before system prompt: limit={limit}, response_buffer={response_buffer}")]
    BudgetExhausted {
        /// The model's stated context limit.
        limit: usize,
        /// The reserved response buffer.
        response_buffer: usize,
    },

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
