//! Error types shared across orchestration crates.
//!
//! Each downstream crate (`orc-workspace`, `orc-artifacts`, ...) defines
//! its own `thiserror` enum scoped to its component; this module holds
//! only the few error kinds that cross crate boundaries because the
//! orchestrator loop itself needs to match on them.

use thiserror::Error;

/// Permission or routing errors raised while resolving a delegation
/// target.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No agent, group, or skill matched the given name.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller is not permitted to delegate to the target.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by one agent step (the `AgentRunner`).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The model stream failed, or reasoning exceeded the size cap.
    #[error("model failure: {0}")]
    ModelFailure(String),

    /// A tool threw or returned an error result.
    #[error("tool failure in {tool}: {message}")]
    ToolFailure {
        /// Name of the tool that failed.
        tool: String,
        /// Error message.
        message: String,
    },

    /// Context assembly failed before the model call.
    #[error("context assembly failed: {0}")]
    ContextFailure(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by the orchestrator's main loop.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum OrchError {
    /// The outer iteration cap was hit before the stack emptied.
    #[error("iteration cap exceeded")]
    IterationCapExceeded,

    /// A sub-agent failed after its single retry during parallel
    /// delegation.
    #[error("parallel delegation failure for {target}: {message}")]
    ParallelFailure {
        /// Node id of the failing target.
        target: String,
        /// Error message.
        message: String,
    },

    /// Delegation was denied by the registry's permission rules.
    #[error("permission denied: {0}")]
    PermissionDenied(#[from] RegistryError),

    /// A single agent step failed.
    #[error("runner error: {0}")]
    Runner(#[from] RunnerError),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
