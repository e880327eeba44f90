//! Errors produced by the approval bridge.

/// Errors requesting or resolving a write-action approval.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// The bridge has no connected UI channel to send the request on.
    #[error("approval bridge is disconnected")]
    Disconnected,

    /// The UI channel receiver was dropped.
    #[error("failed to send approval request: channel closed")]
    SendFailed,

    /// `request_approval` was called from outside a Tokio runtime context.
    #[error("no Tokio runtime available for synchronous approval request")]
    NoRuntime,

    /// Catch-all for errors outside the above categories.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
