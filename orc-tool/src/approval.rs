//! The write-action approval seam consumed by [`crate::primitives::WriteFileTool`].
//!
//! This crate does not depend on `orc-approval` directly: `write_file` is
//! the only primitive that mutates state outside the workspace sandbox,
//! and it only needs a yes/no decision, not the full bridge API. An
//! embedder wires a concrete implementation (typically backed by
//! `orc_approval::ApprovalBridge::request_approval_async`) in when
//! constructing the tool set.

use async_trait::async_trait;

/// Gate deciding whether a `write_file` call may proceed.
#[async_trait]
pub trait WriteApprover: Send + Sync {
    /// Ask whether writing `content_preview` to `path` is approved.
    async fn approve(&self, path: &str, content_preview: &str) -> bool;
}

/// An approver that always denies, used when no approval backend is
/// configured — matches the engine's disconnected-bridge default.
pub struct AlwaysDeny;

#[async_trait]
impl WriteApprover for AlwaysDeny {
    async fn approve(&self, _path: &str, _content_preview: &str) -> bool {
        false
    }
}
