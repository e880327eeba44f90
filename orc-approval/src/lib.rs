//! # orc-approval — the write-action approval bridge
//!
//! [`ApprovalBridge`] is the single seam every write-capable tool must
//! pass through: disconnected, it denies by default; connected, it
//! hands requests to a UI and blocks (synchronously or asynchronously)
//! on its decision, always timing out to a denial rather than hanging.

#![deny(missing_docs)]

mod bridge;
mod error;

pub use bridge::{ApprovalBridge, WriteActionRequest};
pub use error::ApprovalError;
