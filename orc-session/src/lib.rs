//! # orc-session — append-only conversation log and session identity
//!
//! [`SessionLog`] is the durable, append-only JSONL record of every
//! completed turn. [`SessionManager`] builds deterministic session
//! identity on top of it: "the current session" is always derived from
//! what's already in the log, never tracked as separate mutable state.

#![deny(missing_docs)]

mod error;
mod log;
mod manager;

pub use error::SessionError;
pub use log::SessionLog;
pub use manager::{ResolvedSession, SessionManager};
