//! # orc-memory — the memory façade
//!
//! [`Memory`] bundles the three tiers of state one agent group draws on
//! — artifacts, semantic recall, and the session log — behind a single
//! handle so the orchestrator and tool layer don't each wire up their
//! own access to [`orc_artifacts`], [`orc_semantic`], and [`orc_session`]
//! separately. A semantic store is optional: it depends on an embedding
//! provider and vector collection supplied by the embedder (§1), so a
//! façade built without one simply has memory/search tools left out by
//! the tool resolver.

#![deny(missing_docs)]

mod error;
mod facade;

pub use error::MemoryError;
pub use facade::Memory;
