//! # orc-artifacts — content-addressed artifact store and GC
//!
//! [`ArtifactStore`] hashes written content and stores each distinct
//! blob exactly once under `blobs/YYYY/MM/DD/aa/bb/<hash>`, while
//! metadata rows (title, tags, author, group) may multiply freely over
//! the same content. [`GarbageCollector`] reclaims ephemeral rows past
//! their retention window and orphaned blobs under an exclusive,
//! non-blocking file lock, and can archive aged artifacts out of the
//! live table entirely.

#![deny(missing_docs)]

mod error;
mod gc;
mod store;

pub use error::{ArtifactError, GcError};
pub use gc::{GarbageCollector, GcConfig, GcReport};
pub use store::{Artifact, ArtifactStore};
