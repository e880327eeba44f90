#![deny(missing_docs)]
//! # orc-state — the optional queue-worker state database
//!
//! Outside the single-process, single-turn orchestration engine, a
//! deployment may run a pool of workers pulling agent invocations off a
//! shared queue. [`TaskQueue`] is the durable FIFO-per-queue work list
//! those workers claim from, [`HeartbeatTracker`] is the liveness
//! record a monitor reads to detect a dead worker, and [`NamedLock`]
//! lets independent workers coordinate on a shared resource (e.g. "only
//! one worker runs GC at a time") without a central scheduler — the
//! same non-blocking, exclusive-file-lock discipline
//! `orc_artifacts::GarbageCollector` uses for its own lock.
//!
//! None of this is required by [`orc_orch::Orchestrator::run`], which
//! drives a single user turn to completion synchronously; it exists for
//! an embedder that wants to fan work across multiple processes.

mod db;
mod error;
mod heartbeat;
mod lock;
mod queue;

pub use error::StateError;
pub use heartbeat::{Heartbeat, HeartbeatTracker};
pub use lock::{LockGuard, NamedLock};
pub use queue::{Task, TaskQueue};
