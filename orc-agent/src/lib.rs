#![deny(missing_docs)]
//! [`AgentRunner`] — one step of one agent.
//!
//! Given a [`orc_core::TaskFrame`] and an [`AgentConfig`], runs the
//! assemble-context / stream-model / execute-tools cycle described in
//! the design's AgentRunner component and returns exactly one
//! [`orc_core::ControlSignal`]. Holds no per-frame state: the same
//! runner is reused across every frame on the orchestrator's stack,
//! including the independent sub-agent loops spawned for parallel
//! delegation.

mod config;
mod render;
mod runner;

pub use config::{AgentConfig, AgentRunnerOptions, SubAgentDescriptor};
pub use render::render_tool_output;
pub use runner::AgentRunner;
