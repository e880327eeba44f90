//! UI channel event shapes (§6): the one-way stream of progress events
//! the engine produces for an observer, plus the inbound approval
//! response it consumes.
//!
//! These are plain serde types, not a trait — `AgentRunner` and
//! `Orchestrator` both accept a callback of `FnMut(Event)` (or an async
//! equivalent) rather than depending on any particular transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of filesystem mutation a write-action request describes.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOperation {
    /// The file does not yet exist.
    Create,
    /// The file exists and will be overwritten.
    Update,
    /// The file will be removed.
    Delete,
}

/// Which of the two streamed channels a `stream` event carries.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    /// The model's private reasoning/thinking channel.
    Thinking,
    /// The model's visible answer channel.
    Answer,
}

/// Lifecycle status reported for one agent's run.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// The agent has begun stepping.
    Starting,
    /// The agent returned a result.
    Completed,
    /// The agent's step failed.
    Error,
}

/// Whether a returned control flow unwound a delegation or a skill
/// invocation.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// The return unwinds a `delegate`/`delegate_parallel` child frame.
    Delegate,
    /// The return unwinds a `use_skill` synthesised child frame.
    Skill,
}

/// One event on the UI channel.
///
/// `WriteActionResponse` is the one inbound shape (posted by the UI
/// into [`crate::error::RunnerError`]-adjacent approval plumbing, not
/// emitted by the engine); every other variant is produced by the
/// engine and consumed by an observer.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A `write_file` call is awaiting a human decision.
    WriteActionRequest {
        /// Correlates with the eventual `WriteActionResponse`.
        id: String,
        /// The requesting agent's node id, if known.
        agent_id: Option<String>,
        /// The workspace-relative path being written.
        file_path: String,
        /// What kind of mutation this is.
        operation: WriteOperation,
        /// When the request was raised, RFC 3339.
        timestamp: String,
    },

    /// Inbound: the UI's decision on a prior `WriteActionRequest`.
    WriteActionResponse {
        /// The request this responds to.
        id: String,
        /// Whether the write was approved.
        approved: bool,
        /// When the decision was made, RFC 3339.
        timestamp: String,
    },

    /// An incremental chunk of model output.
    Stream {
        /// The emitting agent's node id.
        agent_id: String,
        /// Which channel this chunk belongs to.
        stream_type: StreamType,
        /// The chunk's text.
        content: String,
        /// A display color hint for this agent, if configured.
        agent_color: Option<String>,
    },

    /// An agent's lifecycle transition.
    AgentStatus {
        /// The agent's node id.
        agent_id: String,
        /// The new status.
        status: AgentStatus,
        /// A human-readable detail, e.g. an error message.
        message: Option<String>,
        /// The agent's group, if any.
        group: Option<String>,
    },

    /// A tool call was issued.
    ToolCall {
        /// The tool's name.
        tool_name: String,
        /// The arguments passed.
        tool_args: Value,
        /// The calling agent's node id.
        agent_id: String,
    },

    /// A tool call's result was produced.
    ToolResult {
        /// The (possibly offloaded/truncated) result content.
        content: String,
        /// The calling agent's node id.
        agent_id: String,
    },

    /// Parallel delegation has been dispatched.
    ParallelStarted {
        /// The delegating agent's node id.
        agent_id: String,
        /// Node ids of every concurrent target.
        targets: Vec<String>,
        /// The delegating agent's group, if any.
        group: Option<String>,
    },

    /// Parallel delegation has finished aggregating.
    ParallelCompleted {
        /// The delegating agent's node id.
        agent_id: String,
        /// Node ids of every concurrent target.
        targets: Vec<String>,
        /// The delegating agent's group, if any.
        group: Option<String>,
    },

    /// A child frame unwound back into its parent.
    ActionReturn {
        /// Whether this was a delegation or a skill invocation.
        action_type: ActionType,
        /// The child frame's agent node id.
        from_actor: String,
        /// The parent frame's agent node id.
        to_actor: String,
        /// The tool call id on the parent this return resolves.
        parent_tool_call_id: Option<String>,
        /// The result content carried back.
        content: String,
    },

    /// `/new` was handled: a fresh session has begun.
    SessionNew {
        /// The newly created session id.
        session_id: String,
        /// A human-readable acknowledgement.
        message: String,
    },
}
