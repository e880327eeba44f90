#![deny(missing_docs)]
//! # orc — umbrella crate
//!
//! A single import surface for the orchestration engine. Re-exports the
//! `orc-*` component crates behind feature flags, plus a [`prelude`] for
//! the common case of building and running an [`orc_orch::Orchestrator`].
//!
//! `orc-core` (the wire protocol: frames, control signals, messages,
//! provider traits) is always available. Everything else — workspace
//! layout, context assembly, registry, tool resolution, the agent
//! runner, the orchestrator loop, tiered memory, the approval bridge,
//! and the optional queue-worker state store — is additive behind the
//! `engine`, `memory`, `approval`, and `state` features (all but `state`
//! are on by default).

pub use orc_core;

#[cfg(feature = "engine")]
pub use orc_agent;
#[cfg(feature = "approval")]
pub use orc_approval;
#[cfg(feature = "memory")]
pub use orc_artifacts;
#[cfg(feature = "engine")]
pub use orc_context;
#[cfg(feature = "memory")]
pub use orc_memory;
#[cfg(feature = "engine")]
pub use orc_orch;
#[cfg(feature = "engine")]
pub use orc_registry;
#[cfg(feature = "memory")]
pub use orc_semantic;
#[cfg(feature = "memory")]
pub use orc_session;
#[cfg(feature = "state")]
pub use orc_state;
#[cfg(feature = "engine")]
pub use orc_tool;
#[cfg(feature = "engine")]
pub use orc_workspace;

/// Happy-path imports for composing an orchestration engine.
pub mod prelude {
    pub use orc_core::{
        ControlSignal, Event, Message, ModelProvider, NodeId, ParallelTask, Role, TaskFrame,
        ToolCall,
    };

    #[cfg(feature = "engine")]
    pub use orc_agent::{AgentConfig, AgentRunner};
    #[cfg(feature = "engine")]
    pub use orc_context::ContextBuilder;
    #[cfg(feature = "engine")]
    pub use orc_orch::{Orchestrator, OrchestratorOptions, RunOutcome};
    #[cfg(feature = "engine")]
    pub use orc_registry::{AgentDef, Registry};
    #[cfg(feature = "engine")]
    pub use orc_tool::{AlwaysDeny, ToolRegistry, WriteApprover};
    #[cfg(feature = "engine")]
    pub use orc_workspace::Workspace;

    #[cfg(feature = "memory")]
    pub use orc_artifacts::ArtifactStore;
    #[cfg(feature = "memory")]
    pub use orc_memory::Memory;
    #[cfg(feature = "memory")]
    pub use orc_semantic::SemanticStore;
    #[cfg(feature = "memory")]
    pub use orc_session::{SessionLog, SessionManager};

    #[cfg(feature = "approval")]
    pub use orc_approval::ApprovalBridge;

    #[cfg(feature = "state")]
    pub use orc_state::{HeartbeatTracker, NamedLock, TaskQueue};
}
