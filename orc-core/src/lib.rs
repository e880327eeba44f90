//! # orc-core — shared data model for the orchestration engine
//!
//! This crate defines the types every other `orc-*` crate builds on: the
//! stack element ([`frame::TaskFrame`]) and its control protocol
//! ([`signal::ControlSignal`]), the message/content representation that
//! flows through an agent's memory, the tiered-memory record types
//! ([`artifact::ArtifactRecord`], [`semantic::SemanticEntry`],
//! [`turn::ConversationTurn`]), typed identifiers, and the external
//! model/embedding adapter seams (§6 of the design: out of scope to
//! implement, in scope to define).
//!
//! ## Dependency Notes
//!
//! This crate depends on `serde_json::Value` for extension data fields
//! (tool inputs, per-task scratch state, metadata). JSON is the natural
//! interchange format here; a generic `T: Serialize` would complicate
//! object safety for the provider traits without practical benefit.

#![deny(missing_docs)]

pub mod artifact;
pub mod content;
pub mod duration;
pub mod error;
pub mod event;
pub mod frame;
pub mod id;
pub mod message;
pub mod provider;
pub mod semantic;
pub mod signal;
pub mod turn;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use artifact::ArtifactRecord;
pub use content::{Content, ContentBlock};
pub use duration::DurationMs;
pub use error::{OrchError, RegistryError, RunnerError};
pub use event::{ActionType, AgentStatus, Event, StreamType, WriteOperation};
pub use frame::TaskFrame;
pub use id::{ArtifactId, EntryId, NodeId, SessionId, SessionIdError, SessionIdParts, ToolCallId};
pub use message::{Message, Role, ToolCall};
pub use provider::{BoundModel, EmbeddingProvider, ModelProvider, StreamChunk, ToolSchema};
pub use semantic::{SemanticEntry, SemanticHit, SummarizeStats};
pub use signal::{ControlSignal, ParallelTask};
pub use turn::{ConversationTurn, SkillCallRecord, ToolCallRecord, TokenUsage, TurnStatus};
