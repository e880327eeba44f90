//! # orc-registry — agent/group/skill definitions and naming rules
//!
//! [`Registry`] holds every [`AgentDef`] keyed by node id and resolves
//! delegation targets and permissions against them. [`SkillDef`]
//! (loaded via [`load_skill`]) is the on-disk skill counterpart,
//! hydrated into a synthesised agent's system prompt at invocation time.

#![deny(missing_docs)]

mod agent;
mod error;
mod skill;

pub use agent::{AgentDef, Registry};
pub use error::RegistryError;
pub use skill::{load_skill, SkillDef};
