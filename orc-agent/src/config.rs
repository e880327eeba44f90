//! [`AgentConfig`] and friends: the resolved configuration one
//! [`crate::AgentRunner`] step needs, independent of whether it came
//! from the [`orc_registry::Registry`] or a skill's `dynamic_config`.

/// One entry in an agent's "Available Sub-Agents" prompt block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubAgentDescriptor {
    /// The sub-agent's node id, as the model should pass it to `delegate_to`.
    pub node_id: String,
    /// A short description of what the sub-agent does.
    pub description: String,
}

/// Everything [`crate::AgentRunner::step`] needs to run one agent's turn.
///
/// Built by the orchestrator from either a [`orc_registry::AgentDef`] or
/// a synthesised skill agent's `dynamic_config` — `AgentRunner` itself
/// has no opinion on where this came from.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// The agent's node id, used to attribute events, tool calls, and
    /// artifact/memory writes.
    pub agent_id: String,
    /// The agent's base system prompt, before sub-agent/shared-context
    /// injection.
    pub system_prompt: String,
    /// The model identifier this agent is bound to.
    pub model: String,
    /// The agent's group, if any; used for artifact attribution when a
    /// tool result is offloaded.
    pub group: Option<String>,
    /// Declared sub-agents, rendered into the prompt as an "Available
    /// Sub-Agents" list.
    pub sub_agents: Vec<SubAgentDescriptor>,
    /// A group-wide shared-context block injected after the sub-agent
    /// list, if the group defines one.
    pub group_shared_context: Option<String>,
}

/// Tunables for [`crate::AgentRunner`].
///
/// Defaults match the design: a single reasoning blob aborts the step
/// past 50 000 characters, and a tool result past 2 000 characters is
/// offloaded to the artifact store (when one is configured) rather than
/// inlined in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentRunnerOptions {
    /// Character cap on accumulated reasoning before the step aborts
    /// with a `RunnerError::ModelFailure`.
    pub max_reasoning_chars: usize,
    /// Character threshold above which a tool's raw output is offloaded
    /// to an ephemeral artifact rather than inlined.
    pub offload_threshold_chars: usize,
}

impl Default for AgentRunnerOptions {
    fn default() -> Self {
        Self {
            max_reasoning_chars: 50_000,
            offload_threshold_chars: 2_000,
        }
    }
}
