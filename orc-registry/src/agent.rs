//! [`AgentDef`] and the [`Registry`] that holds them: name resolution
//! and delegation permission checks.

use crate::error::RegistryError;
use orc_core::NodeId;
use std::collections::HashMap;

/// A statically (or dynamically, for skill agents) configured agent.
#[derive(Debug, Clone)]
pub struct AgentDef {
    /// The agent's bare name (unqualified by group).
    pub name: String,
    /// The group this agent belongs to, if any.
    pub group: Option<String>,
    /// Whether this agent may delegate across group boundaries and
    /// access `delegate_to`/`delegate_parallel`.
    pub is_leader: bool,
    /// A short description of what this agent does, rendered into a
    /// delegating leader's "Available Sub-Agents" prompt block.
    pub description: String,
    /// Declared sub-agent names this agent may delegate to. An empty
    /// list means any target name is accepted (wildcard).
    pub sub_agents: Vec<String>,
    /// Names of tools (primitives, skills, or otherwise) this agent may use.
    pub tools: Vec<String>,
    /// The agent's system prompt.
    pub system_prompt: String,
    /// The model identifier this agent is bound to.
    pub model: String,
}

impl AgentDef {
    /// The agent's node id: `group__name` if grouped, else `name`.
    pub fn node_id(&self) -> NodeId {
        match &self.group {
            Some(group) => NodeId::from(format!("{group}__{}", self.name)),
            None => NodeId::from(self.name.clone()),
        }
    }
}

/// Holds every agent definition known to the engine, keyed by node id,
/// and resolves names and delegation permission against them.
#[derive(Debug, Default)]
pub struct Registry {
    agents: HashMap<NodeId, AgentDef>,
}

impl Registry {
    /// Build an empty registry.
    pub fn new() -> Self {
        Self { agents: HashMap::new() }
    }

    /// Register an agent. If it declares itself a leader but its group
    /// already has one, it is registered anyway but downgraded to a
    /// non-leader, with a warning logged — the spec grants each group at
    /// most one leader.
    pub fn register(&mut self, mut agent: AgentDef) -> NodeId {
        if agent.is_leader {
            if let Some(group) = &agent.group {
                let already_has_leader = self
                    .agents
                    .values()
                    .any(|a| a.group.as_deref() == Some(group.as_str()) && a.is_leader);
                if already_has_leader {
                    tracing::warn!(
                        group,
                        agent = agent.name,
                        "group already has a leader; downgrading this agent to non-leader"
                    );
                    agent.is_leader = false;
                }
            }
        }
        let node_id = agent.node_id();
        self.agents.insert(node_id.clone(), agent);
        node_id
    }

    /// Look up an agent by its exact node id.
    pub fn get(&self, node_id: &NodeId) -> Option<&AgentDef> {
        self.agents.get(node_id)
    }

    /// Resolve a delegation target name as seen by `caller`.
    ///
    /// Resolution order: exact node-id match; then, if `caller` belongs
    /// to a group, `{caller.group}__{name}`; then a scan for any agent
    /// whose bare `name` equals `name`.
    pub fn resolve(&self, name: &str, caller: Option<&AgentDef>) -> Result<&AgentDef, RegistryError> {
        if let Some(agent) = self.agents.get(&NodeId::from(name)) {
            return Ok(agent);
        }
        if let Some(caller) = caller {
            if let Some(group) = &caller.group {
                let qualified = NodeId::from(format!("{group}__{name}"));
                if let Some(agent) = self.agents.get(&qualified) {
                    return Ok(agent);
                }
            }
        }
        if let Some(agent) = self.agents.values().find(|a| a.name == name) {
            return Ok(agent);
        }
        Err(RegistryError::NotFound(name.to_string()))
    }

    /// Check whether `caller` may delegate to `target`.
    ///
    /// Intra-group (both share `group`, including both ungrouped) is
    /// always allowed. Cross-group is allowed only if both are leaders.
    pub fn check_delegation(&self, caller: &AgentDef, target: &AgentDef) -> Result<(), RegistryError> {
        if caller.group == target.group {
            return Ok(());
        }
        if caller.is_leader && target.is_leader {
            return Ok(());
        }
        Err(RegistryError::PermissionDenied {
            caller: caller.node_id().to_string(),
            target: target.node_id().to_string(),
            reason: "cross-group delegation requires both agents to be leaders".to_string(),
        })
    }

    /// Resolve and permission-check a delegation from `caller` to `name`
    /// in one call, the common path used by the orchestrator.
    pub fn resolve_for_delegation(
        &self,
        caller: &AgentDef,
        name: &str,
    ) -> Result<&AgentDef, RegistryError> {
        let target = self.resolve(name, Some(caller))?;
        self.check_delegation(caller, target)?;
        Ok(target)
    }

    /// Iterate over every registered agent.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &AgentDef)> {
        self.agents.iter()
    }
}
