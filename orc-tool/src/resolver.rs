//! [`ToolResolver`]: composes the tool set available to a given agent.

use crate::artifact_tools::{DeleteArtifactTool, ListArtifactsTool, ReadArtifactTool, SaveArtifactTool};
use crate::delegation::{DelegateParallelTool, DelegateToTool};
use crate::memory_tools::{RememberTool, SearchMemoryTool};
use crate::primitives::{BashTool, GlobTool, GrepTool, ReadFileTool, WebFetchTool, WriteFileTool};
use crate::skill_proxy::SkillProxyTool;
use crate::{ToolDyn, ToolRegistry, WriteApprover};
use orc_artifacts::ArtifactStore;
use orc_registry::AgentDef;
use orc_semantic::SemanticStore;
use orc_workspace::Workspace;
use std::path::PathBuf;
use std::sync::Arc;

/// Builds the [`ToolRegistry`] available to one agent for one turn.
///
/// Always includes the built-in primitives (`bash`, `read_file`,
/// `write_file`, `grep`, `glob`, `web_fetch`). Adds a [`SkillProxyTool`]
/// per name in [`AgentDef::tools`] that resolves to a loadable skill;
/// names that aren't skills are treated as already-known primitive
/// names and left alone. Adds `delegate_to`/`delegate_parallel` when the
/// agent is a leader. Adds memory tools when a semantic store is
/// supplied, and artifact tools when an artifact store is supplied.
/// Earlier registrations win on a name collision.
pub struct ToolResolver {
    workspace: Arc<Workspace>,
    approver: Arc<dyn WriteApprover>,
    skill_dirs: Vec<PathBuf>,
    semantic: Option<Arc<SemanticStore>>,
    artifacts: Option<Arc<ArtifactStore>>,
}

impl ToolResolver {
    /// Build a resolver rooted at `workspace`, gating `write_file`
    /// through `approver` and searching `skill_dirs` (in order) for
    /// skills named in an agent's tool list.
    pub fn new(workspace: Arc<Workspace>, approver: Arc<dyn WriteApprover>, skill_dirs: Vec<PathBuf>) -> Self {
        Self { workspace, approver, skill_dirs, semantic: None, artifacts: None }
    }

    /// Make memory tools (`search_memory`, `remember`) available.
    pub fn with_semantic_store(mut self, store: Arc<SemanticStore>) -> Self {
        self.semantic = Some(store);
        self
    }

    /// Make artifact tools (`save_artifact`, `read_artifact`,
    /// `list_artifacts`, `delete_artifact`) available.
    pub fn with_artifact_store(mut self, store: Arc<ArtifactStore>) -> Self {
        self.artifacts = Some(store);
        self
    }

    /// Resolve the full tool set for `agent`, whose artifacts and
    /// memory entries are attributed to `agent_id` and `group`.
    pub async fn resolve(&self, agent: &AgentDef, agent_id: &str, group: &str) -> ToolRegistry {
        let mut registry = ToolRegistry::new();

        registry.register(Arc::new(BashTool::new(Arc::clone(&self.workspace))));
        registry.register(Arc::new(ReadFileTool::new(Arc::clone(&self.workspace))));
        registry.register(Arc::new(WriteFileTool::new(Arc::clone(&self.workspace), Arc::clone(&self.approver))));
        registry.register(Arc::new(GrepTool::new(Arc::clone(&self.workspace))));
        registry.register(Arc::new(GlobTool::new(Arc::clone(&self.workspace))));
        registry.register(Arc::new(WebFetchTool::default()));

        if agent.is_leader {
            registry.register(Arc::new(DelegateToTool::new(agent.sub_agents.is_empty())));
            registry.register(Arc::new(DelegateParallelTool));
        }

        if let Some(store) = &self.semantic {
            registry.register(Arc::new(SearchMemoryTool::new(Arc::clone(store), agent_id)));
            registry.register(Arc::new(RememberTool::new(Arc::clone(store), agent_id)));
        }

        if let Some(store) = &self.artifacts {
            registry.register(Arc::new(SaveArtifactTool::new(Arc::clone(store), agent_id, group)));
            registry.register(Arc::new(ReadArtifactTool::new(Arc::clone(store))));
            registry.register(Arc::new(ListArtifactsTool::new(Arc::clone(store), group)));
            registry.register(Arc::new(DeleteArtifactTool::new(Arc::clone(store))));
        }

        for name in &agent.tools {
            if registry.get(name).is_some() {
                continue;
            }
            match orc_registry::load_skill(&self.skill_dirs, name).await {
                Ok(skill) => {
                    let proxy: Arc<dyn ToolDyn> = Arc::new(SkillProxyTool::new(skill.name, skill.description));
                    registry.register(proxy);
                }
                Err(e) => {
                    tracing::warn!(tool = %name, error = %e, "tool name is neither a primitive nor a loadable skill");
                }
            }
        }

        registry
    }
}
