//! [`Orchestrator`] — the stack-based main loop over one user turn.

use crate::options::OrchestratorOptions;
use crate::parallel::run_parallel;
use orc_agent::{AgentConfig, AgentRunner, SubAgentDescriptor};
use orc_artifacts::ArtifactStore;
use orc_core::{
    ActionType, AgentStatus, ConversationTurn, ControlSignal, DurationMs, Event, Message, NodeId, OrchError,
    RegistryError as CoreRegistryError, SessionId, TaskFrame, TokenUsage, ToolCall, ToolCallRecord, TurnStatus,
};
use orc_registry::{AgentDef, Registry};
use orc_semantic::SemanticStore;
use orc_session::{SessionLog, SessionManager};
use orc_tool::{ToolResolver, WriteApprover};
use orc_workspace::Workspace;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Instant;

/// The result of one top-level [`Orchestrator::run`] call.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The session this turn was recorded under.
    pub session_id: SessionId,
    /// The consolidated final answer text.
    pub response: String,
    /// Node ids of every agent invoked during the turn, in
    /// first-appearance order.
    pub delegation_chain: Vec<String>,
}

#[derive(Default)]
struct TurnMetrics {
    tool_calls: Vec<ToolCallRecord>,
    skill_calls: Vec<orc_core::SkillCallRecord>,
}

/// Interprets the [`ControlSignal`] protocol over a stack of
/// [`TaskFrame`]s for one user turn: resolves and permission-checks
/// delegation, runs parallel sub-agents, hydrates skills, and persists
/// the outcome into the session log.
pub struct Orchestrator {
    registry: Arc<Registry>,
    runner: Arc<AgentRunner>,
    workspace: Arc<Workspace>,
    approver: Arc<dyn WriteApprover>,
    skill_dirs: Vec<PathBuf>,
    artifacts: Option<Arc<ArtifactStore>>,
    semantic_by_group: HashMap<String, Arc<SemanticStore>>,
    group_shared_context: HashMap<String, String>,
    session_log: Arc<SessionLog>,
    session_manager: Arc<SessionManager>,
    options: OrchestratorOptions,
}

impl Orchestrator {
    /// Build an orchestrator over a fixed registry and a shared runner,
    /// workspace, write approver, skill search path, and session
    /// log/manager. Artifact storage, per-group semantic stores, and
    /// group shared-context blocks are optional and added via the
    /// `with_*` builders.
    pub fn new(
        registry: Arc<Registry>,
        runner: Arc<AgentRunner>,
        workspace: Arc<Workspace>,
        approver: Arc<dyn WriteApprover>,
        skill_dirs: Vec<PathBuf>,
        session_log: Arc<SessionLog>,
        session_manager: Arc<SessionManager>,
    ) -> Self {
        Self {
            registry,
            runner,
            workspace,
            approver,
            skill_dirs,
            artifacts: None,
            semantic_by_group: HashMap::new(),
            group_shared_context: HashMap::new(),
            session_log,
            session_manager,
            options: OrchestratorOptions::default(),
        }
    }

    /// Make artifact storage (and therefore tool-output offloading and
    /// the artifact tools) available to every agent.
    pub fn with_artifact_store(mut self, store: Arc<ArtifactStore>) -> Self {
        self.artifacts = Some(store);
        self
    }

    /// Wire a semantic store for `group`'s agents. The store keyed by
    /// the empty string is the default used for ungrouped agents and
    /// for session archival.
    pub fn with_semantic_store(mut self, group: impl Into<String>, store: Arc<SemanticStore>) -> Self {
        self.semantic_by_group.insert(group.into(), store);
        self
    }

    /// Set the shared-context block injected into every agent's prompt
    /// in `group`.
    pub fn with_group_shared_context(mut self, group: impl Into<String>, text: impl Into<String>) -> Self {
        self.group_shared_context.insert(group.into(), text.into());
        self
    }

    /// Override the default iteration cap and history replay depth.
    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    pub(crate) fn runner(&self) -> Arc<AgentRunner> {
        Arc::clone(&self.runner)
    }

    pub(crate) fn options(&self) -> OrchestratorOptions {
        self.options
    }

    pub(crate) fn tool_resolver_for(&self, agent: &AgentDef) -> ToolResolver {
        let mut resolver = ToolResolver::new(Arc::clone(&self.workspace), Arc::clone(&self.approver), self.skill_dirs.clone());
        if let Some(store) = &self.artifacts {
            resolver = resolver.with_artifact_store(Arc::clone(store));
        }
        let key = agent.group.clone().unwrap_or_default();
        if let Some(store) = self.semantic_by_group.get(&key) {
            resolver = resolver.with_semantic_store(Arc::clone(store));
        }
        resolver
    }

    pub(crate) fn build_config(&self, agent: &AgentDef) -> AgentConfig {
        let sub_agents = agent
            .sub_agents
            .iter()
            .filter_map(|name| {
                self.registry
                    .resolve(name, Some(agent))
                    .ok()
                    .map(|def| SubAgentDescriptor { node_id: def.node_id().to_string(), description: def.description.clone() })
            })
            .collect();
        let group_shared_context = agent.group.as_ref().and_then(|g| self.group_shared_context.get(g).cloned());
        AgentConfig {
            agent_id: agent.node_id().to_string(),
            system_prompt: agent.system_prompt.clone(),
            model: agent.model.clone(),
            group: agent.group.clone(),
            sub_agents,
            group_shared_context,
        }
    }

    fn resolve_agent_for_frame(&self, frame: &TaskFrame) -> Result<AgentDef, OrchError> {
        if let Some(cfg) = &frame.dynamic_config {
            return Ok(AgentDef {
                name: frame.agent_name.clone(),
                group: cfg.get("group").and_then(|v| v.as_str()).map(str::to_string),
                is_leader: false,
                description: String::new(),
                sub_agents: Vec::new(),
                tools: cfg
                    .get("tools")
                    .and_then(|v| v.as_array())
                    .map(|arr| arr.iter().filter_map(|t| t.as_str().map(str::to_string)).collect())
                    .unwrap_or_default(),
                system_prompt: cfg.get("system_prompt").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                model: cfg.get("model").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            });
        }
        self.registry
            .get(&NodeId::from(frame.agent_name.as_str()))
            .cloned()
            .ok_or_else(|| OrchError::PermissionDenied(CoreRegistryError::NotFound(frame.agent_name.clone())))
    }

    async fn hydrate_skill(
        &self,
        skill_name: &str,
        args: &str,
        caller: &AgentDef,
        tool_call_id: String,
    ) -> Result<TaskFrame, orc_registry::RegistryError> {
        let skill = orc_registry::load_skill(&self.skill_dirs, skill_name).await?;
        let hydrated = skill.hydrate(args).await;
        let dynamic_config = serde_json::json!({
            "system_prompt": hydrated,
            "model": caller.model,
            "group": caller.group,
            "tools": skill.allowed_tools,
        });
        let agent_name = format!("skill:{}:{}", caller.node_id(), skill_name);
        let mut frame = TaskFrame::child(agent_name, args.to_string(), tool_call_id);
        frame.dynamic_config = Some(dynamic_config);
        Ok(frame)
    }

    /// Archive `session_id` into the default (`""`-keyed) semantic
    /// store, if one is configured. Logged and swallowed on failure —
    /// archival is best-effort and must never block a new session from
    /// starting.
    async fn archive(&self, session_id: &SessionId, user_id: &str) {
        let Some(semantic) = self.semantic_by_group.get("") else {
            return;
        };
        if let Err(e) = self.session_manager.archive_session(session_id, user_id, semantic).await {
            tracing::warn!(session_id = %session_id.as_str(), error = %e, "failed to archive session");
        }
    }

    async fn next_turn_number(&self, session_id: &SessionId) -> Result<u64, OrchError> {
        let turns = self
            .session_log
            .get_turns(session_id)
            .await
            .map_err(|e| OrchError::Other(Box::new(e)))?;
        Ok(turns.len() as u64 + 1)
    }

    #[allow(clippy::too_many_arguments)]
    async fn persist_turn(
        &self,
        session_id: &SessionId,
        entry_agent: &str,
        user_id: &str,
        user_message: &str,
        assistant_response: String,
        delegation_chain: Vec<String>,
        status: TurnStatus,
        started: Instant,
        metrics: &Arc<StdMutex<TurnMetrics>>,
    ) -> Result<(), OrchError> {
        let (tool_calls, skill_calls) = {
            let guard = metrics.lock().expect("turn metrics mutex poisoned");
            (guard.tool_calls.clone(), guard.skill_calls.clone())
        };
        let turn = ConversationTurn {
            session_id: session_id.clone(),
            turn: self.next_turn_number(session_id).await?,
            timestamp: chrono::Utc::now(),
            entry_agent: entry_agent.to_string(),
            user_id: Some(user_id.to_string()),
            user_message: user_message.to_string(),
            assistant_response,
            assistant_thinking: None,
            tool_calls,
            skill_calls,
            delegation_chain,
            token_usage: TokenUsage::default(),
            duration_ms: DurationMs::from_millis(started.elapsed().as_millis() as u64),
            status,
        };
        self.session_log.save_turn(&turn).await.map_err(|e| OrchError::Other(Box::new(e)))?;
        Ok(())
    }

    /// Run one user turn to completion: resolve the session, replay
    /// recent history into the root frame, then interpret control
    /// signals off a stack of frames until the root frame returns or the
    /// iteration cap is hit.
    ///
    /// `user_message == "/new"` is handled specially: it archives the
    /// previous session (if any) and mints a fresh one without stepping
    /// any agent.
    pub async fn run(
        &self,
        entry_agent: &str,
        user_message: &str,
        user_id: Option<&str>,
        on_event: impl Fn(Event) + Send + Sync + 'static,
    ) -> Result<RunOutcome, OrchError> {
        let started = Instant::now();
        let metrics = Arc::new(StdMutex::new(TurnMetrics::default()));
        let user_cb: Arc<dyn Fn(Event) + Send + Sync> = Arc::new(on_event);
        let cb: Arc<dyn Fn(Event) + Send + Sync> = {
            let metrics = Arc::clone(&metrics);
            let user_cb = Arc::clone(&user_cb);
            Arc::new(move |event: Event| {
                if let Event::ToolCall { ref tool_name, ref tool_args, ref agent_id } = event {
                    metrics.lock().expect("turn metrics mutex poisoned").tool_calls.push(ToolCallRecord {
                        agent: agent_id.clone(),
                        call: ToolCall { id: String::new(), name: tool_name.clone(), args: tool_args.clone() },
                        success: true,
                    });
                }
                user_cb(event);
            })
        };

        let user_id = user_id.unwrap_or("anonymous");

        if user_message.trim() == "/new" {
            let previous = self
                .session_manager
                .get_previous_session_id(user_id)
                .await
                .map_err(|e| OrchError::Other(Box::new(e)))?;
            let new_id = self
                .session_manager
                .force_new_session(user_id)
                .await
                .map_err(|e| OrchError::Other(Box::new(e)))?;
            if let Some(prev) = previous {
                self.archive(&prev, user_id).await;
            }
            let message = "Started a new session.".to_string();
            cb(Event::SessionNew { session_id: new_id.as_str().to_string(), message: message.clone() });
            return Ok(RunOutcome { session_id: new_id, response: message, delegation_chain: vec![] });
        }

        let resolved = self
            .session_manager
            .resolve_session(user_id, None)
            .await
            .map_err(|e| OrchError::Other(Box::new(e)))?;
        if resolved.is_new {
            if let Some(prev) = self
                .session_manager
                .get_previous_session_id(user_id)
                .await
                .map_err(|e| OrchError::Other(Box::new(e)))?
            {
                if prev != resolved.id {
                    self.archive(&prev, user_id).await;
                }
            }
        }
        let session_id = resolved.id;

        let mut history = self
            .session_log
            .get_history(&session_id, self.options.history_replay_turns)
            .await
            .map_err(|e| OrchError::Other(Box::new(e)))?;
        history.push(Message::user(user_message.to_string()));
        let mut root = TaskFrame::root(entry_agent.to_string(), user_message.to_string());
        root.memory = history;

        let mut stack: Vec<TaskFrame> = vec![root];
        let mut action_kinds: Vec<ActionType> = Vec::new();
        let mut delegation_chain: Vec<String> = vec![entry_agent.to_string()];

        for _ in 0..self.options.iteration_cap {
            let top = stack.len() - 1;

            let agent_def = match self.resolve_agent_for_frame(&stack[top]) {
                Ok(a) => a,
                Err(e) => {
                    self.persist_turn(
                        &session_id,
                        entry_agent,
                        user_id,
                        user_message,
                        "System Error".to_string(),
                        delegation_chain.clone(),
                        TurnStatus::Error,
                        started,
                        &metrics,
                    )
                    .await?;
                    tracing::error!(session_id = %session_id.as_str(), error = %e, "turn ended in error");
                    return Ok(RunOutcome { session_id, response: "System Error".to_string(), delegation_chain });
                }
            };
            let config = self.build_config(&agent_def);
            let resolver = self.tool_resolver_for(&agent_def);
            let node_id = agent_def.node_id().to_string();
            let group = agent_def.group.clone().unwrap_or_default();
            let tools = resolver.resolve(&agent_def, &node_id, &group).await;

            cb(Event::AgentStatus {
                agent_id: node_id.clone(),
                status: AgentStatus::Starting,
                message: None,
                group: agent_def.group.clone(),
            });

            let cb_step = Arc::clone(&cb);
            let mut sink = move |e: Event| cb_step(e);
            let signal = match self.runner.step(&mut stack[top], &config, &tools, &mut sink).await {
                Ok(s) => s,
                Err(e) => {
                    cb(Event::AgentStatus {
                        agent_id: node_id.clone(),
                        status: AgentStatus::Error,
                        message: Some(e.to_string()),
                        group: agent_def.group.clone(),
                    });
                    self.persist_turn(
                        &session_id,
                        entry_agent,
                        user_id,
                        user_message,
                        "System Error".to_string(),
                        delegation_chain.clone(),
                        TurnStatus::Error,
                        started,
                        &metrics,
                    )
                    .await?;
                    tracing::error!(session_id = %session_id.as_str(), error = %e, "turn ended in error");
                    return Ok(RunOutcome { session_id, response: "System Error".to_string(), delegation_chain });
                }
            };
            cb(Event::AgentStatus { agent_id: node_id.clone(), status: AgentStatus::Completed, message: None, group: agent_def.group.clone() });

            match signal {
                ControlSignal::Continue => {}

                ControlSignal::Delegate { target, instruction, tool_call_id } => match self.registry.resolve_for_delegation(&agent_def, &target) {
                    Ok(target_def) => {
                        let child_node_id = target_def.node_id().to_string();
                        if !delegation_chain.contains(&child_node_id) {
                            delegation_chain.push(child_node_id.clone());
                        }
                        stack.push(TaskFrame::child(child_node_id, instruction, tool_call_id));
                        action_kinds.push(ActionType::Delegate);
                    }
                    Err(e) => {
                        stack[top].push_message(Message::tool_result(tool_call_id, format!("Error: Permission Denied: {e}")));
                    }
                },

                ControlSignal::DelegateParallel { tasks } => {
                    let mut targets = Vec::with_capacity(tasks.len());
                    let mut perm_error = None;
                    for task in &tasks {
                        match self.registry.resolve_for_delegation(&agent_def, &task.target) {
                            Ok(def) => targets.push(def.clone()),
                            Err(e) => {
                                perm_error = Some((task.tool_call_id.clone(), format!("Error: Permission Denied: {e}")));
                                break;
                            }
                        }
                    }
                    if let Some((tool_call_id, msg)) = perm_error {
                        stack[top].push_message(Message::tool_result(tool_call_id, msg));
                    } else {
                        let target_ids: Vec<String> = targets.iter().map(|t| t.node_id().to_string()).collect();
                        cb(Event::ParallelStarted { agent_id: node_id.clone(), targets: target_ids.clone(), group: agent_def.group.clone() });
                        let results = run_parallel(self, &tasks, &targets, Arc::clone(&cb)).await;
                        for (target_node_id, tool_call_id, text) in results {
                            if !delegation_chain.contains(&target_node_id) {
                                delegation_chain.push(target_node_id.clone());
                            }
                            stack[top].push_message(Message::tool_result(tool_call_id, format!("[{target_node_id}] Result:\n{text}")));
                        }
                        cb(Event::ParallelCompleted { agent_id: node_id.clone(), targets: target_ids, group: agent_def.group.clone() });
                    }
                }

                ControlSignal::UseSkill { skill_name, args, tool_call_id } => {
                    match self.hydrate_skill(&skill_name, &args, &agent_def, tool_call_id.clone()).await {
                        Ok(child) => {
                            metrics.lock().expect("turn metrics mutex poisoned").skill_calls.push(orc_core::SkillCallRecord {
                                agent: node_id.clone(),
                                skill_name: skill_name.clone(),
                                args: args.clone(),
                            });
                            let child_name = child.agent_name.clone();
                            if !delegation_chain.contains(&child_name) {
                                delegation_chain.push(child_name);
                            }
                            stack.push(child);
                            action_kinds.push(ActionType::Skill);
                        }
                        Err(e) => {
                            stack[top].push_message(Message::tool_result(tool_call_id, format!("Error: {e}")));
                        }
                    }
                }

                ControlSignal::Return { result } => {
                    let finished = stack.pop().expect("stack non-empty: just stepped its top frame");
                    let kind = action_kinds.pop();
                    if stack.is_empty() {
                        self.persist_turn(
                            &session_id,
                            entry_agent,
                            user_id,
                            user_message,
                            result.clone(),
                            delegation_chain.clone(),
                            TurnStatus::Completed,
                            started,
                            &metrics,
                        )
                        .await?;
                        return Ok(RunOutcome { session_id, response: result, delegation_chain });
                    }
                    let parent = stack.len() - 1;
                    if let Some(tool_call_id) = finished.parent_tool_call_id.clone() {
                        stack[parent].push_message(Message::tool_result(tool_call_id.clone(), format!("Result:\n{result}")));
                        cb(Event::ActionReturn {
                            action_type: kind.unwrap_or(ActionType::Delegate),
                            from_actor: finished.agent_name.clone(),
                            to_actor: stack[parent].agent_name.clone(),
                            parent_tool_call_id: Some(tool_call_id),
                            content: result,
                        });
                    }
                }

                ControlSignal::Error { msg } => {
                    stack[top].push_message(Message::user(format!("Error: {msg}")));
                }
            }
        }

        self.persist_turn(
            &session_id,
            entry_agent,
            user_id,
            user_message,
            String::new(),
            delegation_chain.clone(),
            TurnStatus::Timeout,
            started,
            &metrics,
        )
        .await?;
        Err(OrchError::IterationCapExceeded)
    }
}
