//! [`AgentRunner`] — one step of one agent.

use crate::config::{AgentConfig, AgentRunnerOptions};
use crate::render::render_tool_output;
use futures::StreamExt;
use orc_artifacts::ArtifactStore;
use orc_context::ContextBuilder;
use orc_core::{ControlSignal, Event, Message, ModelProvider, ParallelTask, Role, RunnerError, StreamType, TaskFrame};
use orc_tool::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;

const USE_SKILL_SENTINEL: &str = "__USE_SKILL__:";

/// Drives one call to `step(frame)`: prompt assembly, context construction,
/// a streamed model call, tool execution, and emission of one
/// [`ControlSignal`].
///
/// Holds no per-frame state itself — everything it needs for a step
/// arrives as arguments, so one `AgentRunner` is reused across every
/// frame on the orchestrator's stack, including the independent
/// sub-agent loops spawned for parallel delegation.
pub struct AgentRunner {
    model: Arc<dyn ModelProvider>,
    context_builder: ContextBuilder,
    artifacts: Option<Arc<ArtifactStore>>,
    options: AgentRunnerOptions,
}

impl AgentRunner {
    /// Build a runner around a bound model provider and context builder,
    /// optionally wiring in an artifact store for tool-output offloading.
    pub fn new(
        model: Arc<dyn ModelProvider>,
        context_builder: ContextBuilder,
        artifacts: Option<Arc<ArtifactStore>>,
    ) -> Self {
        Self {
            model,
            context_builder,
            artifacts,
            options: AgentRunnerOptions::default(),
        }
    }

    /// Override the default tunables (builder style).
    pub fn with_options(mut self, options: AgentRunnerOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one step of `config`'s agent against `frame`, executing
    /// whatever tool calls the model makes and returning the resulting
    /// [`ControlSignal`].
    ///
    /// `frame.memory` is appended to in place: the assistant message
    /// produced by this step, and any tool-result messages from
    /// executing its tool calls, become part of the frame's permanent
    /// history regardless of which signal is returned.
    pub async fn step(
        &self,
        frame: &mut TaskFrame,
        config: &AgentConfig,
        tools: &ToolRegistry,
        on_event: &mut dyn FnMut(Event),
    ) -> Result<ControlSignal, RunnerError> {
        let system_message = Message::assistant(assemble_system_prompt(config));

        let limit = self.context_builder.model_limit(&config.model);
        let mut outgoing = self.context_builder.build_context(&system_message, &frame.memory, limit);
        truncate_reasoning_except_last(&mut outgoing);

        let schemas = tools
            .iter()
            .map(|tool| orc_core::ToolSchema {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect();

        let bound = self.model.bind_tools(schemas).await;
        let mut stream = bound.stream(&outgoing).await?;

        let mut content = String::new();
        let mut reasoning = String::new();
        let mut tool_calls = Vec::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(piece) = chunk.content {
                on_event(Event::Stream {
                    agent_id: config.agent_id.clone(),
                    stream_type: StreamType::Answer,
                    content: piece.clone(),
                    agent_color: None,
                });
                content.push_str(&piece);
            }
            if let Some(piece) = chunk.reasoning {
                on_event(Event::Stream {
                    agent_id: config.agent_id.clone(),
                    stream_type: StreamType::Thinking,
                    content: piece.clone(),
                    agent_color: None,
                });
                reasoning.push_str(&piece);
                if reasoning.chars().count() > self.options.max_reasoning_chars {
                    return Ok(ControlSignal::Error {
                        msg: format!(
                            "reasoning exceeded {} characters",
                            self.options.max_reasoning_chars
                        ),
                    });
                }
            }
            tool_calls.extend(chunk.tool_calls);
        }

        let mut assistant = Message::assistant(content.clone());
        if !reasoning.is_empty() {
            assistant = assistant.with_reasoning(reasoning);
        }
        if !tool_calls.is_empty() {
            assistant = assistant.with_tool_calls(tool_calls.clone());
        }
        frame.push_message(assistant);

        if tool_calls.is_empty() {
            return Ok(ControlSignal::Return { result: content });
        }

        if let Some(call) = tool_calls.iter().find(|c| c.name == "delegate_to") {
            let target = call.args.get("target").and_then(Value::as_str).unwrap_or_default().to_string();
            let instruction = call.args.get("instruction").and_then(Value::as_str).unwrap_or_default().to_string();
            let tool_call_id = call.id.clone();
            if let Some(last) = frame.memory.last_mut() {
                last.tool_calls = vec![call.clone()];
            }
            return Ok(ControlSignal::Delegate { target, instruction, tool_call_id });
        }

        if let Some(call) = tool_calls.iter().find(|c| c.name == "delegate_parallel") {
            let tasks_json = call.args.get("tasks_json").and_then(Value::as_str).unwrap_or_default();
            let raw: Vec<Value> = serde_json::from_str(tasks_json).map_err(|e| RunnerError::ToolFailure {
                tool: "delegate_parallel".to_string(),
                message: format!("malformed tasks_json: {e}"),
            })?;
            let tasks = raw
                .into_iter()
                .map(|t| ParallelTask {
                    target: t.get("target").and_then(Value::as_str).unwrap_or_default().to_string(),
                    instruction: t.get("instruction").and_then(Value::as_str).unwrap_or_default().to_string(),
                    tool_call_id: call.id.clone(),
                })
                .collect();
            return Ok(ControlSignal::DelegateParallel { tasks });
        }

        let mut use_skill = None;
        for call in &tool_calls {
            on_event(Event::ToolCall {
                tool_name: call.name.clone(),
                tool_args: call.args.clone(),
                agent_id: config.agent_id.clone(),
            });

            let text = match tools.get(&call.name) {
                Some(tool) => match tool.call(call.args.clone()).await {
                    Ok(value) => {
                        let rendered = render_tool_output(&value);
                        self.offload_if_needed(config, &call.name, rendered).await?
                    }
                    Err(e) => format!("Error: {e}"),
                },
                None => format!("Error: tool not found: {}", call.name),
            };

            on_event(Event::ToolResult {
                content: text.clone(),
                agent_id: config.agent_id.clone(),
            });

            if use_skill.is_none() {
                if let Some(rest) = text.strip_prefix(USE_SKILL_SENTINEL) {
                    let (skill_name, args) = rest.split_once('|').unwrap_or((rest, ""));
                    use_skill = Some((skill_name.to_string(), args.to_string(), call.id.clone()));
                }
            }

            frame.push_message(Message::tool_result(call.id.clone(), text));
        }

        if let Some((skill_name, args, tool_call_id)) = use_skill {
            return Ok(ControlSignal::UseSkill { skill_name, args, tool_call_id });
        }

        Ok(ControlSignal::Continue)
    }

    /// Offload `rendered` to an ephemeral artifact if it exceeds the
    /// configured threshold and an artifact store is available;
    /// otherwise return it unchanged.
    async fn offload_if_needed(
        &self,
        config: &AgentConfig,
        tool_name: &str,
        rendered: String,
    ) -> Result<String, RunnerError> {
        if rendered.chars().count() <= self.options.offload_threshold_chars {
            return Ok(rendered);
        }
        let Some(store) = &self.artifacts else {
            return Ok(rendered);
        };

        let group = config.group.as_deref().unwrap_or(&config.agent_id).to_string();
        let tags = vec!["sys:ephemeral".to_string(), format!("tool:{tool_name}")];
        let id = store
            .save(
                rendered.clone().into_bytes(),
                format!("tool output: {tool_name}"),
                config.agent_id.clone(),
                group,
                tags,
                None,
            )
            .await
            .map_err(|e| RunnerError::Other(Box::new(e)))?;

        let head: String = rendered.chars().take(500).collect();
        let tail_start = rendered.chars().count().saturating_sub(200);
        let tail: String = rendered.chars().skip(tail_start).collect();
        Ok(format!("{head}\n...[offloaded {} chars to artifact {id}]...\n{tail}", rendered.chars().count()))
    }
}

/// Render the agent's base system prompt, the optional "Available
/// Sub-Agents" block, and the optional group shared-context block into
/// one string.
fn assemble_system_prompt(config: &AgentConfig) -> String {
    let mut prompt = config.system_prompt.clone();

    if !config.sub_agents.is_empty() {
        prompt.push_str("\n\nAvailable Sub-Agents:\n");
        for sub in &config.sub_agents {
            prompt.push_str(&format!("- {}: {}\n", sub.node_id, sub.description));
        }
    }

    if let Some(context) = &config.group_shared_context {
        let len = context.chars().count();
        if len > 1000 {
            tracing::warn!(agent_id = %config.agent_id, len, "group shared context exceeds 1000 characters");
        }
        prompt.push_str("\n\nGroup Shared Context:\n");
        prompt.push_str(context);
    }

    prompt
}

/// Strip reasoning from every assistant message except the last one in
/// `messages`, so outgoing requests don't re-send every prior turn's
/// private thinking. Operates only on the list being sent to the model;
/// `TaskFrame::memory` itself always keeps full reasoning.
fn truncate_reasoning_except_last(messages: &mut [Message]) {
    let last_assistant = messages.iter().rposition(|m| m.role == Role::Assistant);
    for (idx, message) in messages.iter_mut().enumerate() {
        if message.role == Role::Assistant && Some(idx) != last_assistant {
            message.reasoning = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubAgentDescriptor;
    use orc_core::test_utils::FakeModelProvider;
    use orc_core::test_utils::fake_model::ScriptedStep;
    use orc_core::ToolCall;
    use orc_tool::delegation::{DelegateParallelTool, DelegateToTool};
    use orc_tool::skill_proxy::SkillProxyTool;
    use orc_tool::{ToolDyn, ToolError};
    use serde_json::json;
    use std::future::Future;
    use std::pin::Pin;

    fn config(agent_id: &str) -> AgentConfig {
        AgentConfig {
            agent_id: agent_id.to_string(),
            system_prompt: "You are a helper.".to_string(),
            model: "test-model".to_string(),
            group: Some("support".to_string()),
            sub_agents: vec![],
            group_shared_context: None,
        }
    }

    fn runner(provider: FakeModelProvider) -> AgentRunner {
        AgentRunner::new(Arc::new(provider), ContextBuilder::default(), None)
    }

    struct EchoTool;

    impl ToolDyn for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes input"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
            Box::pin(async move { Ok(json!({"content": input.get("msg").cloned().unwrap_or(Value::Null)})) })
        }
    }

    struct FailingTool;

    impl ToolDyn for FailingTool {
        fn name(&self) -> &str {
            "boom"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        fn call(&self, _input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
            Box::pin(async { Err(ToolError::ExecutionFailed("kaboom".to_string())) })
        }
    }

    #[tokio::test]
    async fn no_tool_calls_returns_final_answer() {
        let provider = FakeModelProvider::new(vec![ScriptedStep {
            content: "hello there".to_string(),
            ..Default::default()
        }]);
        let runner = runner(provider);
        let mut frame = TaskFrame::root("support__leader", "hi");
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(EchoTool));

        let signal = runner
            .step(&mut frame, &config("support__leader"), &tools, &mut |_| {})
            .await
            .unwrap();

        assert_eq!(signal, ControlSignal::Return { result: "hello there".to_string() });
        assert_eq!(frame.memory.last().unwrap().text(), "hello there");
    }

    #[tokio::test]
    async fn executes_tool_calls_and_continues() {
        let provider = FakeModelProvider::new(vec![ScriptedStep {
            content: String::new(),
            tool_calls: vec![ToolCall { id: "c1".into(), name: "echo".into(), args: json!({"msg": "42"}) }],
            ..Default::default()
        }]);
        let runner = runner(provider);
        let mut frame = TaskFrame::root("support__leader", "echo 42");
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(EchoTool));

        let signal = runner
            .step(&mut frame, &config("support__leader"), &tools, &mut |_| {})
            .await
            .unwrap();

        assert_eq!(signal, ControlSignal::Continue);
        let tool_message = frame.memory.iter().find(|m| m.role == Role::Tool).unwrap();
        assert_eq!(tool_message.text(), "42");
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn failing_tool_call_surfaces_error_text_and_continues() {
        let provider = FakeModelProvider::new(vec![ScriptedStep {
            content: String::new(),
            tool_calls: vec![ToolCall { id: "c1".into(), name: "boom".into(), args: json!({}) }],
            ..Default::default()
        }]);
        let runner = runner(provider);
        let mut frame = TaskFrame::root("support__leader", "do it");
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(FailingTool));

        let signal = runner
            .step(&mut frame, &config("support__leader"), &tools, &mut |_| {})
            .await
            .unwrap();

        assert_eq!(signal, ControlSignal::Continue);
        let tool_message = frame.memory.iter().find(|m| m.role == Role::Tool).unwrap();
        assert!(tool_message.text().starts_with("Error:"));
    }

    #[tokio::test]
    async fn delegate_to_call_is_intercepted_before_execution() {
        let provider = FakeModelProvider::new(vec![ScriptedStep {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "c1".into(),
                name: "delegate_to".into(),
                args: json!({"target": "support__worker", "instruction": "do X"}),
            }],
            ..Default::default()
        }]);
        let runner = runner(provider);
        let mut frame = TaskFrame::root("support__leader", "compute X");
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(DelegateToTool::new(false)));

        let signal = runner
            .step(&mut frame, &config("support__leader"), &tools, &mut |_| {})
            .await
            .unwrap();

        assert_eq!(
            signal,
            ControlSignal::Delegate {
                target: "support__worker".to_string(),
                instruction: "do X".to_string(),
                tool_call_id: "c1".to_string(),
            }
        );
        assert!(frame.memory.iter().all(|m| m.role != Role::Tool));
    }

    #[tokio::test]
    async fn delegate_parallel_decodes_task_list() {
        let tasks_json = json!([
            {"target": "analyst", "instruction": "analyze"},
            {"target": "researcher", "instruction": "research"},
        ])
        .to_string();
        let provider = FakeModelProvider::new(vec![ScriptedStep {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "c1".into(),
                name: "delegate_parallel".into(),
                args: json!({"tasks_json": tasks_json}),
            }],
            ..Default::default()
        }]);
        let runner = runner(provider);
        let mut frame = TaskFrame::root("support__leader", "fan out");
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(DelegateParallelTool));

        let signal = runner
            .step(&mut frame, &config("support__leader"), &tools, &mut |_| {})
            .await
            .unwrap();

        match signal {
            ControlSignal::DelegateParallel { tasks } => {
                assert_eq!(tasks.len(), 2);
                assert_eq!(tasks[0].target, "analyst");
                assert_eq!(tasks[1].target, "researcher");
            }
            other => panic!("expected DelegateParallel, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn skill_sentinel_is_translated_to_use_skill_signal() {
        let provider = FakeModelProvider::new(vec![ScriptedStep {
            content: String::new(),
            tool_calls: vec![ToolCall { id: "c1".into(), name: "summarize".into(), args: json!({"args": "the doc"}) }],
            ..Default::default()
        }]);
        let runner = runner(provider);
        let mut frame = TaskFrame::root("support__leader", "summarize please");
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(SkillProxyTool::new("summarize", "Summarize text")));

        let signal = runner
            .step(&mut frame, &config("support__leader"), &tools, &mut |_| {})
            .await
            .unwrap();

        assert_eq!(
            signal,
            ControlSignal::UseSkill {
                skill_name: "summarize".to_string(),
                args: "the doc".to_string(),
                tool_call_id: "c1".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn reasoning_overflow_returns_error_signal() {
        let provider = FakeModelProvider::new(vec![ScriptedStep {
            content: "done".to_string(),
            reasoning: Some("x".repeat(10)),
            ..Default::default()
        }]);
        let runner = AgentRunner::new(Arc::new(provider), ContextBuilder::default(), None)
            .with_options(AgentRunnerOptions { max_reasoning_chars: 5, offload_threshold_chars: 2_000 });
        let mut frame = TaskFrame::root("support__leader", "think hard");
        let tools = ToolRegistry::new();

        let signal = runner
            .step(&mut frame, &config("support__leader"), &tools, &mut |_| {})
            .await
            .unwrap();

        assert!(matches!(signal, ControlSignal::Error { .. }));
    }

    #[tokio::test]
    async fn sub_agent_list_and_shared_context_are_injected_into_prompt() {
        let cfg = AgentConfig {
            agent_id: "support__leader".to_string(),
            system_prompt: "Base prompt.".to_string(),
            model: "test-model".to_string(),
            group: Some("support".to_string()),
            sub_agents: vec![SubAgentDescriptor {
                node_id: "support__worker".to_string(),
                description: "Does the work".to_string(),
            }],
            group_shared_context: Some("shared facts".to_string()),
        };
        let prompt = assemble_system_prompt(&cfg);
        assert!(prompt.contains("Base prompt."));
        assert!(prompt.contains("support__worker: Does the work"));
        assert!(prompt.contains("shared facts"));
    }

    #[test]
    fn reasoning_is_truncated_on_all_but_the_last_assistant_message() {
        let mut messages = vec![
            Message::assistant("sys"),
            Message::assistant("first").with_reasoning("r1"),
            Message::tool_result("c1", "42"),
            Message::assistant("second").with_reasoning("r2"),
        ];
        truncate_reasoning_except_last(&mut messages);
        assert_eq!(messages[1].reasoning, None);
        assert_eq!(messages[3].reasoning.as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn large_tool_output_is_offloaded_to_an_artifact() {
        use orc_workspace::Workspace;
        use tempfile::TempDir;

        struct BigTool;
        impl ToolDyn for BigTool {
            fn name(&self) -> &str {
                "big"
            }
            fn description(&self) -> &str {
                "Returns a lot of text"
            }
            fn input_schema(&self) -> Value {
                json!({"type": "object"})
            }
            fn call(&self, _input: Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
                Box::pin(async move { Ok(Value::String("x".repeat(3_000))) })
            }
        }

        let tmp = TempDir::new().unwrap();
        let workspace = Workspace::new(tmp.path()).unwrap();
        let store = Arc::new(ArtifactStore::open(&workspace).await.unwrap());

        let provider = FakeModelProvider::new(vec![ScriptedStep {
            content: String::new(),
            tool_calls: vec![ToolCall { id: "c1".into(), name: "big".into(), args: json!({}) }],
            ..Default::default()
        }]);
        let runner = AgentRunner::new(Arc::new(provider), ContextBuilder::default(), Some(store.clone()));
        let mut frame = TaskFrame::root("support__leader", "fetch a lot");
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(BigTool));

        runner.step(&mut frame, &config("support__leader"), &tools, &mut |_| {}).await.unwrap();

        let tool_message = frame.memory.iter().find(|m| m.role == Role::Tool).unwrap();
        assert!(tool_message.text().contains("offloaded"));
        assert!(tool_message.text().len() < 3_000);
    }
}
