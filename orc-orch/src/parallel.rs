//! Concurrent sub-agent execution for `delegate_parallel`.

use crate::Orchestrator;
use orc_core::{ControlSignal, Event, Message, OrchError, ParallelTask, TaskFrame};
use orc_registry::AgentDef;
use std::sync::Arc;

/// Run every `(task, target)` pair as an isolated sub-agent loop
/// concurrently. A target that errors is retried exactly once; if the
/// retry also fails, its result is replaced by an error string rather
/// than propagating. Returns `(target_node_id, tool_call_id,
/// result_text)` triples in target-declaration order, regardless of
/// completion order.
pub(crate) async fn run_parallel(
    orchestrator: &Orchestrator,
    tasks: &[ParallelTask],
    targets: &[AgentDef],
    on_event: Arc<dyn Fn(Event) + Send + Sync>,
) -> Vec<(String, String, String)> {
    let iteration_cap = orchestrator.options().iteration_cap;
    let mut handles = Vec::with_capacity(tasks.len());

    for (task, target) in tasks.iter().zip(targets.iter()) {
        let runner = orchestrator.runner();
        let resolver = Arc::new(orchestrator.tool_resolver_for(target));
        let config = orchestrator.build_config(target);
        let target = target.clone();
        let node_id = target.node_id().to_string();
        let group = target.group.clone().unwrap_or_default();
        let tool_call_id = task.tool_call_id.clone();
        let instruction = task.instruction.clone();
        let cb = Arc::clone(&on_event);
        let label = node_id.clone();

        let handle = tokio::spawn(async move {
            let tools = resolver.resolve(&target, &node_id, &group).await;
            let first = run_isolated_agent(
                Arc::clone(&runner),
                &target,
                &config,
                &tools,
                instruction.clone(),
                iteration_cap,
                Arc::clone(&cb),
            )
            .await;

            match first {
                Ok(text) => text,
                Err(_first_err) => {
                    let retry_tools = resolver.resolve(&target, &node_id, &group).await;
                    match run_isolated_agent(runner, &target, &config, &retry_tools, instruction, iteration_cap, cb).await {
                        Ok(text) => text,
                        Err(second_err) => format!("Error: Agent {node_id} failed after retry: {second_err}"),
                    }
                }
            }
        });
        handles.push((label, tool_call_id, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (node_id, tool_call_id, handle) in handles {
        let text = match handle.await {
            Ok(text) => text,
            Err(join_err) => format!("Error: Agent {node_id} failed after retry: {join_err}"),
        };
        results.push((node_id, tool_call_id, text));
    }
    results
}

/// Step `agent` through its own control-signal loop in isolation:
/// `continue`/`error` keep stepping, `return` yields the final result,
/// and any delegation signal is refused outright — nested delegation is
/// not permitted inside a parallel sub-agent.
async fn run_isolated_agent(
    runner: Arc<orc_agent::AgentRunner>,
    agent: &AgentDef,
    config: &orc_agent::AgentConfig,
    tools: &orc_tool::ToolRegistry,
    instruction: String,
    iteration_cap: usize,
    on_event: Arc<dyn Fn(Event) + Send + Sync>,
) -> Result<String, OrchError> {
    let mut frame = TaskFrame::root(agent.node_id().to_string(), instruction);
    for _ in 0..iteration_cap {
        let cb = Arc::clone(&on_event);
        let mut sink = move |e: Event| cb(e);
        let signal = runner.step(&mut frame, config, tools, &mut sink).await.map_err(OrchError::Runner)?;
        match signal {
            ControlSignal::Continue => continue,
            ControlSignal::Return { result } => return Ok(result),
            ControlSignal::Error { msg } => {
                frame.push_message(Message::user(format!("Error: {msg}")));
            }
            ControlSignal::Delegate { .. } | ControlSignal::DelegateParallel { .. } | ControlSignal::UseSkill { .. } => {
                return Err(OrchError::Other(Box::new(std::io::Error::other(
                    "nested delegation is not permitted inside a parallel sub-agent",
                ))));
            }
        }
    }
    Err(OrchError::IterationCapExceeded)
}
