//! `delegate_to` / `delegate_parallel`: schema-only tools.
//!
//! Neither tool ever actually executes. `AgentRunner::step` inspects the
//! assistant message's tool calls *before* running any of them: a call
//! named `delegate_to` or `delegate_parallel` is translated straight into
//! a [`orc_core::ControlSignal::Delegate`] / `DelegateParallel` and the
//! rest of the step is skipped. These types exist purely so the tool
//! shows up in the model's function-calling schema with a name,
//! description, and input shape; if one is ever reached, it signals a
//! bug in the interception logic upstream.

use crate::{ToolDyn, ToolError};
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;

/// Declares the `delegate_to(target, instruction)` tool for leader agents.
pub struct DelegateToTool {
    wildcard_target: bool,
}

impl DelegateToTool {
    /// `wildcard_target` mirrors the registry rule that an empty
    /// `sub_agents` list accepts any target name.
    pub fn new(wildcard_target: bool) -> Self {
        Self { wildcard_target }
    }
}

impl ToolDyn for DelegateToTool {
    fn name(&self) -> &str {
        "delegate_to"
    }

    fn description(&self) -> &str {
        if self.wildcard_target {
            "Delegate a sub-task to another agent by name, with an instruction."
        } else {
            "Delegate a sub-task to one of this agent's declared sub-agents, with an instruction."
        }
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "target": { "type": "string" },
                "instruction": { "type": "string" }
            },
            "required": ["target", "instruction"]
        })
    }

    fn call(
        &self,
        _input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            Err(ToolError::ExecutionFailed(
                "delegate_to must be intercepted before execution".to_string(),
            ))
        })
    }
}

/// Declares the `delegate_parallel(tasks_json)` tool for leader agents.
pub struct DelegateParallelTool;

impl ToolDyn for DelegateParallelTool {
    fn name(&self) -> &str {
        "delegate_parallel"
    }

    fn description(&self) -> &str {
        "Delegate several sub-tasks concurrently. `tasks_json` is a JSON array of {target, instruction}."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tasks_json": {
                    "type": "string",
                    "description": "JSON array of {target, instruction} objects"
                }
            },
            "required": ["tasks_json"]
        })
    }

    fn call(
        &self,
        _input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            Err(ToolError::ExecutionFailed(
                "delegate_parallel must be intercepted before execution".to_string(),
            ))
        })
    }
}
