//! Skill proxy tools: one per skill named in an agent's tool list.
//!
//! Invoking a skill proxy does not run the skill — it only signals
//! `use_skill` back to the caller. The convention (matching
//! `AgentRunner`'s sentinel check) is that the tool's result, when
//! rendered as the resulting tool-message's text content, is the
//! literal string `__USE_SKILL__:name|args`; `AgentRunner` detects that
//! prefix on a tool-message and converts it into a
//! [`orc_core::ControlSignal::UseSkill`] rather than treating it as an
//! ordinary tool result.

use crate::{ToolDyn, ToolError};
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;

/// A tool whose invocation signals "hydrate and delegate to this skill".
pub struct SkillProxyTool {
    name: String,
    description: String,
}

impl SkillProxyTool {
    /// Build a proxy for a skill with the given name and description
    /// (typically loaded from its `SKILL.md` frontmatter).
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into() }
    }
}

impl ToolDyn for SkillProxyTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "args": { "type": "string" } }
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        let name = self.name.clone();
        Box::pin(async move {
            let args = input.get("args").and_then(Value::as_str).unwrap_or_default();
            Ok(Value::String(format!("__USE_SKILL__:{name}|{args}")))
        })
    }
}
