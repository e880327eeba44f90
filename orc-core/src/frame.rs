//! [`TaskFrame`] — one stack element of the orchestrator's call stack.

use crate::message::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One active agent invocation on the orchestrator's stack.
///
/// A frame is owned exclusively by the stack slot it occupies: on pop it
/// is consumed and its `memory` discarded. The engine does not persist
/// inter-turn agent memory; cross-turn continuity is reconstructed from
/// the session log instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFrame {
    /// Node id of the agent driving this frame.
    pub agent_name: String,
    /// Instruction the parent frame passed down (or the user's message,
    /// for the root frame).
    pub instruction: String,
    /// Ordered conversation memory local to this frame.
    pub memory: Vec<Message>,
    /// Opaque per-task scratch space, passed through unchanged.
    #[serde(default)]
    pub state: Value,
    /// Tool call id on the parent frame's last assistant message that
    /// this frame resolves, when this frame was pushed by a delegation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_tool_call_id: Option<String>,
    /// Final answer, set only once the frame has returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Synthesised configuration for a one-shot skill agent. When
    /// present, [`crate::provider`] config lookups prefer this over the
    /// registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_config: Option<Value>,
}

impl TaskFrame {
    /// Create a root frame seeded with a single user message.
    pub fn root(agent_name: impl Into<String>, user_message: impl Into<String>) -> Self {
        let instruction = user_message.into();
        Self {
            agent_name: agent_name.into(),
            instruction: instruction.clone(),
            memory: vec![Message::user(instruction)],
            state: Value::Null,
            parent_tool_call_id: None,
            result: None,
            dynamic_config: None,
        }
    }

    /// Create a child frame seeded by a delegation or skill invocation.
    pub fn child(
        agent_name: impl Into<String>,
        instruction: impl Into<String>,
        parent_tool_call_id: impl Into<String>,
    ) -> Self {
        let instruction = instruction.into();
        Self {
            agent_name: agent_name.into(),
            instruction: instruction.clone(),
            memory: vec![Message::user(instruction)],
            state: Value::Null,
            parent_tool_call_id: Some(parent_tool_call_id.into()),
            result: None,
            dynamic_config: None,
        }
    }

    /// Append a message to this frame's memory.
    pub fn push_message(&mut self, message: Message) {
        self.memory.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_frame_seeds_user_message() {
        let f = TaskFrame::root("support__leader", "compute X");
        assert_eq!(f.memory.len(), 1);
        assert_eq!(f.memory[0].text(), "compute X");
        assert!(f.parent_tool_call_id.is_none());
    }

    #[test]
    fn child_frame_carries_parent_tool_call_id() {
        let f = TaskFrame::child("support__worker", "do X", "call-1");
        assert_eq!(f.parent_tool_call_id.as_deref(), Some("call-1"));
    }
}
