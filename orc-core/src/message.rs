//! Conversation messages held in a [`crate::frame::TaskFrame`]'s memory.

use crate::content::Content;
use serde::{Deserialize, Serialize};

/// Who produced a message.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A human (or a delegating parent frame) addressed the agent.
    User,
    /// The model produced this message.
    Assistant,
    /// The result of executing one tool call.
    Tool,
}

/// A tool invocation requested by an assistant message.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Correlates this call with its eventual tool message.
    pub id: String,
    /// Name of the tool.
    pub name: String,
    /// Arguments, as declared by the model.
    pub args: serde_json::Value,
}

/// One entry in a [`crate::frame::TaskFrame`]'s memory.
///
/// Assistant messages may carry tool calls and a private `reasoning`
/// blob; tool messages carry the `tool_call_id` they resolve.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Who produced this message.
    pub role: Role,
    /// The message body.
    pub content: Content,
    /// Tool calls requested by this (assistant) message, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// The tool call id this (tool) message resolves, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// The model's private thinking that produced this (assistant)
    /// message, if the provider emitted one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Message {
    /// Construct a plain user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::text(text),
            tool_calls: Vec::new(),
            tool_call_id: None,
            reasoning: None,
        }
    }

    /// Construct a plain assistant message with no tool calls or reasoning.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Content::text(text),
            tool_calls: Vec::new(),
            tool_call_id: None,
            reasoning: None,
        }
    }

    /// Construct a tool-result message.
    pub fn tool_result(tool_call_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Content::text(text),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
            reasoning: None,
        }
    }

    /// Attach tool calls to this message (builder style).
    pub fn with_tool_calls(mut self, calls: Vec<ToolCall>) -> Self {
        self.tool_calls = calls;
        self
    }

    /// Attach reasoning to this message (builder style).
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Plain-text view of the content, for token estimation and logging.
    pub fn text(&self) -> &str {
        self.content.as_text().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_result_carries_call_id() {
        let m = Message::tool_result("call-1", "42");
        assert_eq!(m.role, Role::Tool);
        assert_eq!(m.tool_call_id.as_deref(), Some("call-1"));
        assert_eq!(m.text(), "42");
    }

    #[test]
    fn assistant_builder_chain() {
        let m = Message::assistant("thinking done")
            .with_reasoning("because X")
            .with_tool_calls(vec![ToolCall {
                id: "c1".into(),
                name: "read_file".into(),
                args: serde_json::json!({"path": "x.txt"}),
            }]);
        assert_eq!(m.reasoning.as_deref(), Some("because X"));
        assert_eq!(m.tool_calls.len(), 1);
    }
}
