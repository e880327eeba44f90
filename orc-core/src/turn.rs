//! [`ConversationTurn`] — one appended record in the session log.

use crate::duration::DurationMs;
use crate::id::SessionId;
use crate::message::ToolCall;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a turn ended.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// The root frame returned normally.
    Completed,
    /// The orchestrator hit its iteration cap.
    Timeout,
    /// An unhandled exception propagated to the main loop.
    Error,
}

/// A tool call made somewhere during a turn, flattened for the log.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Node id of the agent that made the call.
    pub agent: String,
    /// The call itself.
    pub call: ToolCall,
    /// Whether the call succeeded.
    pub success: bool,
}

/// A skill invocation made somewhere during a turn.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCallRecord {
    /// Node id of the agent that invoked the skill.
    pub agent: String,
    /// Name of the skill invoked.
    pub skill_name: String,
    /// Raw argument string passed to the skill.
    pub args: String,
}

/// Token usage counters for one turn.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed across all prompts in this turn.
    pub prompt_tokens: u64,
    /// Tokens generated across all completions in this turn.
    pub completion_tokens: u64,
}

/// One appended record in the session log: everything about a single
/// user turn, start to finish.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Session this turn belongs to.
    pub session_id: SessionId,
    /// 1-based turn number, monotone within the session.
    pub turn: u64,
    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
    /// Node id of the entry agent for this turn.
    pub entry_agent: String,
    /// The user id, omitted from the JSONL row when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// The raw user message.
    pub user_message: String,
    /// The final assistant response content.
    pub assistant_response: String,
    /// The final assistant response's reasoning, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_thinking: Option<String>,
    /// Every tool call made while producing this turn.
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRecord>,
    /// Every skill invocation made while producing this turn.
    #[serde(default)]
    pub skill_calls: Vec<SkillCallRecord>,
    /// Node ids of every frame pushed during this turn, in first-appearance order.
    #[serde(default)]
    pub delegation_chain: Vec<String>,
    /// Token usage for the turn.
    #[serde(default)]
    pub token_usage: TokenUsage,
    /// Wall-clock duration of the turn.
    pub duration_ms: DurationMs,
    /// How the turn ended.
    pub status: TurnStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_omitted_when_none() {
        let turn = ConversationTurn {
            session_id: SessionId::build("u", "2026-02-27", 0),
            turn: 1,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            entry_agent: "leader".into(),
            user_id: None,
            user_message: "hi".into(),
            assistant_response: "hello".into(),
            assistant_thinking: None,
            tool_calls: vec![],
            skill_calls: vec![],
            delegation_chain: vec!["leader".into()],
            token_usage: TokenUsage::default(),
            duration_ms: DurationMs::from_millis(10),
            status: TurnStatus::Completed,
        };
        let json = serde_json::to_string(&turn).unwrap();
        assert!(!json.contains("user_id"));
    }
}
