//! `search_memory` / `remember`: agent-scoped semantic memory tools.

use crate::{ToolDyn, ToolError};
use orc_semantic::SemanticStore;
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Existing entries scoring at or above this similarity to a candidate
/// `remember` call are treated as duplicates and not re-stored.
const DEDUP_THRESHOLD: f64 = 0.95;

/// Searches an agent's semantic memory for entries similar to a query.
pub struct SearchMemoryTool {
    store: Arc<SemanticStore>,
    agent_id: String,
}

impl SearchMemoryTool {
    /// Build the tool scoped to `agent_id`'s view of `store`.
    pub fn new(store: Arc<SemanticStore>, agent_id: impl Into<String>) -> Self {
        Self { store, agent_id: agent_id.into() }
    }
}

impl ToolDyn for SearchMemoryTool {
    fn name(&self) -> &str {
        "search_memory"
    }

    fn description(&self) -> &str {
        "Search this agent's long-term memory for entries relevant to a query."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "top_k": { "type": "integer" }
            },
            "required": ["query"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let query = input
                .get("query")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidInput("missing string field 'query'".to_string()))?;
            let top_k = input.get("top_k").and_then(Value::as_u64).unwrap_or(5) as usize;

            let hits = self
                .store
                .search(query, top_k, None, Some(&self.agent_id))
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

            let results: Vec<Value> = hits
                .into_iter()
                .map(|h| json!({ "id": h.id.as_str(), "content": h.content, "score": h.score }))
                .collect();
            Ok(json!({ "results": results }))
        })
    }
}

/// Stores a new entry in an agent's semantic memory, skipping
/// near-duplicates of existing entries.
pub struct RememberTool {
    store: Arc<SemanticStore>,
    agent_id: String,
}

impl RememberTool {
    /// Build the tool scoped to `agent_id`'s view of `store`.
    pub fn new(store: Arc<SemanticStore>, agent_id: impl Into<String>) -> Self {
        Self { store, agent_id: agent_id.into() }
    }
}

impl ToolDyn for RememberTool {
    fn name(&self) -> &str {
        "remember"
    }

    fn description(&self) -> &str {
        "Store a fact in this agent's long-term memory, unless a near-duplicate already exists."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": { "type": "string" },
                "importance": { "type": "string" }
            },
            "required": ["content"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let content = input
                .get("content")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidInput("missing string field 'content'".to_string()))?;
            let importance = input.get("importance").and_then(Value::as_str);

            let existing = self
                .store
                .search(content, 1, None, Some(&self.agent_id))
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

            if let Some(top) = existing.first() {
                if top.score >= DEDUP_THRESHOLD {
                    return Ok(json!({ "status": "duplicate", "existing_id": top.id.as_str() }));
                }
            }

            let mut metadata = json!({});
            if let Some(importance) = importance {
                metadata["importance"] = json!(importance);
            }

            let id = self
                .store
                .add_entry(content, metadata, None, Some(&self.agent_id))
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
            Ok(json!({ "status": "stored", "id": id.as_str() }))
        })
    }
}
