//! `save_artifact` / `read_artifact` / `list_artifacts` / `delete_artifact`:
//! tools over the content-addressed artifact store.

use crate::{ToolDyn, ToolError};
use orc_artifacts::ArtifactStore;
use orc_core::ArtifactId;
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

fn artifact_id_arg(input: &Value) -> Result<ArtifactId, ToolError> {
    let id = input
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| ToolError::InvalidInput("missing integer field 'id'".to_string()))?;
    Ok(ArtifactId(id))
}

/// Saves content to the artifact store under this agent's authorship.
pub struct SaveArtifactTool {
    store: Arc<ArtifactStore>,
    author: String,
    group: String,
}

impl SaveArtifactTool {
    /// Build the tool, attributing saved artifacts to `author` within `group`.
    pub fn new(store: Arc<ArtifactStore>, author: impl Into<String>, group: impl Into<String>) -> Self {
        Self { store, author: author.into(), group: group.into() }
    }
}

impl ToolDyn for SaveArtifactTool {
    fn name(&self) -> &str {
        "save_artifact"
    }

    fn description(&self) -> &str {
        "Save content to the shared artifact store, returning its id."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": { "type": "string" },
                "title": { "type": "string" },
                "tags": { "type": "array", "items": { "type": "string" } },
                "mime": { "type": "string" }
            },
            "required": ["content", "title"]
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
                .ok_or_else(|| ToolError::InvalidInput("missing string field 'content'".to_string()))?
                .to_string();
            let title = input
                .get("title")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidInput("missing string field 'title'".to_string()))?
                .to_string();
            let tags: Vec<String> = input
                .get("tags")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                .unwrap_or_default();
            let mime = input.get("mime").and_then(Value::as_str).map(String::from);

            let id = self
                .store
                .save(content.into_bytes(), title, self.author.clone(), self.group.clone(), tags, mime)
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
            Ok(json!({ "id": id.0 }))
        })
    }
}

/// Reads one artifact's content back by id.
pub struct ReadArtifactTool {
    store: Arc<ArtifactStore>,
}

impl ReadArtifactTool {
    /// Build the tool over `store`.
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }
}

impl ToolDyn for ReadArtifactTool {
    fn name(&self) -> &str {
        "read_artifact"
    }

    fn description(&self) -> &str {
        "Read an artifact's content and metadata by id."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "id": { "type": "integer" } },
            "required": ["id"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let id = artifact_id_arg(&input)?;
            let artifact = self
                .store
                .get(id)
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?
                .ok_or_else(|| ToolError::NotFound(format!("artifact {}", id.0)))?;

            Ok(json!({
                "id": artifact.metadata.id.0,
                "title": artifact.metadata.title,
                "content": String::from_utf8_lossy(&artifact.content),
                "tags": artifact.metadata.tags,
                "author": artifact.metadata.author,
                "mime": artifact.metadata.mime,
            }))
        })
    }
}

/// Lists artifact metadata, optionally filtered by group and/or tag.
pub struct ListArtifactsTool {
    store: Arc<ArtifactStore>,
    group: String,
}

impl ListArtifactsTool {
    /// Build the tool, defaulting listings to this agent's `group`.
    pub fn new(store: Arc<ArtifactStore>, group: impl Into<String>) -> Self {
        Self { store, group: group.into() }
    }
}

impl ToolDyn for ListArtifactsTool {
    fn name(&self) -> &str {
        "list_artifacts"
    }

    fn description(&self) -> &str {
        "List artifacts in this agent's group, optionally filtered by tag."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "tag": { "type": "string" } }
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let tag = input.get("tag").and_then(Value::as_str).map(String::from);
            let records = self
                .store
                .list(Some(self.group.clone()), tag)
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

            let items: Vec<Value> = records
                .into_iter()
                .map(|r| {
                    json!({
                        "id": r.id.0,
                        "title": r.title,
                        "tags": r.tags,
                        "author": r.author,
                        "size": r.size,
                    })
                })
                .collect();
            Ok(json!({ "artifacts": items }))
        })
    }
}

/// Deletes an artifact's metadata row by id.
pub struct DeleteArtifactTool {
    store: Arc<ArtifactStore>,
}

impl DeleteArtifactTool {
    /// Build the tool over `store`.
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }
}

impl ToolDyn for DeleteArtifactTool {
    fn name(&self) -> &str {
        "delete_artifact"
    }

    fn description(&self) -> &str {
        "Delete an artifact's metadata row by id. The underlying blob is reclaimed separately by garbage collection."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "id": { "type": "integer" } },
            "required": ["id"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let id = artifact_id_arg(&input)?;
            self.store
                .delete(id)
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
            Ok(json!({ "deleted": id.0 }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_workspace::Workspace;
    use tempfile::tempdir;

    async fn store() -> Arc<ArtifactStore> {
        let dir = tempdir().unwrap();
        let workspace = Workspace::new(dir.path()).unwrap();
        Arc::new(ArtifactStore::open(&workspace).await.unwrap())
    }

    #[tokio::test]
    async fn save_then_read_round_trips() {
        let store = store().await;
        let save = SaveArtifactTool::new(Arc::clone(&store), "agent-a", "group-a");
        let result = save
            .call(json!({"content": "hello", "title": "note", "tags": ["demo"]}))
            .await
            .unwrap();
        let id = result["id"].as_i64().unwrap();

        let read = ReadArtifactTool::new(Arc::clone(&store));
        let fetched = read.call(json!({"id": id})).await.unwrap();
        assert_eq!(fetched["content"], "hello");
        assert_eq!(fetched["author"], "agent-a");
    }

    #[tokio::test]
    async fn list_filters_by_group_and_tag() {
        let store = store().await;
        let save = SaveArtifactTool::new(Arc::clone(&store), "agent-a", "group-a");
        save.call(json!({"content": "x", "title": "t1", "tags": ["keep"]})).await.unwrap();
        save.call(json!({"content": "y", "title": "t2", "tags": ["drop"]})).await.unwrap();

        let list = ListArtifactsTool::new(Arc::clone(&store), "group-a");
        let all = list.call(json!({})).await.unwrap();
        assert_eq!(all["artifacts"].as_array().unwrap().len(), 2);

        let filtered = list.call(json!({"tag": "keep"})).await.unwrap();
        assert_eq!(filtered["artifacts"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_artifact() {
        let store = store().await;
        let save = SaveArtifactTool::new(Arc::clone(&store), "agent-a", "group-a");
        let result = save.call(json!({"content": "z", "title": "t"})).await.unwrap();
        let id = result["id"].as_i64().unwrap();

        let delete = DeleteArtifactTool::new(Arc::clone(&store));
        delete.call(json!({"id": id})).await.unwrap();

        let read = ReadArtifactTool::new(Arc::clone(&store));
        assert!(read.call(json!({"id": id})).await.is_err());
    }
}
