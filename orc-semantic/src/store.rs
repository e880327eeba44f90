//! [`SemanticStore`] — vector-indexed knowledge entries with
//! agent-scoped filters.

use crate::error::SemanticError;
use crate::summarizer::Summarizer;
use crate::vector::VectorCollection;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use orc_core::{EmbeddingProvider, EntryId, SemanticHit, SummarizeStats};
use serde_json::{json, Value};
use std::sync::Arc;

/// Entries older than this many characters are truncated before being
/// handed to the summarizer, matching the ≤200-character summary target.
const SUMMARY_MAX_CHARS: usize = 200;

/// Vector-indexed knowledge store. Wraps an [`EmbeddingProvider`] and a
/// [`VectorCollection`]; every operation either embeds text before
/// indexing/querying, or works purely against metadata.
pub struct SemanticStore {
    embedder: Arc<dyn EmbeddingProvider>,
    collection: Arc<dyn VectorCollection>,
}

impl SemanticStore {
    /// Build a store over the given embedding provider and vector
    /// collection. Callers construct one instance per agent group
    /// (pointed at that group's collection), per the memory façade.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, collection: Arc<dyn VectorCollection>) -> Self {
        Self { embedder, collection }
    }

    fn enrich_metadata(content: &str, mut metadata: Value, agent_id: Option<&str>) -> Value {
        if !metadata.is_object() {
            metadata = json!({});
        }
        let obj = metadata.as_object_mut().expect("forced to object above");
        obj.entry("timestamp").or_insert_with(|| json!(Utc::now().to_rfc3339()));
        obj.insert("content_length".into(), json!(content.chars().count()));
        if let Some(agent_id) = agent_id {
            obj.insert("agent_id".into(), json!(agent_id));
        }
        metadata
    }

    fn generate_id() -> EntryId {
        EntryId::new(format!("entry_{}", Utc::now().timestamp_nanos_opt().unwrap_or_default()))
    }

    /// Add one entry. Generates a time-based id if `id` is absent, and
    /// enriches `metadata` with `timestamp`, `content_length`, and
    /// (when supplied) `agent_id`.
    pub async fn add_entry(
        &self,
        content: impl Into<String>,
        metadata: Value,
        id: Option<EntryId>,
        agent_id: Option<&str>,
    ) -> Result<EntryId, SemanticError> {
        let content = content.into();
        let id = id.unwrap_or_else(Self::generate_id);
        let metadata = Self::enrich_metadata(&content, metadata, agent_id);

        let vectors = self
            .embedder
            .embed(std::slice::from_ref(&content))
            .await
            .map_err(|e| SemanticError::Embedding(e.to_string()))?;
        let vector = vectors.into_iter().next().unwrap_or_default();

        self.collection
            .add(vec![id.as_str().to_string()], vec![vector], vec![content], vec![metadata])
            .await?;
        Ok(id)
    }

    /// Add several entries in one `embed` call and one `add` call.
    pub async fn add_batch(
        &self,
        entries: Vec<(String, Value)>,
        agent_id: Option<&str>,
    ) -> Result<Vec<EntryId>, SemanticError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let contents: Vec<String> = entries.iter().map(|(c, _)| c.clone()).collect();
        let vectors = self
            .embedder
            .embed(&contents)
            .await
            .map_err(|e| SemanticError::Embedding(e.to_string()))?;

        let mut ids = Vec::with_capacity(entries.len());
        let mut metadatas = Vec::with_capacity(entries.len());
        for (content, metadata) in &entries {
            let id = Self::generate_id();
            metadatas.push(Self::enrich_metadata(content, metadata.clone(), agent_id));
            ids.push(id);
        }

        self.collection
            .add(
                ids.iter().map(|i| i.as_str().to_string()).collect(),
                vectors,
                contents,
                metadatas,
            )
            .await?;
        Ok(ids)
    }

    /// Search for the `k` nearest entries to `query`. `agent_id` is
    /// merged into `filter` as an equality constraint; if both specify
    /// `agent_id`, the parameter wins (a mismatch is logged).
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<Value>,
        agent_id: Option<&str>,
    ) -> Result<Vec<SemanticHit>, SemanticError> {
        let merged = merge_agent_filter(filter, agent_id);

        let vectors = self
            .embedder
            .embed(std::slice::from_ref(&query.to_string()))
            .await
            .map_err(|e| SemanticError::Embedding(e.to_string()))?;
        let vector = vectors.into_iter().next().unwrap_or_default();

        let result = self.collection.query(vector, k, merged).await?;

        let hits = result
            .ids
            .into_iter()
            .zip(result.documents)
            .zip(result.distances)
            .zip(result.metadatas)
            .map(|(((id, document), distance), metadata)| SemanticHit {
                id: EntryId::new(id),
                content: document,
                score: 1.0 - distance,
                timestamp: metadata
                    .get("timestamp")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                metadata,
            })
            .collect();
        Ok(hits)
    }

    /// For every entry older than `days`, ask `llm` for a ≤200-character
    /// summary and replace the entry with it, carrying over the
    /// original timestamp and setting `summarized = "true"`. Processes
    /// entries in batches of `batch`.
    pub async fn summarize_entries(
        &self,
        llm: &dyn Summarizer,
        days: i64,
        batch: usize,
    ) -> Result<SummarizeStats, SemanticError> {
        let cutoff = Utc::now() - ChronoDuration::days(days);
        let where_filter = json!({ "timestamp": { "$lt": cutoff.to_rfc3339() } });

        let candidates = self.collection.get(None, Some(where_filter)).await?;
        if candidates.is_empty() {
            return Ok(SummarizeStats { skipped_count: 0, ..Default::default() });
        }

        let mut stats = SummarizeStats::default();
        for chunk in candidates.chunks(batch.max(1)) {
            for record in chunk {
                match llm.summarize(&record.document, SUMMARY_MAX_CHARS).await {
                    Ok(summary) => {
                        let mut metadata = record.metadata.clone();
                        if !metadata.is_object() {
                            metadata = json!({});
                        }
                        let obj = metadata.as_object_mut().expect("forced to object above");
                        obj.insert("summarized".into(), json!("true"));
                        obj.insert("content_length".into(), json!(summary.chars().count()));

                        let vectors = self
                            .embedder
                            .embed(std::slice::from_ref(&summary))
                            .await
                            .map_err(|e| SemanticError::Embedding(e.to_string()))?;
                        let vector = vectors.into_iter().next().unwrap_or_default();

                        self.collection.delete(vec![record.id.clone()]).await?;
                        self.collection
                            .add(vec![record.id.clone()], vec![vector], vec![summary], vec![metadata])
                            .await?;
                        stats.summarized_count += 1;
                    }
                    Err(e) => {
                        tracing::warn!(entry = %record.id, error = %e, "summarization failed");
                        stats.failed_count += 1;
                    }
                }
            }
        }
        Ok(stats)
    }

    /// Number of entries currently indexed.
    pub async fn count(&self) -> Result<usize, SemanticError> {
        self.collection.count().await
    }

    /// Delete entries by id.
    pub async fn delete(&self, ids: Vec<EntryId>) -> Result<(), SemanticError> {
        self.collection
            .delete(ids.into_iter().map(|i| i.0).collect())
            .await
    }
}

/// Merge an `agent_id` equality constraint into `filter`. If both
/// specify `agent_id` and they differ, the explicit parameter wins and
/// a warning is logged.
fn merge_agent_filter(filter: Option<Value>, agent_id: Option<&str>) -> Option<Value> {
    let Some(agent_id) = agent_id else { return filter };

    let mut filter = match filter {
        Some(Value::Object(map)) => map,
        Some(other) => {
            tracing::warn!(?other, "non-object filter ignored in favor of agent_id");
            serde_json::Map::new()
        }
        None => serde_json::Map::new(),
    };

    if let Some(existing) = filter.get("agent_id") {
        if existing.as_str() != Some(agent_id) {
            tracing::warn!(
                existing = ?existing,
                agent_id,
                "agent_id parameter overrides conflicting filter value"
            );
        }
    }
    filter.insert("agent_id".into(), json!(agent_id));
    Some(Value::Object(filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::VectorRecord;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FakeEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, orc_core::RunnerError> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
        fn dimension(&self) -> usize {
            1
        }
    }

    #[derive(Default)]
    struct FakeCollection {
        rows: Mutex<HashMap<String, (Vec<f32>, String, Value)>>,
    }

    #[async_trait]
    impl VectorCollection for FakeCollection {
        async fn add(
            &self,
            ids: Vec<String>,
            vectors: Vec<Vec<f32>>,
            documents: Vec<String>,
            metadatas: Vec<Value>,
        ) -> Result<(), SemanticError> {
            let mut rows = self.rows.lock().unwrap();
            for (((id, v), d), m) in ids.into_iter().zip(vectors).zip(documents).zip(metadatas) {
                rows.insert(id, (v, d, m));
            }
            Ok(())
        }

        async fn query(
            &self,
            vector: Vec<f32>,
            n_results: usize,
            where_filter: Option<Value>,
        ) -> Result<crate::vector::VectorQueryResult, SemanticError> {
            let rows = self.rows.lock().unwrap();
            let target = vector.first().copied().unwrap_or(0.0);
            let mut scored: Vec<(String, String, f64, Value)> = rows
                .iter()
                .filter(|(_, (_, _, meta))| matches_filter(meta, &where_filter))
                .map(|(id, (v, d, m))| {
                    let dist = (v.first().copied().unwrap_or(0.0) - target).abs() as f64;
                    (id.clone(), d.clone(), dist, m.clone())
                })
                .collect();
            scored.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap());
            scored.truncate(n_results);

            let mut result = crate::vector::VectorQueryResult::default();
            for (id, doc, dist, meta) in scored {
                result.ids.push(id);
                result.documents.push(doc);
                result.distances.push(dist);
                result.metadatas.push(meta);
            }
            Ok(result)
        }

        async fn get(
            &self,
            ids: Option<Vec<String>>,
            where_filter: Option<Value>,
        ) -> Result<Vec<VectorRecord>, SemanticError> {
            let rows = self.rows.lock().unwrap();
            let out = rows
                .iter()
                .filter(|(id, (_, _, meta))| {
                    ids.as_ref().map(|wanted| wanted.contains(id)).unwrap_or(true)
                        && matches_filter(meta, &where_filter)
                })
                .map(|(id, (_, d, m))| VectorRecord {
                    id: id.clone(),
                    document: d.clone(),
                    metadata: m.clone(),
                })
                .collect();
            Ok(out)
        }

        async fn delete(&self, ids: Vec<String>) -> Result<(), SemanticError> {
            let mut rows = self.rows.lock().unwrap();
            for id in ids {
                rows.remove(&id);
            }
            Ok(())
        }

        async fn count(&self) -> Result<usize, SemanticError> {
            Ok(self.rows.lock().unwrap().len())
        }
    }

    fn matches_filter(meta: &Value, filter: &Option<Value>) -> bool {
        let Some(Value::Object(conditions)) = filter else { return true };
        conditions.iter().all(|(key, cond)| match cond {
            Value::Object(op) if op.contains_key("$lt") => {
                let bound = op["$lt"].as_str().unwrap_or_default();
                meta.get(key).and_then(|v| v.as_str()).map(|v| v < bound).unwrap_or(false)
            }
            other => meta.get(key) == Some(other),
        })
    }

    struct StubSummarizer;

    #[async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(&self, content: &str, max_chars: usize) -> Result<String, SemanticError> {
            Ok(content.chars().take(max_chars).collect())
        }
    }

    fn store() -> SemanticStore {
        SemanticStore::new(Arc::new(FakeEmbedder), Arc::new(FakeCollection::default()))
    }

    #[tokio::test]
    async fn add_entry_enriches_metadata() {
        let store = store();
        let id = store.add_entry("hello world", json!({}), None, Some("agent-1")).await.unwrap();
        let hits = store.search("hello", 5, None, Some("agent-1")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);
        assert_eq!(hits[0].metadata["agent_id"], "agent-1");
        assert!(hits[0].metadata["content_length"].is_number());
    }

    #[tokio::test]
    async fn search_is_agent_scoped() {
        let store = store();
        store.add_entry("a", json!({}), None, Some("agent-1")).await.unwrap();
        store.add_entry("b", json!({}), None, Some("agent-2")).await.unwrap();

        let hits = store.search("a", 10, None, Some("agent-1")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata["agent_id"], "agent-1");
    }

    #[tokio::test]
    async fn explicit_agent_id_wins_over_filter() {
        let store = store();
        store.add_entry("x", json!({}), None, Some("agent-1")).await.unwrap();
        let filter = json!({ "agent_id": "agent-2" });
        let hits = store.search("x", 10, Some(filter), Some("agent-1")).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn add_batch_single_embed_call() {
        let store = store();
        let ids = store
            .add_batch(vec![("a".into(), json!({})), ("b".into(), json!({}))], Some("agent-1"))
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn summarize_replaces_old_entries() {
        let store = store();
        let old_ts = (Utc::now() - ChronoDuration::days(10)).to_rfc3339();
        store
            .add_entry("a long entry that should get summarized", json!({ "timestamp": old_ts }), None, None)
            .await
            .unwrap();

        let stats = store.summarize_entries(&StubSummarizer, 5, 10).await.unwrap();
        assert_eq!(stats.summarized_count, 1);
        assert_eq!(stats.failed_count, 0);
    }
}
