//! The external vector-index seam. Deliberately out of scope to
//! implement (§1): a concrete `VectorCollection` is expected to wrap a
//! library such as a local Chroma-like store or a hosted index.

use crate::error::SemanticError;
use async_trait::async_trait;
use serde_json::Value;

/// One record as stored in (and returned by) a vector collection.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    /// The entry's id.
    pub id: String,
    /// The entry's document text.
    pub document: String,
    /// The entry's metadata.
    pub metadata: Value,
}

/// Raw results of a nearest-neighbor query, before distance-to-score
/// conversion.
#[derive(Debug, Clone, Default)]
pub struct VectorQueryResult {
    /// Matched ids, in ranked order.
    pub ids: Vec<String>,
    /// Matched documents, aligned with `ids`.
    pub documents: Vec<String>,
    /// Matched distances (lower is closer), aligned with `ids`.
    pub distances: Vec<f64>,
    /// Matched metadata, aligned with `ids`.
    pub metadatas: Vec<Value>,
}

/// The vector collection the semantic store indexes into.
///
/// Implementations own the library-specific details of embeddings
/// storage and similarity search; this crate only consumes the seam.
#[async_trait]
pub trait VectorCollection: Send + Sync {
    /// Insert or upsert records. All four vectors must be the same length.
    async fn add(
        &self,
        ids: Vec<String>,
        vectors: Vec<Vec<f32>>,
        documents: Vec<String>,
        metadatas: Vec<Value>,
    ) -> Result<(), SemanticError>;

    /// Nearest-neighbor search, optionally constrained by a metadata
    /// filter (library-defined `where` semantics).
    async fn query(
        &self,
        vector: Vec<f32>,
        n_results: usize,
        where_filter: Option<Value>,
    ) -> Result<VectorQueryResult, SemanticError>;

    /// Fetch records directly, either by id or by metadata filter
    /// (at least one of `ids`/`where_filter` is expected to be `Some`).
    async fn get(
        &self,
        ids: Option<Vec<String>>,
        where_filter: Option<Value>,
    ) -> Result<Vec<VectorRecord>, SemanticError>;

    /// Delete records by id.
    async fn delete(&self, ids: Vec<String>) -> Result<(), SemanticError>;

    /// Total number of records in the collection.
    async fn count(&self) -> Result<usize, SemanticError>;
}
