//! [`SemanticEntry`] — one vector-indexed knowledge entry.

use crate::id::EntryId;
use serde::{Deserialize, Serialize};

/// One entry stored in (and retrieved from) the semantic store.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticEntry {
    /// Entry id, generated time-based when not supplied by the caller.
    pub id: EntryId,
    /// The entry's text content.
    pub content: String,
    /// Metadata. Always carries `timestamp` and `content_length`;
    /// optionally `agent_id`, `type`, `topic`, `importance`, `session_id`.
    pub metadata: serde_json::Value,
}

/// One scored hit returned by [`SemanticStore::search`](https://docs.rs/orc-semantic)
/// and equivalent search operations.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticHit {
    /// Matched entry id.
    pub id: EntryId,
    /// Matched entry content.
    pub content: String,
    /// Similarity score in `[0, 1]`, derived as `1 - distance`.
    pub score: f64,
    /// Metadata carried alongside the entry.
    pub metadata: serde_json::Value,
    /// Entry timestamp, duplicated from metadata for convenience.
    pub timestamp: String,
}

/// Tally returned by a compaction pass over aged entries.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummarizeStats {
    /// Entries successfully replaced by a summary.
    pub summarized_count: u64,
    /// Entries whose summarization call failed.
    pub failed_count: u64,
    /// Entries skipped (not old enough, or empty batch).
    pub skipped_count: u64,
}
