//! [`ArtifactRecord`] — metadata row over a content-addressed blob.

use crate::id::ArtifactId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata row for one artifact. Content identity is the `content_hash`;
/// an [`ArtifactRecord`] is immutable once written — only the row, never
/// the blob, is ever deleted directly (blobs are reclaimed by GC).
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Autoincrement row id.
    pub id: ArtifactId,
    /// Hex-encoded SHA-256 of the blob content.
    pub content_hash: String,
    /// Group this artifact belongs to.
    pub group_id: String,
    /// Human-readable title.
    pub title: String,
    /// Free-form tags (`sys:ephemeral`, `tool:<name>`, ...).
    pub tags: Vec<String>,
    /// Author (agent node id or user id).
    pub author: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Blob path relative to the artifacts root, e.g.
    /// `blobs/2026/07/28/ab/cd/<hash>`.
    pub path: String,
    /// Blob size in bytes.
    pub size: u64,
    /// MIME type, when known.
    pub mime: Option<String>,
}

impl ArtifactRecord {
    /// Whether this record carries the ephemeral system tag.
    pub fn is_ephemeral(&self) -> bool {
        self.tags.iter().any(|t| t == "sys:ephemeral")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_tag_detected() {
        let rec = ArtifactRecord {
            id: ArtifactId(1),
            content_hash: "abc".into(),
            group_id: "g".into(),
            title: "t".into(),
            tags: vec!["sys:ephemeral".into(), "tool:bash".into()],
            author: "a".into(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            path: "blobs/x".into(),
            size: 5,
            mime: None,
        };
        assert!(rec.is_ephemeral());
    }
}
