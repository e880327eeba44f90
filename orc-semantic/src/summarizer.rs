//! The external model seam used by [`crate::store::SemanticStore::summarize_entries`].

use crate::error::SemanticError;
use async_trait::async_trait;

/// A model capable of condensing an entry's content into a short
/// summary. A thin seam over [`orc_core::ModelProvider`] so this crate
/// does not need to depend on the full streaming provider protocol for
/// a single non-streaming call.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `content` to at most `max_chars` characters.
    async fn summarize(&self, content: &str, max_chars: usize) -> Result<String, SemanticError>;
}
