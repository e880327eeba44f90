//! # orc-semantic — vector-indexed knowledge store
//!
//! [`SemanticStore`] is the engine's tiered long-term memory: entries
//! are embedded and indexed into an external [`VectorCollection`],
//! filtered by `agent_id` so agents only ever retrieve their own
//! knowledge (or a caller-supplied broader filter), and periodically
//! compacted by [`SemanticStore::summarize_entries`].

#![deny(missing_docs)]

mod error;
mod store;
mod summarizer;
mod vector;

pub use error::SemanticError;
pub use store::SemanticStore;
pub use summarizer::Summarizer;
pub use vector::{VectorCollection, VectorQueryResult, VectorRecord};
