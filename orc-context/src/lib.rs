//! # orc-context — token accounting and context assembly
//!
//! Two small, composable pieces:
//!
//! - [`TokenCounter`] estimates the token cost of a message or a list of
//!   messages, and knows the context-window limit of a model by name.
//! - [`ContextBuilder`] walks a frame's history newest-first under a
//!   token budget, producing the exact message list to send to the
//!   model: the system prompt (priority 0, always kept) followed by as
//!   much recent history (priority 1) as still fits.

#![deny(missing_docs)]

mod builder;
mod counter;
mod error;

pub use builder::{ContextBuilder, ContextBuilderConfig};
pub use counter::{TokenCounter, TokenCounterConfig};
pub use error::ContextError;
