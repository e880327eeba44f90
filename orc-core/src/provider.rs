//! External model and embedding adapters (§6). The engine consumes these
//! traits; it never implements a language model or an embedding model
//! itself.

use crate::error::RunnerError;
use crate::message::{Message, ToolCall};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One incremental chunk of a streamed model response.
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StreamChunk {
    /// Incremental visible content, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Incremental private reasoning, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Tool calls emitted with this chunk, if the provider emits them
    /// incrementally rather than all at once at stream end.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

/// A tool's JSON-schema description, handed to [`ModelProvider::bind_tools`].
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name, as the model will reference it in a tool call.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON Schema for the tool's input object.
    pub input_schema: Value,
}

/// A model adapter bound to a fixed set of tools, ready to stream.
#[async_trait]
pub trait BoundModel: Send + Sync {
    /// Stream a completion for the given message history.
    async fn stream(
        &self,
        messages: &[Message],
    ) -> Result<BoxStream<'static, Result<StreamChunk, RunnerError>>, RunnerError>;
}

/// The model adapter the engine consumes (§6, "Model adapter (consumed)").
///
/// Concrete model-provider integrations (Anthropic, OpenAI, Ollama, ...)
/// are deliberately out of scope for this crate; it only defines the
/// seam.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Bind a tool set, returning a handle that can stream completions.
    async fn bind_tools(&self, tools: Vec<ToolSchema>) -> Box<dyn BoundModel>;
}

/// The embedding adapter the engine consumes (§6, "Embedding adapter
/// (consumed)"). Optional: the semantic store is disabled when absent.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one or more texts, returning one vector per input in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RunnerError>;

    /// Dimensionality of vectors produced by [`EmbeddingProvider::embed`].
    fn dimension(&self) -> usize;
}
