//! [`TokenCounter`] — per-message and per-list token estimation.

use orc_core::{Content, ContentBlock, Message, Role};

/// Tunables for [`TokenCounter`]. All fields have defaults matching the
/// values stated in the design: a 4-characters-per-token estimator and
/// small fixed overheads for message and list framing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenCounterConfig {
    /// Characters-per-token ratio used to estimate token counts from
    /// text length.
    pub chars_per_token: usize,
    /// Fixed overhead added per message (role framing, separators).
    pub message_overhead: usize,
    /// Fixed overhead added once per list (array framing).
    pub list_overhead: usize,
    /// Overhead added per tool call recorded on an assistant message,
    /// on top of its serialized name and arguments.
    pub tool_call_overhead: usize,
    /// Overhead added to a tool-result message for its name and id.
    pub tool_message_overhead: usize,
}

impl Default for TokenCounterConfig {
    fn default() -> Self {
        Self {
            chars_per_token: 4,
            message_overhead: 4,
            list_overhead: 3,
            tool_call_overhead: 4,
            tool_message_overhead: 3,
        }
    }
}

/// Estimates token counts for messages and message lists, and knows the
/// context-window limit of known models by name.
#[derive(Debug, Clone, Copy)]
pub struct TokenCounter {
    config: TokenCounterConfig,
}

/// Static per-model context-window limits. Unknown models default to
/// 128k, per the design's stated fallback.
const MODEL_LIMITS: &[(&str, usize)] = &[
    ("gpt-3.5-turbo", 16_385),
    ("gpt-4", 8_192),
    ("gpt-4-32k", 32_768),
    ("gpt-4-turbo", 128_000),
    ("gpt-4o", 128_000),
    ("gpt-4o-mini", 128_000),
    ("o1", 200_000),
    ("o1-mini", 128_000),
    ("o3-mini", 200_000),
    ("claude-3-haiku", 200_000),
    ("claude-3-sonnet", 200_000),
    ("claude-3-opus", 200_000),
    ("claude-3-5-sonnet", 200_000),
    ("claude-3-7-sonnet", 200_000),
    ("claude-sonnet-4", 200_000),
    ("claude-opus-4", 200_000),
    ("llama-3.1-8b", 128_000),
    ("llama-3.1-70b", 128_000),
    ("mixtral-8x7b", 32_768),
];

/// Default limit for models absent from [`MODEL_LIMITS`].
pub const DEFAULT_MODEL_LIMIT: usize = 128_000;

impl TokenCounter {
    /// Build a counter with the given configuration.
    pub fn new(config: TokenCounterConfig) -> Self {
        Self { config }
    }

    /// The context-window limit for `model`, matched by prefix against
    /// the static table (so `"gpt-4o-2024-08-06"` matches `"gpt-4o"`);
    /// unknown models default to [`DEFAULT_MODEL_LIMIT`].
    pub fn model_limit(&self, model: &str) -> usize {
        MODEL_LIMITS
            .iter()
            .filter(|(name, _)| model.starts_with(name))
            .max_by_key(|(name, _)| name.len())
            .map(|(_, limit)| *limit)
            .unwrap_or(DEFAULT_MODEL_LIMIT)
    }

    fn estimate_text(&self, text: &str) -> usize {
        text.len().div_ceil(self.config.chars_per_token.max(1))
    }

    fn content_tokens(&self, content: &Content) -> usize {
        match content {
            Content::Text(text) => self.estimate_text(text),
            Content::Blocks(blocks) => blocks
                .iter()
                .map(|b| match b {
                    ContentBlock::Text { text } => self.estimate_text(text),
                    ContentBlock::ToolUse { input, name, .. } => {
                        self.estimate_text(name) + self.estimate_text(&input.to_string())
                    }
                    ContentBlock::ToolResult { content, .. } => self.estimate_text(content),
                    ContentBlock::Image { .. } => 0,
                    ContentBlock::Custom { data, .. } => self.estimate_text(&data.to_string()),
                })
                .sum(),
        }
    }

    /// Estimate the token cost of a single message: its content, any
    /// reasoning blob, tool-call names and serialized arguments, and
    /// (for tool messages) the overhead of the name/id it carries.
    pub fn count_message(&self, message: &Message) -> usize {
        let mut tokens = self.config.message_overhead + self.content_tokens(&message.content);

        if let Some(reasoning) = &message.reasoning {
            tokens += self.estimate_text(reasoning);
        }

        for call in &message.tool_calls {
            tokens += self.config.tool_call_overhead
                + self.estimate_text(&call.name)
                + self.estimate_text(&call.args.to_string());
        }

        if message.role == Role::Tool {
            tokens += self.config.tool_message_overhead;
        }

        tokens
    }

    /// Estimate the token cost of an entire message list: the sum of
    /// each message's cost plus a single fixed list overhead.
    pub fn count_messages(&self, messages: &[Message]) -> usize {
        if messages.is_empty() {
            return 0;
        }
        self.config.list_overhead
            + messages.iter().map(|m| self.count_message(m)).sum::<usize>()
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new(TokenCounterConfig::default())
    }
}
