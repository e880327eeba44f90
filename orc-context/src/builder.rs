//! [`ContextBuilder`] — priority-based assembly of a bounded message
//! list for one model call.

use crate::counter::TokenCounter;
use orc_core::Message;

/// Tunables for [`ContextBuilder`]. Defaults match the design: keep 95%
/// of the stated limit as a safety margin, then reserve 4096 tokens for
/// the model's response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextBuilderConfig {
    /// Fraction of the model's stated limit usable for the request.
    pub safety: f64,
    /// Tokens reserved for the model's own response.
    pub response_buffer: usize,
}

impl Default for ContextBuilderConfig {
    fn default() -> Self {
        Self {
            safety: 0.95,
            response_buffer: 4096,
        }
    }
}

/// Assembles the exact message list sent to the model from a system
/// prompt and a frame's history, under a token budget.
///
/// The system prompt is Priority 0: always included, even if keeping it
/// means dropping every history message. History is Priority 1: walked
/// newest-first, each message kept if it still fits the remaining
/// budget, and the walk stops at the first message that doesn't —
/// everything older is dropped too, even if a still-older message would
/// have fit, so the kept window stays an unbroken prefix of recent
/// turns. The returned order is oldest-first (conversational order),
/// with the system prompt always leading.
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder {
    counter: TokenCounter,
    config: ContextBuilderConfig,
}

impl ContextBuilder {
    /// Build a context builder around the given token counter and config.
    pub fn new(counter: TokenCounter, config: ContextBuilderConfig) -> Self {
        Self { counter, config }
    }

    /// The context-window limit registered for `model`, or the 128k
    /// default if unknown. See [`TokenCounter::model_limit`].
    pub fn model_limit(&self, model: &str) -> usize {
        self.counter.model_limit(model)
    }

    /// The usable token budget for a model whose stated context-window
    /// limit is `limit`: `floor(limit * safety) - response_buffer`,
    /// saturating at zero.
    pub fn budget(&self, limit: usize) -> usize {
        let scaled = (limit as f64 * self.config.safety).floor() as usize;
        scaled.saturating_sub(self.config.response_buffer)
    }

    /// Assemble the message list to send for one model call.
    ///
    /// `limit` is the model's stated context-window size (see
    /// [`TokenCounter::model_limit`]); the caller is expected to have
    /// already resolved the model name to a limit.
    pub fn build_context(&self, system_prompt: &Message, history: &[Message], limit: usize) -> Vec<Message> {
        let budget = self.budget(limit);
        let system_tokens = self.counter.count_message(system_prompt);

        if system_tokens > budget {
            tracing::warn!(
                system_tokens,
                budget,
                "system prompt alone exceeds context budget; dropping all history"
            );
            return vec![system_prompt.clone()];
        }

        let mut remaining = budget - system_tokens;
        let mut kept_newest_first: Vec<&Message> = Vec::new();

        for message in history.iter().rev() {
            let cost = self.counter.count_message(message);
            if cost > remaining {
                break;
            }
            remaining -= cost;
            kept_newest_first.push(message);
        }

        let mut result = Vec::with_capacity(kept_newest_first.len() + 1);
        result.push(system_prompt.clone());
        result.extend(kept_newest_first.into_iter().rev().cloned());
        result
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(TokenCounter::default(), ContextBuilderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::TokenCounterConfig;

    /// Build a counter where every message costs exactly `tokens_each`,
    /// by sizing text to `chars_per_token * (tokens_each - message_overhead)`.
    fn fixed_cost_message(text_tokens: usize, chars_per_token: usize) -> Message {
        Message::user("a".repeat(text_tokens * chars_per_token))
    }

    #[test]
    fn context_eviction_scenario_from_spec() {
        // System prompt 100 tokens, 10 history messages at 100 tokens
        // each, model limit 500, safety 0.9, response_buffer 100.
        // Budget = floor(500*0.9) - 100 = 350. After system prompt: 250
        // tokens remain -> 2 newest messages fit -> 3 messages total.
        let counter_config = TokenCounterConfig {
            chars_per_token: 1,
            message_overhead: 0,
            list_overhead: 0,
            tool_call_overhead: 0,
            tool_message_overhead: 0,
        };
        let counter = TokenCounter::new(counter_config);
        let builder = ContextBuilder::new(
            counter,
            ContextBuilderConfig {
                safety: 0.9,
                response_buffer: 100,
            },
        );

        let system = fixed_cost_message(100, 1);
        let history: Vec<Message> = (0..10).map(|_| fixed_cost_message(100, 1)).collect();

        assert_eq!(builder.budget(500), 350);

        let result = builder.build_context(&system, &history, 500);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].text(), system.text());
    }

    #[test]
    fn system_prompt_alone_over_budget_drops_all_history() {
        let builder = ContextBuilder::default();
        let system = Message::assistant("s".repeat(1_000_000));
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let result = builder.build_context(&system, &history, 100);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn output_order_is_system_then_oldest_to_newest() {
        let builder = ContextBuilder::default();
        let system = Message::assistant("sys");
        let history = vec![
            Message::user("one"),
            Message::assistant("two"),
            Message::user("three"),
        ];
        let result = builder.build_context(&system, &history, 200_000);
        let texts: Vec<&str> = result.iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["sys", "one", "two", "three"]);
    }

    #[test]
    fn drop_stops_at_first_miss_even_if_older_would_fit() {
        // Newest-first walk: a large message blocks further inclusion
        // even though an older, smaller message would otherwise fit.
        let counter_config = TokenCounterConfig {
            chars_per_token: 1,
            message_overhead: 0,
            list_overhead: 0,
            tool_call_overhead: 0,
            tool_message_overhead: 0,
        };
        let counter = TokenCounter::new(counter_config);
        let builder = ContextBuilder::new(
            counter,
            ContextBuilderConfig {
                safety: 1.0,
                response_buffer: 0,
            },
        );
        let system = fixed_cost_message(0, 1);
        let history = vec![
            fixed_cost_message(10, 1),  // oldest, small, would fit alone
            fixed_cost_message(200, 1), // newest, too big
        ];
        let result = builder.build_context(&system, &history, 100);
        // Newest message (200 tokens) doesn't fit in a 100 budget, so the
        // walk stops immediately; the older, smaller message is dropped too.
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn empty_history_returns_just_system_prompt() {
        let builder = ContextBuilder::default();
        let system = Message::assistant("sys");
        let result = builder.build_context(&system, &[], 200_000);
        assert_eq!(result.len(), 1);
    }
}
