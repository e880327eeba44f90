//! FakeModelProvider — scripted responses for testing AgentRunner logic
//! without a real model.

use crate::error::RunnerError;
use crate::message::{Message, ToolCall};
use crate::provider::{BoundModel, ModelProvider, StreamChunk, ToolSchema};
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use std::sync::Mutex;

/// One scripted step: either plain content or a set of tool calls,
/// with optional reasoning.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStep {
    /// Visible content for this step.
    pub content: String,
    /// Reasoning for this step, if any.
    pub reasoning: Option<String>,
    /// Tool calls emitted by this step.
    pub tool_calls: Vec<ToolCall>,
}

/// A model provider that replays a fixed script of steps, one per call
/// to `stream`, regardless of the messages passed in.
pub struct FakeModelProvider {
    steps: Mutex<Vec<ScriptedStep>>,
}

impl FakeModelProvider {
    /// Build a fake provider that yields `steps` in order, one per call.
    pub fn new(steps: Vec<ScriptedStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().rev().collect()),
        }
    }
}

struct FakeBoundModel {
    step: Mutex<Option<ScriptedStep>>,
}

#[async_trait]
impl BoundModel for FakeBoundModel {
    async fn stream(
        &self,
        _messages: &[Message],
    ) -> Result<BoxStream<'static, Result<StreamChunk, RunnerError>>, RunnerError> {
        let step = self
            .step
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| RunnerError::ModelFailure("fake model script exhausted".into()))?;
        let chunk = StreamChunk {
            content: Some(step.content),
            reasoning: step.reasoning,
            tool_calls: step.tool_calls,
        };
        Ok(Box::pin(stream::once(async move { Ok(chunk) })))
    }
}

#[async_trait]
impl ModelProvider for FakeModelProvider {
    async fn bind_tools(&self, _tools: Vec<ToolSchema>) -> Box<dyn BoundModel> {
        let step = self.steps.lock().unwrap().pop();
        Box::new(FakeBoundModel {
            step: Mutex::new(step),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn replays_steps_in_order() {
        let provider = FakeModelProvider::new(vec![
            ScriptedStep {
                content: "first".into(),
                ..Default::default()
            },
            ScriptedStep {
                content: "second".into(),
                ..Default::default()
            },
        ]);

        let bound = provider.bind_tools(vec![]).await;
        let mut s = bound.stream(&[]).await.unwrap();
        let chunk = s.next().await.unwrap().unwrap();
        assert_eq!(chunk.content.as_deref(), Some("first"));

        let bound = provider.bind_tools(vec![]).await;
        let mut s = bound.stream(&[]).await.unwrap();
        let chunk = s.next().await.unwrap().unwrap();
        assert_eq!(chunk.content.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn exhausted_script_errors() {
        let provider = FakeModelProvider::new(vec![]);
        let bound = provider.bind_tools(vec![]).await;
        assert!(bound.stream(&[]).await.is_err());
    }
}
