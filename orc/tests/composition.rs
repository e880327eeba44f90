//! Confirms the `orc` umbrella crate's [`prelude`] is sufficient, by
//! itself, to assemble and run a minimal one-agent orchestrator without
//! naming any `orc-*` component crate directly.

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use orc::prelude::*;
use orc_core::{BoundModel, RunnerError, StreamChunk, ToolSchema};
use std::sync::Arc;

struct OneShotModel(String);

struct OneShotBound(String);

#[async_trait]
impl BoundModel for OneShotBound {
    async fn stream(&self, _messages: &[Message]) -> Result<BoxStream<'static, Result<StreamChunk, RunnerError>>, RunnerError> {
        let content = self.0.clone();
        Ok(Box::pin(stream::once(async move {
            Ok(StreamChunk { content: Some(content), ..Default::default() })
        })))
    }
}

#[async_trait]
impl ModelProvider for OneShotModel {
    async fn bind_tools(&self, _tools: Vec<ToolSchema>) -> Box<dyn BoundModel> {
        Box::new(OneShotBound(self.0.clone()))
    }
}

#[tokio::test]
async fn prelude_assembles_a_runnable_orchestrator() {
    let tmp = tempfile::tempdir().unwrap();
    let workspace = Arc::new(Workspace::new(tmp.path()).unwrap());
    workspace.ensure_layout().unwrap();

    let mut registry = Registry::new();
    registry.register(AgentDef {
        name: "assistant".to_string(),
        group: None,
        is_leader: false,
        description: "answers directly".to_string(),
        sub_agents: vec![],
        tools: vec![],
        system_prompt: "Answer briefly.".to_string(),
        model: "one-shot".to_string(),
    });

    let runner = Arc::new(AgentRunner::new(
        Arc::new(OneShotModel("the sky is blue".to_string())),
        ContextBuilder::default(),
        None,
    ));
    let log = Arc::new(SessionLog::new(workspace.conversations_log_path()));
    let manager = Arc::new(SessionManager::new(Arc::clone(&log)));

    let orchestrator = Orchestrator::new(
        Arc::new(registry),
        runner,
        Arc::clone(&workspace),
        Arc::new(AlwaysDeny),
        vec![],
        log,
        manager,
    );

    let outcome = orchestrator.run("assistant", "why is the sky blue?", Some("tester"), |_| {}).await.unwrap();

    assert_eq!(outcome.response, "the sky is blue");
    assert_eq!(outcome.delegation_chain, vec!["assistant".to_string()]);
}
