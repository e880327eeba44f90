//! Wiring a two-agent team (a leader and one tool-using sub-agent) into
//! a running [`Orchestrator`], with a stand-in model provider in place
//! of a real one.
//!
//! Run with: `cargo run --example full_agent -p orc`

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use orc::prelude::*;
use orc_core::{BoundModel, RunnerError, StreamChunk, ToolSchema};
use std::sync::Arc;

/// A model that always answers the same way, regardless of input.
/// Stands in for `orc-provider-*` crates this workspace deliberately
/// does not implement (see `orc_core::ModelProvider`'s docs).
struct EchoModel;

struct EchoBound;

#[async_trait]
impl BoundModel for EchoBound {
    async fn stream(&self, _messages: &[Message]) -> Result<BoxStream<'static, Result<StreamChunk, RunnerError>>, RunnerError> {
        Ok(Box::pin(stream::once(async {
            Ok(StreamChunk {
                content: Some("Hello from the orchestration engine.".to_string()),
                ..Default::default()
            })
        })))
    }
}

#[async_trait]
impl ModelProvider for EchoModel {
    async fn bind_tools(&self, _tools: Vec<ToolSchema>) -> Box<dyn BoundModel> {
        Box::new(EchoBound)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let workspace = Arc::new(Workspace::new(tmp.path())?);
    workspace.ensure_layout()?;

    let mut registry = Registry::new();
    registry.register(AgentDef {
        name: "assistant".to_string(),
        group: None,
        is_leader: true,
        description: "Answers general questions.".to_string(),
        sub_agents: vec![],
        tools: vec!["read_file".to_string()],
        system_prompt: "You are a helpful assistant.".to_string(),
        model: "echo".to_string(),
    });

    let runner = Arc::new(AgentRunner::new(Arc::new(EchoModel), ContextBuilder::default(), None));
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

    let outcome = orchestrator.run("assistant", "What can you do?", Some("demo-user"), |event| {
        println!("event: {event:?}");
    })
    .await?;

    println!("response: {}", outcome.response);
    println!("delegation chain: {:?}", outcome.delegation_chain);

    Ok(())
}
