use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use taskwright::llm::{NullGenerator, ScriptedGenerator, prompts};
use taskwright::service::{ErrorEnvelope, GenerateRequest, WorkflowService};
use taskwright::store::{InMemoryWorkflowStore, StoredWorkflow, WorkflowStore};
use taskwright::{Orchestrator, WorkflowGraph};
use uuid::Uuid;

struct BrokenStore;

#[async_trait]
impl WorkflowStore for BrokenStore {
    async fn save(&self, _graph: &WorkflowGraph, _prompt: &str) -> Result<StoredWorkflow> {
        Err(anyhow!("disk full"))
    }

    async fn get(&self, _id: Uuid) -> Result<Option<StoredWorkflow>> {
        Ok(None)
    }

    async fn list(&self, _limit: usize) -> Result<Vec<StoredWorkflow>> {
        Ok(Vec::new())
    }
}

fn scripted_service(store: Arc<dyn WorkflowStore>) -> WorkflowService {
    let workflow = json!({
        "name": "Ping",
        "nodes": [{ "name": "Hook", "type": "n8n-nodes-base.webhook" }],
    });
    let generator = Arc::new(ScriptedGenerator::new().respond(prompts::GENERATE, workflow.to_string()));
    WorkflowService::new(Arc::new(Orchestrator::with_generator(generator)), store)
}

#[tokio::test]
async fn test_generate_saves_the_graph() {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let service = scripted_service(store.clone());

    let graph = service
        .generate(GenerateRequest { prompt: "  ping me  ".to_string() })
        .await
        .expect("Generation failed");

    assert_eq!(graph.name, "Ping");
    let records = store.list(10).await.expect("list failed");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].prompt, "ping me");
    assert_eq!(records[0].workflow, graph);
}

#[tokio::test]
async fn test_blank_prompt_is_rejected() {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let generator = Arc::new(ScriptedGenerator::new());
    let service = WorkflowService::new(Arc::new(Orchestrator::with_generator(generator.clone())), store.clone());

    let err = service
        .generate(GenerateRequest { prompt: " \t ".to_string() })
        .await
        .expect_err("blank prompt must fail");

    assert_eq!(err, ErrorEnvelope::new("Prompt must not be empty"));
    assert!(generator.calls().is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_pipeline_failure_becomes_envelope() {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let service = WorkflowService::new(Arc::new(Orchestrator::with_generator(Arc::new(NullGenerator))), store.clone());

    let err = service
        .generate(GenerateRequest { prompt: "anything".to_string() })
        .await
        .expect_err("empty model must fail");

    assert_eq!(err.detail, "Workflow generation failed: primary generation returned an empty response");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_save_failure_does_not_fail_request() {
    let service = scripted_service(Arc::new(BrokenStore));

    let graph = service
        .generate(GenerateRequest { prompt: "ping".to_string() })
        .await
        .expect("save failures are only logged");

    assert_eq!(graph.name, "Ping");
}

#[tokio::test]
async fn test_handle_json() {
    let service = scripted_service(Arc::new(InMemoryWorkflowStore::new()));

    let (status, body) = service.handle_json(r#"{"prompt": "ping"}"#).await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], json!("Ping"));
    assert_eq!(body["settings"]["executionOrder"], json!("sequential"));

    let (status, body) = service.handle_json("not json").await;
    assert_eq!(status, 400);
    assert!(body["detail"].as_str().is_some_and(|d| d.starts_with("Invalid request body")));

    let (status, body) = service.handle_json(r#"{"prompt": ""}"#).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "detail": "Prompt must not be empty" }));
}
