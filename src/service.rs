use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use crate::pipeline::orchestrator::Orchestrator;
use crate::store::WorkflowStore;
use crate::workflow::WorkflowGraph;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
}

/// Error body returned to callers: `{"detail": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorEnvelope {
    pub detail: String,
}

impl ErrorEnvelope {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Request boundary: runs the pipeline and records successful graphs.
pub struct WorkflowService {
    orchestrator: Arc<Orchestrator>,
    store: Arc<dyn WorkflowStore>,
}

impl WorkflowService {
    pub fn new(orchestrator: Arc<Orchestrator>, store: Arc<dyn WorkflowStore>) -> Self {
        Self {
            orchestrator,
            store,
        }
    }

    pub async fn generate(&self, request: GenerateRequest) -> Result<WorkflowGraph, ErrorEnvelope> {
        let prompt = request.prompt.trim();
        if prompt.is_empty() {
            return Err(ErrorEnvelope::new("Prompt must not be empty"));
        }

        let graph = self
            .orchestrator
            .generate(prompt)
            .await
            .map_err(|e| ErrorEnvelope::new(e.to_string()))?;

        match self.store.save(&graph, prompt).await {
            Ok(record) => info!(record = %record.id, workflow = %graph.name, "Workflow saved"),
            Err(e) => warn!(error = %e, "Failed to save generated workflow"),
        }

        Ok(graph)
    }

    /// JSON in, status code and JSON body out.
    pub async fn handle_json(&self, body: &str) -> (u16, Value) {
        let request: GenerateRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(e) => {
                let envelope = ErrorEnvelope::new(format!("Invalid request body: {e}"));
                return (400, json!(envelope));
            }
        };

        if request.prompt.trim().is_empty() {
            return (400, json!(ErrorEnvelope::new("Prompt must not be empty")));
        }

        match self.generate(request).await {
            Ok(graph) => (200, graph.to_value()),
            Err(envelope) => (500, json!(envelope)),
        }
    }
}
