use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::{CompletionMode, TextGenerator, prompts};
use crate::outcome::Outcome;
use crate::pipeline::json::{parse_payload, unwrap_envelope};
use crate::pipeline::recovery::JsonRecovery;
use crate::workflow::WorkflowGraph;

/// Best-effort AI review of a whole graph against a fixed rubric.
pub struct SemanticReviewer {
    generator: Arc<dyn TextGenerator>,
    recovery: JsonRecovery,
}

impl SemanticReviewer {
    pub fn new(generator: Arc<dyn TextGenerator>, recovery: JsonRecovery) -> Self {
        Self { generator, recovery }
    }

    /// Returns the reviewed graph JSON, or the input graph unchanged (as
    /// `Degraded`) when the review produced nothing usable.
    pub async fn review(&self, graph: &WorkflowGraph, prompt: &str) -> Outcome<Value> {
        info!(workflow = %graph.name, "Running semantic review");
        let input = graph.to_value();
        let user = json!({ "prompt": prompt, "workflow": input }).to_string();

        let text = match self
            .generator
            .complete(prompts::REVIEW, &user, CompletionMode::FreeForm)
            .await
        {
            Ok(text) => text,
            Err(e) => return Outcome::degraded(input, format!("review call failed: {e}")),
        };
        if text.is_empty() {
            return Outcome::degraded(input, "review returned no content");
        }

        let parsed = match parse_payload(&text) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Review response is not valid JSON");
                match self.recovery.repair(&text).await {
                    Outcome::Ok(value) => value,
                    Outcome::Degraded { reason, .. } => return Outcome::degraded(input, reason),
                }
            }
        };

        let reviewed = unwrap_envelope(parsed, "workflow");
        if !reviewed.is_object() {
            return Outcome::degraded(input, "review response is not a JSON object");
        }
        Outcome::Ok(reviewed)
    }
}
