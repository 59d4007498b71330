use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::LlmError;

pub mod openai;
pub mod prompts;
pub mod scripted;

pub use openai::OpenAiGenerator;
pub use scripted::{NullGenerator, RecordedCall, ScriptedGenerator};

pub const WORKFLOW_FUNCTION_NAME: &str = "generate_n8n_workflow";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionMode {
    /// The service must answer with arguments matching [`workflow_function_schema`].
    Structured,
    /// Plain completion; the caller parses whatever text comes back.
    FreeForm,
}

/// Text-generation seam used by every pipeline stage.
///
/// Implementations return the raw (trimmed) payload, or an empty string when
/// the service answered with nothing. Emptiness is not an error; callers
/// check for it themselves.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        mode: CompletionMode,
    ) -> Result<String, LlmError>;
}

/// Function definition the structured call is forced to invoke.
pub fn workflow_function_schema() -> Value {
    json!({
        "name": WORKFLOW_FUNCTION_NAME,
        "description": "Convert natural language automation instructions into a valid n8n workflow JSON \
                        that can be directly imported into n8n. \
                        The output must include top-level keys: 'name', 'nodes', and 'connections'.",
        "parameters": {
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "nodes": { "type": "array", "items": { "type": "object" } },
                "connections": { "type": "object" }
            },
            "required": ["name", "nodes"]
        }
    })
}
