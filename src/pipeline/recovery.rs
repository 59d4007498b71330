use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

use crate::llm::{CompletionMode, TextGenerator, prompts};
use crate::outcome::Outcome;
use crate::pipeline::defaults::scaffold;
use crate::pipeline::json::parse_payload;

/// Last-resort JSON repair. Always yields an object: the repaired document,
/// or the empty scaffold when repair is impossible.
#[derive(Clone)]
pub struct JsonRecovery {
    generator: Arc<dyn TextGenerator>,
}

impl JsonRecovery {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn repair(&self, broken: &str) -> Outcome<Value> {
        warn!("Attempting AI-assisted JSON repair");
        if broken.trim().is_empty() {
            return give_up("nothing to repair: input was empty".to_string());
        }

        let text = match self
            .generator
            .complete(prompts::REPAIR, broken, CompletionMode::FreeForm)
            .await
        {
            Ok(text) => text,
            Err(e) => return give_up(format!("repair call failed: {e}")),
        };
        if text.is_empty() {
            return give_up("no content returned during JSON repair".to_string());
        }

        match parse_payload(&text) {
            Ok(value) if value.is_object() => Outcome::Ok(value),
            Ok(_) => give_up("repaired payload is not a JSON object".to_string()),
            Err(e) => give_up(e.to_string()),
        }
    }
}

fn give_up(reason: String) -> Outcome<Value> {
    error!(reason = %reason, "JSON repair failed, continuing with an empty scaffold");
    Outcome::degraded(scaffold(), reason)
}
