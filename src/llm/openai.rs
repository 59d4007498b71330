use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::{CompletionMode, TextGenerator, WORKFLOW_FUNCTION_NAME, workflow_function_schema};

/// Client for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    config: LlmConfig,
    client: Client,
}

impl OpenAiGenerator {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Structured synthesis goes to the primary model, helper calls to the
    /// cheaper assist model.
    fn model_for(&self, mode: CompletionMode) -> &str {
        match mode {
            CompletionMode::Structured => &self.config.primary_model,
            CompletionMode::FreeForm => &self.config.assist_model,
        }
    }

    fn build_payload(&self, system: &str, user: &str, mode: CompletionMode) -> Value {
        let mut payload = json!({
            "model": self.model_for(mode),
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        if let Some(temperature) = self.config.temperature {
            payload["temperature"] = json!(temperature);
        }
        if mode == CompletionMode::Structured {
            payload["tools"] = json!([{ "type": "function", "function": workflow_function_schema() }]);
            payload["tool_choice"] = json!({
                "type": "function",
                "function": { "name": WORKFLOW_FUNCTION_NAME },
            });
        }

        payload
    }

    fn extract_text(body: &Value, mode: CompletionMode) -> String {
        let message = body.pointer("/choices/0/message");
        let text_at = |path: &str| {
            message
                .and_then(|m| m.pointer(path))
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or("")
                .to_string()
        };

        if mode == CompletionMode::Structured {
            let arguments = text_at("/tool_calls/0/function/arguments");
            if !arguments.is_empty() {
                return arguments;
            }
            let legacy = text_at("/function_call/arguments");
            if !legacy.is_empty() {
                return legacy;
            }
            warn!("No structured arguments returned, falling back to message content");
        }

        text_at("/content")
    }

    fn map_error(status: u16, body: &str) -> LlmError {
        match status {
            401 | 403 => LlmError::Authentication(body.to_string()),
            429 => LlmError::RateLimited,
            _ => LlmError::Api {
                status,
                message: body.to_string(),
            },
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        mode: CompletionMode,
    ) -> Result<String, LlmError> {
        if self.config.api_key.is_empty() {
            return Err(LlmError::NotConfigured("missing API key (set OPENAI_API_KEY)".into()));
        }

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let payload = self.build_payload(system, user, mode);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(Self::map_error(status.as_u16(), &text));
        }

        let body: Value =
            serde_json::from_str(&text).map_err(|e| LlmError::Serialization(e.to_string()))?;
        let content = Self::extract_text(&body, mode);
        debug!(model = self.model_for(mode), bytes = content.len(), "Completion received");
        Ok(content)
    }
}
