use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    /// Model for the structured synthesis call.
    pub primary_model: String,
    /// Model for repair, inference, review and code regeneration.
    pub assist_model: String,
    pub temperature: Option<f64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            primary_model: "gpt-4o".to_string(),
            assist_model: "gpt-4o-mini".to_string(),
            temperature: None,
        }
    }
}

/// Where generated workflows are recorded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    #[default]
    Memory,
    Redis {
        url: String,
        #[serde(default = "default_key_prefix")]
        key_prefix: String,
    },
}

pub fn default_key_prefix() -> String {
    "taskwright".to_string()
}

pub fn load_config(file_path: &Path) -> Result<AppConfig> {
    let yaml_content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read config file from {}", file_path.display()))?;

    let config: AppConfig = serde_yaml::from_str(&yaml_content)
        .with_context(|| format!("Failed to deserialize config from {}", file_path.display()))?;

    Ok(config)
}

impl AppConfig {
    /// Overrides credentials from `OPENAI_API_KEY` / `OPENAI_BASE_URL` when set.
    pub fn apply_env(mut self) -> Self {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.llm.api_key = key;
            }
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            if !url.is_empty() {
                self.llm.base_url = url;
            }
        }
        self
    }
}
