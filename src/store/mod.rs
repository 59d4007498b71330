use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::workflow::WorkflowGraph;

pub mod memory_store;
pub mod redis_store;

pub use memory_store::InMemoryWorkflowStore;
pub use redis_store::RedisWorkflowStore;

/// 持久化的生成记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredWorkflow {
    pub id: Uuid,
    pub name: String,
    pub prompt: String,
    pub workflow: WorkflowGraph,
    /// Unix seconds.
    pub created_at: u64,
}

impl StoredWorkflow {
    pub fn new(graph: &WorkflowGraph, prompt: &str) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            id: Uuid::new_v4(),
            name: graph.name.clone(),
            prompt: prompt.to_string(),
            workflow: graph.clone(),
            created_at,
        }
    }
}

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn save(&self, graph: &WorkflowGraph, prompt: &str) -> Result<StoredWorkflow>;
    async fn get(&self, id: Uuid) -> Result<Option<StoredWorkflow>>;
    /// Most recent records first.
    async fn list(&self, limit: usize) -> Result<Vec<StoredWorkflow>>;
}

pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn WorkflowStore>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(InMemoryWorkflowStore::new())),
        StoreConfig::Redis { url, key_prefix } => {
            let client = redis::Client::open(url.as_str())?;
            Ok(Arc::new(RedisWorkflowStore::new(client, key_prefix.clone())))
        }
    }
}
