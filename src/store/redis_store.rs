use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::warn;
use uuid::Uuid;

use crate::store::{StoredWorkflow, WorkflowStore};
use crate::workflow::WorkflowGraph;

/// Records as JSON strings under `<prefix>:workflow:<id>`, ids pushed onto
/// the `<prefix>:workflows` list, newest at the head.
pub struct RedisWorkflowStore {
    client: redis::Client,
    prefix: String,
}

impl RedisWorkflowStore {
    pub fn new(client: redis::Client, prefix: String) -> Self {
        Self { client, prefix }
    }

    fn record_key(&self, id: Uuid) -> String {
        format!("{}:workflow:{}", self.prefix, id)
    }

    fn index_key(&self) -> String {
        format!("{}:workflows", self.prefix)
    }
}

#[async_trait]
impl WorkflowStore for RedisWorkflowStore {
    async fn save(&self, graph: &WorkflowGraph, prompt: &str) -> Result<StoredWorkflow> {
        let record = StoredWorkflow::new(graph, prompt);
        let serialized = serde_json::to_string(&record)?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(self.record_key(record.id), serialized).await?;
        let _: () = conn.lpush(self.index_key(), record.id.to_string()).await?;
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredWorkflow>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(self.record_key(id)).await?;

        if let Some(s) = raw {
            Ok(Some(serde_json::from_str(&s)?))
        } else {
            Ok(None)
        }
    }

    async fn list(&self, limit: usize) -> Result<Vec<StoredWorkflow>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let stop = isize::try_from(limit).unwrap_or(isize::MAX) - 1;
        let ids: Vec<String> = conn.lrange(self.index_key(), 0, stop).await?;

        let mut records = Vec::with_capacity(ids.len());
        for entry in ids {
            let Ok(id) = Uuid::parse_str(&entry) else {
                warn!(entry = %entry, "Skipping malformed workflow index entry");
                continue;
            };
            let raw: Option<String> = conn.get(self.record_key(id)).await?;
            // Index entries can outlive records that were deleted by hand.
            if let Some(s) = raw {
                records.push(serde_json::from_str(&s)?);
            }
        }
        Ok(records)
    }
}
