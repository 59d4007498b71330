use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::store::{StoredWorkflow, WorkflowStore};
use crate::workflow::WorkflowGraph;

pub struct InMemoryWorkflowStore {
    // Map<RecordID, (InsertSeq, Record)>
    records: DashMap<Uuid, (u64, StoredWorkflow)>,
    seq: AtomicU64,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for InMemoryWorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn save(&self, graph: &WorkflowGraph, prompt: &str) -> Result<StoredWorkflow> {
        let record = StoredWorkflow::new(graph, prompt);
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.records.insert(record.id, (seq, record.clone()));
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredWorkflow>> {
        Ok(self.records.get(&id).map(|entry| entry.value().1.clone()))
    }

    async fn list(&self, limit: usize) -> Result<Vec<StoredWorkflow>> {
        let mut entries: Vec<(u64, StoredWorkflow)> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        // Insertion sequence; timestamps only have second resolution.
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().take(limit).map(|(_, record)| record).collect())
    }
}
