//! taskwright: turns a natural-language automation request into an importable
//! n8n workflow graph, using an LLM to draft, repair and review it.

pub mod config;
pub mod error;
pub mod ids;
pub mod llm;
pub mod outcome;
pub mod pipeline;
pub mod service;
pub mod store;
pub mod workflow;

pub use crate::error::{LlmError, PipelineError, StructuralError};
pub use crate::outcome::Outcome;
pub use crate::pipeline::orchestrator::{Orchestrator, Run, Stage};
pub use crate::workflow::{Connections, EdgeGroup, Link, Node, Settings, WorkflowGraph};
