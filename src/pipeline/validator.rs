use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::StructuralError;
use crate::ids::IdGenerator;
use crate::llm::{CompletionMode, TextGenerator, prompts};
use crate::outcome::Outcome;
use crate::pipeline::defaults::{self, apply_type_defaults};
use crate::pipeline::json::{parse_payload, unwrap_envelope};
use crate::pipeline::sanitizer::{linear_connections, sanitize};
use crate::workflow::{Connections, Node, WorkflowGraph, is_trigger_type};

/// How the connections of a validated graph were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSource {
    Provided,
    Inferred,
    Linear,
}

/// A node entry as the model wrote it, names already made unique.
#[derive(Debug, Clone)]
pub struct RawNode {
    pub name: String,
    pub kind: String,
    fields: Map<String, Value>,
}

impl RawNode {
    fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        let name = fields.get("name")?.as_str()?.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            kind: defaults::merge_kind(fields.get("type")),
            fields: fields.clone(),
        })
    }

    fn enrich(self, index: usize) -> Node {
        let mut node = Node {
            name: self.name,
            kind: self.kind,
            parameters: defaults::merge_parameters(self.fields.get("parameters")),
            type_version: defaults::merge_type_version(self.fields.get("typeVersion")),
            position: defaults::merge_position(self.fields.get("position"), index),
        };
        apply_type_defaults(&mut node);
        node
    }
}

/// Stable partition: trigger-typed items first, everything else after.
pub fn reorder_triggers<T>(items: Vec<T>, kind: impl Fn(&T) -> &str) -> Vec<T> {
    let (mut triggers, others): (Vec<T>, Vec<T>) =
        items.into_iter().partition(|item| is_trigger_type(kind(item)));
    triggers.extend(others);
    triggers
}

fn unique_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

fn collect_nodes(raw_nodes: &[Value]) -> Vec<RawNode> {
    let mut taken = HashSet::new();
    let mut nodes = Vec::with_capacity(raw_nodes.len());
    for (index, raw) in raw_nodes.iter().enumerate() {
        let Some(mut node) = RawNode::from_value(raw) else {
            warn!(index, "Skipping node without a name");
            continue;
        };
        let name = unique_name(&node.name, &taken);
        if name != node.name {
            warn!(original = %node.name, renamed = %name, "Renamed duplicate node");
            node.name = name;
        }
        taken.insert(node.name.clone());
        nodes.push(node);
    }
    nodes
}

pub struct StructuralValidator {
    generator: Arc<dyn TextGenerator>,
    ids: Arc<dyn IdGenerator>,
}

impl StructuralValidator {
    pub fn new(generator: Arc<dyn TextGenerator>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { generator, ids }
    }

    pub async fn validate(
        &self,
        graph_json: &Value,
        prompt: &str,
    ) -> Result<WorkflowGraph, StructuralError> {
        self.validate_with_source(graph_json, prompt)
            .await
            .map(|(graph, _)| graph)
    }

    pub async fn validate_with_source(
        &self,
        graph_json: &Value,
        prompt: &str,
    ) -> Result<(WorkflowGraph, ConnectionSource), StructuralError> {
        // 1. Mandatory fields
        let name = graph_json
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(StructuralError::MissingField("name"))?;
        let raw_nodes = graph_json
            .get("nodes")
            .and_then(Value::as_array)
            .filter(|nodes| !nodes.is_empty())
            .ok_or(StructuralError::MissingField("nodes"))?;

        let nodes = collect_nodes(raw_nodes);
        if nodes.is_empty() {
            return Err(StructuralError::MissingField("nodes"));
        }

        // 2. Triggers first
        let ordered = reorder_triggers(nodes, |n| n.kind.as_str());

        // 3-4. Node defaults
        let nodes: Vec<Node> = ordered
            .into_iter()
            .enumerate()
            .map(|(index, raw)| raw.enrich(index))
            .collect();

        // 5. Workflow metadata
        let id = graph_json
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.ids.workflow_id(prompt));

        // 6-7. Connections
        let (connections, source) = self
            .resolve_connections(graph_json.get("connections"), &nodes, prompt)
            .await;
        let connections = sanitize(&connections, &nodes);

        let graph = WorkflowGraph {
            name: name.to_string(),
            id,
            nodes,
            connections,
            active: defaults::merge_active(graph_json.get("active")),
            tags: defaults::merge_tags(graph_json.get("tags")),
            settings: defaults::merge_settings(graph_json.get("settings")),
        };
        debug!(workflow = %graph.name, nodes = graph.nodes.len(), ?source, "Workflow validated");
        Ok((graph, source))
    }

    /// Model-supplied connections when usable, else AI inference, else a
    /// linear chain through `nodes`.
    pub async fn resolve_connections(
        &self,
        raw: Option<&Value>,
        nodes: &[Node],
        prompt: &str,
    ) -> (Connections, ConnectionSource) {
        let provided = defaults::parse_connections(raw);
        if !sanitize(&provided, nodes).is_empty() {
            return (provided, ConnectionSource::Provided);
        }
        if !provided.is_empty() {
            warn!("Provided connections reference no known nodes, resolving again");
        }

        let outcome = self.infer_connections(nodes, prompt).await;
        let usable = matches!(&outcome, Outcome::Ok(inferred) if !sanitize(inferred, nodes).is_empty());
        if usable {
            return (outcome.into_value(), ConnectionSource::Inferred);
        }

        warn!(
            reason = outcome.reason().unwrap_or("inferred connections reference no known nodes"),
            "AI connection reasoning failed"
        );
        let linear = linear_connections(nodes);
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        info!("Fallback sequential connections: {}", names.join(" → "));
        (linear, ConnectionSource::Linear)
    }

    pub async fn infer_connections(&self, nodes: &[Node], prompt: &str) -> Outcome<Connections> {
        info!("Asking AI to infer logical connections");
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        let user = json!({ "prompt": prompt, "nodes": names });
        let user = serde_json::to_string_pretty(&user).unwrap_or_else(|_| user.to_string());

        let text = match self
            .generator
            .complete(prompts::CONNECTIONS, &user, CompletionMode::FreeForm)
            .await
        {
            Ok(text) => text,
            Err(e) => return Outcome::degraded(Connections::new(), e.to_string()),
        };
        if text.is_empty() {
            return Outcome::degraded(Connections::new(), "empty connection data");
        }

        let parsed = match parse_payload(&text) {
            Ok(value) => unwrap_envelope(value, "connections"),
            Err(e) => return Outcome::degraded(Connections::new(), e.to_string()),
        };
        let inferred = defaults::parse_connections(Some(&parsed));
        if inferred.is_empty() {
            return Outcome::degraded(inferred, "no usable connections in response");
        }
        Outcome::Ok(inferred)
    }
}
