pub mod builder;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

pub const MAIN_PORT: &str = "main";

/// Type substrings that mark a node as a workflow entry point.
pub const TRIGGER_KEYWORDS: [&str; 4] = ["cron", "webhook", "schedule", "trigger"];

/// Last type segments (lowercased) of nodes that embed script text.
pub const SCRIPTING_SEGMENTS: [&str; 3] = ["function", "functionitem", "code"];

/// Source node name -> outgoing edges.
pub type Connections = BTreeMap<String, EdgeGroup>;

/// 生成的工作流 (n8n 导入格式)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowGraph {
    pub name: String,
    pub id: String,
    pub nodes: Vec<Node>,
    pub connections: Connections,
    pub active: bool,
    pub tags: Vec<String>,
    pub settings: Settings,
}

impl WorkflowGraph {
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    /// All `(source, target)` pairs on the main port, in map order.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.connections
            .iter()
            .flat_map(|(source, group)| group.targets().map(move |t| (source.as_str(), t)))
            .collect()
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.connections
            .get(source)
            .is_some_and(|group| group.links_to(target))
    }

    /// The node feeding `name`: the first source linking into it, else the
    /// node placed right before it.
    pub fn upstream_of(&self, name: &str) -> Option<&Node> {
        let linked = self
            .nodes
            .iter()
            .find(|n| self.has_edge(&n.name, name));
        if linked.is_some() {
            return linked;
        }
        let pos = self.nodes.iter().position(|n| n.name == name)?;
        pos.checked_sub(1).and_then(|i| self.nodes.get(i))
    }

    pub fn to_value(&self) -> Value {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// 工作流中的节点
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub parameters: Map<String, Value>,
    pub type_version: Number,
    pub position: [i64; 2],
}

impl Node {
    pub fn new(name: &str, kind: &str, index: usize) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            parameters: Map::new(),
            type_version: Number::from(1),
            position: cascade_position(index),
        }
    }

    pub fn is_trigger(&self) -> bool {
        is_trigger_type(&self.kind)
    }

    pub fn is_scripting(&self) -> bool {
        is_scripting_type(&self.kind)
    }
}

/// Horizontal layout used until a real layout exists.
pub fn cascade_position(index: usize) -> [i64; 2] {
    [200 + 220 * index as i64, 300]
}

pub fn is_trigger_type(kind: &str) -> bool {
    let kind = kind.to_lowercase();
    TRIGGER_KEYWORDS.iter().any(|kw| kind.contains(kw))
}

pub fn is_scripting_type(kind: &str) -> bool {
    let segment = kind.rsplit('.').next().unwrap_or(kind).to_lowercase();
    SCRIPTING_SEGMENTS.contains(&segment.as_str())
}

/// Outgoing ports of one source node. Only `main` is modeled.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EdgeGroup {
    #[serde(default)]
    pub main: Vec<Vec<Link>>,
}

impl EdgeGroup {
    pub fn single(target: &str) -> Self {
        Self {
            main: vec![vec![Link::main(target)]],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.main.iter().all(|branch| branch.is_empty())
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.main
            .iter()
            .flat_map(|branch| branch.iter().map(|link| link.node.as_str()))
    }

    pub fn links_to(&self, target: &str) -> bool {
        self.targets().any(|t| t == target)
    }

    /// Drops every link to `target`, then any branch left empty.
    /// Returns whether anything was removed.
    pub fn remove_links_to(&mut self, target: &str) -> bool {
        let before: usize = self.main.iter().map(Vec::len).sum();
        for branch in &mut self.main {
            branch.retain(|link| link.node != target);
        }
        self.main.retain(|branch| !branch.is_empty());
        let after: usize = self.main.iter().map(Vec::len).sum();
        before != after
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Link {
    pub node: String,
    #[serde(rename = "type", default = "main_port")]
    pub kind: String,
    #[serde(default)]
    pub index: u32,
}

impl Link {
    pub fn main(node: &str) -> Self {
        Self {
            node: node.to_string(),
            kind: MAIN_PORT.to_string(),
            index: 0,
        }
    }
}

fn main_port() -> String {
    MAIN_PORT.to_string()
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionOrder {
    #[default]
    Sequential,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub timezone: String,
    pub execution_order: ExecutionOrder,
    pub save_manual_executions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            execution_order: ExecutionOrder::Sequential,
            save_manual_executions: true,
        }
    }
}
