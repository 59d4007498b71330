use crate::workflow::{Connections, EdgeGroup, Link, Node, Settings, WorkflowGraph};
use serde_json::{Map, Value, json};

pub struct WorkflowBuilder {
    name: String,
    id: String,
    tags: Vec<String>,
    pub nodes: Vec<Node>, // public so tests can tamper with enriched fields
    connections: Connections,
}

impl WorkflowBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: name.to_string(),
            tags: vec!["ai-generated".to_string(), "auto".to_string()],
            nodes: Vec::new(),
            connections: Connections::new(),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn node(self, name: &str, kind: &str) -> NodeBuilder {
        let index = self.nodes.len();
        NodeBuilder {
            workflow_builder: self,
            node: Node::new(name, kind, index),
        }
    }

    /// 添加脚本节点
    pub fn code(self, name: &str, kind: &str, key: &str, body: &str) -> Self {
        self.node(name, kind).param(key, body).build()
    }

    pub fn connect(self, source: &str, target: &str) -> Self {
        self.connect_branch(source, target, 0)
    }

    /// Appends a link on output branch `branch` of `source`.
    pub fn connect_branch(mut self, source: &str, target: &str, branch: usize) -> Self {
        let group = self
            .connections
            .entry(source.to_string())
            .or_insert_with(EdgeGroup::default);
        while group.main.len() <= branch {
            group.main.push(Vec::new());
        }
        group.main[branch].push(Link::main(target));
        self
    }

    pub fn build(self) -> WorkflowGraph {
        WorkflowGraph {
            name: self.name,
            id: self.id,
            nodes: self.nodes,
            connections: self.connections,
            active: false,
            tags: self.tags,
            settings: Settings::default(),
        }
    }

    /// The graph as a model would emit it: only names, types and
    /// parameters on nodes, no metadata, connections only when present.
    pub fn build_raw(self) -> Value {
        let nodes: Vec<Value> = self
            .nodes
            .iter()
            .map(|n| {
                json!({
                    "name": n.name,
                    "type": n.kind,
                    "parameters": n.parameters,
                })
            })
            .collect();

        let mut raw = json!({
            "name": self.name,
            "nodes": nodes,
        });
        if !self.connections.is_empty() {
            raw["connections"] = json!(self.connections);
        }
        raw
    }
}

pub struct NodeBuilder {
    workflow_builder: WorkflowBuilder,
    node: Node,
}

impl NodeBuilder {
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.node.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.node.parameters = parameters;
        self
    }

    pub fn build(mut self) -> WorkflowBuilder {
        self.workflow_builder.nodes.push(self.node);
        self.workflow_builder
    }
}
