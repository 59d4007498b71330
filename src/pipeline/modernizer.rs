use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::{CompletionMode, TextGenerator, prompts};
use crate::outcome::Outcome;
use crate::pipeline::json::{is_json_shaped, strip_fences};
use crate::workflow::{Node, WorkflowGraph};

pub const CANONICAL_SCRIPT_TYPE: &str = "n8n-nodes-base.code";
pub const CODE_KEY: &str = "jsCode";
pub const LEGACY_CODE_KEYS: [&str; 3] = ["functionCode", "code", "script"];
/// Single-item accessors that do not exist in run-once-for-all-items mode.
pub const DEPRECATED_ACCESSORS: [&str; 5] = ["$input.item", "$item(", "items[0]", "$json", "$node["];
pub const BATCH_ACCESSOR: &str = "$input.all()";
pub const PASS_THROUGH: &str = "return $input.all();";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintIssue {
    DeprecatedAccessor(&'static str),
    EmbeddedJson,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFinding {
    pub node: String,
    pub issue: LintIssue,
}

pub fn deprecated_accessor(code: &str) -> Option<&'static str> {
    DEPRECATED_ACCESSORS.iter().copied().find(|idiom| code.contains(idiom))
}

/// The body with comments removed and string literals emptied, plus whether
/// every comment and literal was closed.
fn live_code(code: &str) -> (String, bool) {
    let mut out = String::with_capacity(code.len());
    let mut chars = code.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    // Comment runs to the end of the body.
                    return (out, true);
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                let mut closed = false;
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        closed = true;
                        break;
                    }
                    prev = c;
                }
                if !closed {
                    return (out, false);
                }
                out.push(' ');
            }
            '"' | '\'' | '`' => {
                let mut escaped = false;
                let mut closed = false;
                for next in chars.by_ref() {
                    if escaped {
                        escaped = false;
                    } else if next == '\\' {
                        escaped = true;
                    } else if next == c {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return (out, false);
                }
                out.push_str("\"\"");
            }
            _ => out.push(c),
        }
    }
    (out, true)
}

/// `return` as a whole word outside comments and string literals.
pub fn has_return_statement(code: &str) -> bool {
    let (code, _) = live_code(code);
    let is_ident = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
    code.match_indices("return").any(|(at, word)| {
        let before = code[..at].chars().next_back();
        let after = code[at + word.len()..].chars().next();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}

/// Makes sure the body returns the batch input when it does not already
/// return via the batch accessor. A body with an unclosed comment or string
/// cannot take an appended line and is replaced by the pass-through.
pub fn apply_safety_net(code: &str) -> String {
    let body = code.trim_end();
    if body.trim().is_empty() {
        return PASS_THROUGH.to_string();
    }
    let (live, closed) = live_code(body);
    if !closed {
        warn!("Code body has an unclosed comment or string, using pass-through body");
        return PASS_THROUGH.to_string();
    }
    if has_return_statement(body) && live.contains(BATCH_ACCESSOR) {
        return body.to_string();
    }
    format!("{body}\n{PASS_THROUGH}")
}

fn needs_regeneration(code: &str) -> bool {
    code.trim().is_empty() || is_json_shaped(code) || deprecated_accessor(code).is_some()
}

fn value_as_code(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        // Model put a JSON document where the script belongs.
        other => other.to_string(),
    }
}

/// The script body of a scripting node, looking at the canonical key first.
pub fn code_body(node: &Node) -> Option<String> {
    std::iter::once(CODE_KEY)
        .chain(LEGACY_CODE_KEYS)
        .filter_map(|key| node.parameters.get(key))
        .map(value_as_code)
        .find(|code| !code.trim().is_empty())
}

/// Scans scripting nodes for legacy accessors and embedded JSON bodies.
pub fn lint(graph: &WorkflowGraph) -> Vec<LintFinding> {
    graph
        .nodes
        .iter()
        .filter(|node| node.is_scripting())
        .filter_map(|node| {
            let code = code_body(node)?;
            let issue = if is_json_shaped(&code) {
                LintIssue::EmbeddedJson
            } else {
                LintIssue::DeprecatedAccessor(deprecated_accessor(&code)?)
            };
            Some(LintFinding {
                node: node.name.clone(),
                issue,
            })
        })
        .collect()
}

/// Canonical type, single code key, explicit language and mode.
fn normalize_script_node(node: &mut Node) {
    node.kind = CANONICAL_SCRIPT_TYPE.to_string();

    let body = code_body(node).unwrap_or_default();
    for key in LEGACY_CODE_KEYS {
        node.parameters.remove(key);
    }
    node.parameters.insert(CODE_KEY.to_string(), Value::String(body));
    node.parameters
        .entry("language")
        .or_insert_with(|| json!("javaScript"));
    node.parameters
        .entry("mode")
        .or_insert_with(|| json!("runOnceForAllItems"));
}

pub struct CodeModernizer {
    generator: Arc<dyn TextGenerator>,
}

impl CodeModernizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn modernize(&self, mut graph: WorkflowGraph, prompt: &str) -> WorkflowGraph {
        for index in 0..graph.nodes.len() {
            if !graph.nodes[index].is_scripting() {
                continue;
            }

            let context = graph
                .upstream_of(&graph.nodes[index].name)
                .map(|upstream| Value::Object(upstream.parameters.clone()))
                .unwrap_or(Value::Null);

            let node = &mut graph.nodes[index];
            normalize_script_node(node);

            let mut code = code_body(node).unwrap_or_default();
            if needs_regeneration(&code) {
                info!(node = %node.name, "Regenerating code node body");
                code = match self.regenerate(&node.name, prompt, &context).await {
                    Outcome::Ok(code) => code,
                    Outcome::Degraded { value, reason } => {
                        warn!(node = %node.name, reason = %reason, "Code regeneration failed, using pass-through body");
                        value
                    }
                };
            }

            node.parameters
                .insert(CODE_KEY.to_string(), Value::String(apply_safety_net(&code)));
        }
        graph
    }

    /// Asks for a fresh body. Anything blank, JSON-shaped or still using a
    /// deprecated accessor is rejected and yields an empty body.
    pub async fn regenerate(&self, node_name: &str, prompt: &str, context: &Value) -> Outcome<String> {
        let user = json!({
            "prompt": prompt,
            "node": node_name,
            "previousNodeParameters": context,
        })
        .to_string();

        let text = match self
            .generator
            .complete(prompts::CODE, &user, CompletionMode::FreeForm)
            .await
        {
            Ok(text) => text,
            Err(e) => return Outcome::degraded(String::new(), e.to_string()),
        };

        let code = strip_fences(&text);
        if code.is_empty() {
            return Outcome::degraded(String::new(), "empty code returned");
        }
        if is_json_shaped(code) {
            return Outcome::degraded(String::new(), "regenerated body is JSON, not code");
        }
        if let Some(idiom) = deprecated_accessor(code) {
            return Outcome::degraded(String::new(), format!("regenerated body still uses {idiom}"));
        }
        Outcome::Ok(code.to_string())
    }
}
