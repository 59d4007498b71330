//! Field-merge functions: each takes the raw value the model produced (if any)
//! and returns the final field, falling back to the documented default.
//!
//! | field                         | default                                  |
//! |-------------------------------|------------------------------------------|
//! | `node.type`                   | `n8n-nodes-base.noOp`                    |
//! | `node.parameters`             | `{}`                                     |
//! | `node.typeVersion`            | `1`                                      |
//! | `node.position`               | `[200 + 220 * index, 300]`               |
//! | `active`                      | `false`                                  |
//! | `tags`                        | `["ai-generated", "auto"]`               |
//! | `settings.timezone`           | `"UTC"`                                  |
//! | `settings.executionOrder`     | `"sequential"`                           |
//! | `settings.saveManualExecutions` | `true`                                 |

use serde_json::{Map, Number, Value, json};

use crate::workflow::{Connections, EdgeGroup, Link, MAIN_PORT, Node, Settings, cascade_position};

pub const DEFAULT_WORKFLOW_NAME: &str = "AI Generated Workflow";
pub const DEFAULT_NODE_TYPE: &str = "n8n-nodes-base.noOp";
pub const DEFAULT_TAGS: [&str; 2] = ["ai-generated", "auto"];

/// Minimal graph handed on when JSON recovery gives up.
pub fn scaffold() -> Value {
    json!({
        "name": DEFAULT_WORKFLOW_NAME,
        "nodes": [],
        "connections": {},
    })
}

pub fn merge_kind(raw: Option<&Value>) -> String {
    raw.and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_NODE_TYPE)
        .to_string()
}

pub fn merge_parameters(raw: Option<&Value>) -> Map<String, Value> {
    match raw {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

pub fn merge_type_version(raw: Option<&Value>) -> Number {
    match raw {
        Some(Value::Number(n)) => n.clone(),
        _ => Number::from(1),
    }
}

pub fn merge_position(raw: Option<&Value>, index: usize) -> [i64; 2] {
    let coords = raw.and_then(Value::as_array).and_then(|arr| {
        let x = arr.first()?.as_f64()?;
        let y = arr.get(1)?.as_f64()?;
        Some([x.round() as i64, y.round() as i64])
    });
    coords.unwrap_or_else(|| cascade_position(index))
}

pub fn merge_active(raw: Option<&Value>) -> bool {
    raw.and_then(Value::as_bool).unwrap_or(false)
}

/// Accepts plain strings and n8n-style `{ "name": ... }` tag objects.
pub fn merge_tags(raw: Option<&Value>) -> Vec<String> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return DEFAULT_TAGS.iter().map(|t| t.to_string()).collect();
    };
    items
        .iter()
        .filter_map(|tag| match tag {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect()
}

pub fn merge_settings(raw: Option<&Value>) -> Settings {
    let defaults = Settings::default();
    let Some(raw) = raw.and_then(Value::as_object) else {
        return defaults;
    };
    Settings {
        timezone: raw
            .get("timezone")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.timezone),
        execution_order: raw
            .get("executionOrder")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or(defaults.execution_order),
        save_manual_executions: raw
            .get("saveManualExecutions")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.save_manual_executions),
    }
}

/// Lenient read of a model-produced connections map. Malformed links are
/// dropped, a bare link object stands for a one-link branch, and ports other
/// than `main` are ignored.
pub fn parse_connections(raw: Option<&Value>) -> Connections {
    let mut connections = Connections::new();
    let Some(map) = raw.and_then(Value::as_object) else {
        return connections;
    };

    for (source, group) in map {
        let Some(main) = group.get(MAIN_PORT).and_then(Value::as_array) else {
            continue;
        };
        let branches: Vec<Vec<Link>> = main.iter().map(parse_branch).collect();
        let group = EdgeGroup { main: branches };
        if !group.is_empty() {
            connections.insert(source.clone(), group);
        }
    }
    connections
}

fn parse_branch(raw: &Value) -> Vec<Link> {
    match raw {
        Value::Array(links) => links.iter().filter_map(parse_link).collect(),
        Value::Object(_) => parse_link(raw).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn parse_link(raw: &Value) -> Option<Link> {
    let node = raw.get("node")?.as_str()?.trim();
    if node.is_empty() {
        return None;
    }
    Some(Link {
        node: node.to_string(),
        kind: raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(MAIN_PORT)
            .to_string(),
        index: raw
            .get("index")
            .and_then(Value::as_u64)
            .and_then(|i| u32::try_from(i).ok())
            .unwrap_or(0),
    })
}

struct TypeDefaults {
    /// Lowercase substring of the node type.
    marker: &'static str,
    parameters: fn() -> Vec<(&'static str, Value)>,
}

// First matching marker wins.
const TYPE_DEFAULTS: &[TypeDefaults] = &[
    TypeDefaults { marker: "cron", parameters: cron_defaults },
    TypeDefaults { marker: "httprequest", parameters: http_request_defaults },
    TypeDefaults { marker: "googlesheets", parameters: google_sheets_defaults },
    TypeDefaults { marker: "openai", parameters: openai_defaults },
    TypeDefaults { marker: "slack", parameters: slack_defaults },
];

fn cron_defaults() -> Vec<(&'static str, Value)> {
    vec![("triggerTimes", json!([{ "mode": "everyDay", "hour": 9, "minute": 0 }]))]
}

fn http_request_defaults() -> Vec<(&'static str, Value)> {
    vec![("responseFormat", json!("json"))]
}

fn google_sheets_defaults() -> Vec<(&'static str, Value)> {
    vec![
        ("operation", json!("read")),
        ("sheetName", json!("Team Updates")),
        ("range", json!("A:B")),
    ]
}

fn openai_defaults() -> Vec<(&'static str, Value)> {
    vec![
        ("operation", json!("chat")),
        ("model", json!("gpt-4o-mini")),
        (
            "text",
            json!("={{'Summarize the following updates: ' + JSON.stringify($json)}}"),
        ),
    ]
}

fn slack_defaults() -> Vec<(&'static str, Value)> {
    vec![
        ("operation", json!("post")),
        ("channel", json!("#daily-summary")),
        ("text", json!("={{$json.text || 'Summary generated successfully.'}}")),
    ]
}

/// Fills well-known parameters for recognised node types without
/// overwriting anything already set.
pub fn apply_type_defaults(node: &mut Node) {
    let kind = node.kind.to_lowercase();
    let Some(defaults) = TYPE_DEFAULTS.iter().find(|d| kind.contains(d.marker)) else {
        return;
    };
    for (key, value) in (defaults.parameters)() {
        node.parameters.entry(key).or_insert(value);
    }
}
