use serde_json::json;
use taskwright::ids::{IdGenerator, PromptDigestIds, RandomIds};
use taskwright::outcome::Outcome;
use taskwright::workflow::builder::WorkflowBuilder;
use taskwright::workflow::{Link, is_scripting_type, is_trigger_type};

#[test]
fn test_builder_and_serialization_shape() {
    let graph = WorkflowBuilder::new("Shape")
        .id("wf-1")
        .node("Cron", "n8n-nodes-base.cron").build()
        .node("IF", "n8n-nodes-base.if").param("value", 1).build()
        .node("Yes", "n8n-nodes-base.set").build()
        .node("No", "n8n-nodes-base.noOp").build()
        .connect("Cron", "IF")
        .connect_branch("IF", "Yes", 0)
        .connect_branch("IF", "No", 1)
        .build();

    let value = graph.to_value();

    let mut keys: Vec<&str> = value.as_object().expect("object").keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["active", "connections", "id", "name", "nodes", "settings", "tags"]);
    assert_eq!(
        value["nodes"][1],
        json!({
            "name": "IF",
            "type": "n8n-nodes-base.if",
            "parameters": { "value": 1 },
            "typeVersion": 1,
            "position": [420, 300],
        })
    );
    assert_eq!(
        value["connections"]["IF"],
        json!({ "main": [
            [{ "node": "Yes", "type": "main", "index": 0 }],
            [{ "node": "No", "type": "main", "index": 0 }],
        ] })
    );
    assert_eq!(
        value["settings"],
        json!({ "timezone": "UTC", "executionOrder": "sequential", "saveManualExecutions": true })
    );
    assert_eq!(value["tags"], json!(["ai-generated", "auto"]));
    assert_eq!(value["active"], json!(false));
}

#[test]
fn test_graph_queries() {
    let graph = WorkflowBuilder::new("Queries")
        .node("A", "n8n-nodes-base.set").build()
        .node("B", "n8n-nodes-base.set").build()
        .node("C", "n8n-nodes-base.set").build()
        .connect("A", "C")
        .build();

    assert_eq!(graph.edges(), vec![("A", "C")]);
    assert!(graph.has_edge("A", "C"));
    assert!(!graph.has_edge("C", "A"));
    assert_eq!(graph.upstream_of("C").map(|n| n.name.as_str()), Some("A"));
    assert_eq!(graph.upstream_of("B").map(|n| n.name.as_str()), Some("A"));
    assert!(graph.upstream_of("A").is_none());
    assert!(graph.upstream_of("Ghost").is_none());
}

#[test]
fn test_link_deserialization_defaults() {
    let link: Link = serde_json::from_value(json!({ "node": "B" })).expect("link");
    assert_eq!(link, Link::main("B"));
}

#[test]
fn test_type_classification() {
    assert!(is_trigger_type("n8n-nodes-base.Cron"));
    assert!(is_trigger_type("n8n-nodes-base.webhook"));
    assert!(is_trigger_type("n8n-nodes-base.scheduleTrigger"));
    assert!(!is_trigger_type("n8n-nodes-base.httpRequest"));

    assert!(is_scripting_type("n8n-nodes-base.function"));
    assert!(is_scripting_type("n8n-nodes-base.functionItem"));
    assert!(is_scripting_type("n8n-nodes-base.Code"));
    assert!(is_scripting_type("code"));
    assert!(!is_scripting_type("n8n-nodes-base.codeReview"));
}

#[test]
fn test_workflow_ids() {
    let id = PromptDigestIds.workflow_id("post a digest");
    assert_eq!(id, PromptDigestIds.workflow_id("post a digest"));
    assert_ne!(id, PromptDigestIds.workflow_id("post a summary"));
    let digits = id.strip_prefix("AI-Generated-").expect("prefix");
    assert_eq!(digits.len(), 8);
    assert!(digits.chars().all(|c| c.is_ascii_digit()));

    let random = RandomIds.workflow_id("post a digest");
    assert!(random.starts_with("AI-Generated-"));
    assert_ne!(random, RandomIds.workflow_id("post a digest"));
}

#[test]
fn test_outcome_helpers() {
    let ok: Outcome<u8> = Outcome::Ok(1);
    assert!(!ok.is_degraded());
    assert_eq!(ok.reason(), None);

    let degraded = Outcome::degraded(0u8, "fell back").map(|v| v + 1);
    assert!(degraded.is_degraded());
    assert_eq!(degraded.reason(), Some("fell back"));
    assert_eq!(degraded.into_value(), 1);
}
