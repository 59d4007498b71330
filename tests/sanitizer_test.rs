use taskwright::pipeline::sanitizer::{linear_connections, sanitize};
use taskwright::workflow::builder::WorkflowBuilder;
use taskwright::workflow::{Connections, EdgeGroup, Link, Node};

fn nodes(names: &[&str]) -> Vec<Node> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Node::new(name, "n8n-nodes-base.set", i))
        .collect()
}

fn edges(connections: &Connections) -> Vec<(String, String)> {
    connections
        .iter()
        .flat_map(|(source, group)| {
            group
                .targets()
                .map(|target| (source.clone(), target.to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[test]
fn test_mutual_pair_keeps_forward_edge() {
    let graph = WorkflowBuilder::new("pair")
        .node("A", "n8n-nodes-base.set").build()
        .node("B", "n8n-nodes-base.set").build()
        .connect("A", "B")
        .connect("B", "A")
        .build();

    let clean = sanitize(&graph.connections, &graph.nodes);

    assert_eq!(edges(&clean), vec![("A".to_string(), "B".to_string())]);
    assert!(!clean.contains_key("B"), "B lost its only branch");
}

#[test]
fn test_back_edge_follows_node_order() {
    // B is listed first, so B -> A is the retained direction.
    let graph = WorkflowBuilder::new("pair")
        .node("B", "n8n-nodes-base.set").build()
        .node("A", "n8n-nodes-base.set").build()
        .connect("A", "B")
        .connect("B", "A")
        .build();

    let clean = sanitize(&graph.connections, &graph.nodes);

    assert_eq!(edges(&clean), vec![("B".to_string(), "A".to_string())]);
}

#[test]
fn test_unknown_nodes_are_dropped() {
    let graph = WorkflowBuilder::new("dangling")
        .node("A", "n8n-nodes-base.set").build()
        .node("B", "n8n-nodes-base.set").build()
        .connect("A", "B")
        .connect("A", "C")
        .connect("C", "A")
        .build();

    let clean = sanitize(&graph.connections, &graph.nodes);

    assert_eq!(edges(&clean), vec![("A".to_string(), "B".to_string())]);
    assert!(!clean.contains_key("C"));
}

#[test]
fn test_self_links_are_dropped() {
    let graph = WorkflowBuilder::new("loop")
        .node("A", "n8n-nodes-base.set").build()
        .node("B", "n8n-nodes-base.set").build()
        .connect("A", "A")
        .connect("B", "B")
        .connect_branch("A", "B", 1)
        .build();

    let clean = sanitize(&graph.connections, &graph.nodes);

    // Branch 0 only held the self link and is gone.
    assert_eq!(clean["A"].main, vec![vec![Link::main("B")]]);
    assert!(!clean.contains_key("B"));
}

#[test]
fn test_three_cycle_is_left_alone() {
    let graph = WorkflowBuilder::new("triangle")
        .node("A", "n8n-nodes-base.set").build()
        .node("B", "n8n-nodes-base.set").build()
        .node("C", "n8n-nodes-base.set").build()
        .connect("A", "B")
        .connect("B", "C")
        .connect("C", "A")
        .build();

    let clean = sanitize(&graph.connections, &graph.nodes);

    assert_eq!(clean, graph.connections);
}

#[test]
fn test_empty_groups_are_removed() {
    let mut connections = Connections::new();
    connections.insert("A".to_string(), EdgeGroup { main: vec![vec![], vec![]] });

    let clean = sanitize(&connections, &nodes(&["A", "B"]));

    assert!(clean.is_empty());
}

#[test]
fn test_sanitize_is_deterministic() {
    let graph = WorkflowBuilder::new("fan")
        .node("A", "n8n-nodes-base.set").build()
        .node("B", "n8n-nodes-base.set").build()
        .node("C", "n8n-nodes-base.set").build()
        .connect("A", "B")
        .connect("A", "C")
        .connect("B", "A")
        .connect("C", "A")
        .connect("C", "B")
        .build();

    let first = sanitize(&graph.connections, &graph.nodes);
    let second = sanitize(&graph.connections, &graph.nodes);

    assert_eq!(first, second);
    assert_eq!(sanitize(&first, &graph.nodes), first);
}

#[test]
fn test_random_graphs_hold_invariants() {
    let names = ["A", "B", "C", "D", "E", "X"];
    let known = nodes(&names[..5]);

    // Small LCG keeps the case list reproducible.
    let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
    let mut next = |bound: usize| {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((seed >> 33) as usize) % bound
    };

    for _ in 0..200 {
        let mut connections = Connections::new();
        for _ in 0..next(12) {
            let source = names[next(names.len())];
            let target = names[next(names.len())];
            let branch = next(2);
            let group = connections.entry(source.to_string()).or_default();
            while group.main.len() <= branch {
                group.main.push(Vec::new());
            }
            group.main[branch].push(Link::main(target));
        }

        let clean = sanitize(&connections, &known);
        let pairs = edges(&clean);

        for (source, target) in &pairs {
            assert!(known.iter().any(|n| &n.name == source), "unknown source {source}");
            assert!(known.iter().any(|n| &n.name == target), "unknown target {target}");
            assert_ne!(source, target, "self loop survived");
            assert!(
                !pairs.contains(&(target.clone(), source.clone())),
                "both {source}->{target} and {target}->{source} survived"
            );
        }
        for group in clean.values() {
            assert!(!group.main.is_empty());
            assert!(group.main.iter().all(|branch| !branch.is_empty()));
        }
    }
}

#[test]
fn test_linear_connections() {
    let chain = linear_connections(&nodes(&["A", "B", "C"]));

    assert_eq!(chain.len(), 2);
    assert_eq!(chain["A"], EdgeGroup::single("B"));
    assert_eq!(chain["B"], EdgeGroup::single("C"));
    assert!(linear_connections(&nodes(&["A"])).is_empty());
}
