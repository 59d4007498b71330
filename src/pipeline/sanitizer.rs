use std::collections::HashSet;
use tracing::debug;

use crate::workflow::{Connections, EdgeGroup, Link, Node};

/// Prunes a connections map against the node list.
///
/// 1. Source entries naming unknown nodes are dropped.
/// 2. Links to unknown nodes and self-links are dropped, then empty branches,
///    then sources left without any branch.
/// 3. Two-node cycles are broken: visiting sources in `nodes` order, each
///    retained edge `src -> dst` removes the back-edge `dst -> src`.
///
/// Cycles of three or more nodes are left untouched.
pub fn sanitize(connections: &Connections, nodes: &[Node]) -> Connections {
    let valid: HashSet<&str> = nodes.iter().map(|n| n.name.as_str()).collect();

    let mut pruned = Connections::new();
    for (source, group) in connections {
        if !valid.contains(source.as_str()) {
            debug!(source = %source, "Dropping connections from unknown node");
            continue;
        }

        let main: Vec<Vec<Link>> = group
            .main
            .iter()
            .map(|branch| {
                branch
                    .iter()
                    .filter(|link| {
                        let keep = valid.contains(link.node.as_str()) && link.node != *source;
                        if !keep {
                            debug!(source = %source, target = %link.node, "Dropping dangling or self link");
                        }
                        keep
                    })
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .filter(|branch| !branch.is_empty())
            .collect();

        if !main.is_empty() {
            pruned.insert(source.clone(), EdgeGroup { main });
        }
    }

    for node in nodes {
        let source = node.name.as_str();
        let targets: Vec<String> = match pruned.get(source) {
            Some(group) => group.targets().map(str::to_string).collect(),
            None => continue,
        };

        for target in targets {
            let Some(back) = pruned.get_mut(&target) else {
                continue;
            };
            if back.remove_links_to(source) {
                debug!(source = %target, target = %source, "Removed back-edge closing a 2-cycle");
            }
            if back.is_empty() {
                pruned.remove(&target);
            }
        }
    }

    pruned
}

/// Each node feeds the one after it.
pub fn linear_connections(nodes: &[Node]) -> Connections {
    nodes
        .windows(2)
        .map(|pair| (pair[0].name.clone(), EdgeGroup::single(&pair[1].name)))
        .collect()
}
