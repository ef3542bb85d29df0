//! Strongly connected components of a [`DependencyGraph`], via Kosaraju's
//! algorithm with an explicit stack.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::graph::{DependencyGraph, NodeId};

/// Splits `graph` into its strongly connected components.
///
/// Components come out in evaluation order: a component is listed only
/// after every component its rules read from.
pub fn strongly_connected_components<'a>(graph: &DependencyGraph<'a>) -> Vec<DependencyGraph<'a>> {
    let mut reversed = graph.invert();
    let order = reversed.postorder();
    let rank: BTreeMap<NodeId, usize> = reversed
        .nodes()
        .map(|node| (node.id(), node.postorder().unwrap_or_default()))
        .collect();

    let mut assigned = BTreeSet::new();
    let mut components = Vec::new();

    for &root in order.iter().rev() {
        if assigned.contains(&root) {
            continue;
        }
        let members = reachable_from(graph, root, &rank, &mut assigned);
        trace!(root, size = members.len(), "found strongly connected component");
        components.push(graph.subgraph(&members));
    }

    components
}

/// Collects every node reachable from `root` in `graph` that no earlier
/// component claimed. Neighbors with higher rank are explored first.
fn reachable_from(
    graph: &DependencyGraph<'_>,
    root: NodeId,
    rank: &BTreeMap<NodeId, usize>,
    assigned: &mut BTreeSet<NodeId>,
) -> BTreeSet<NodeId> {
    let mut members = BTreeSet::new();
    let mut stack = vec![root];
    assigned.insert(root);

    while let Some(current) = stack.pop() {
        members.insert(current);

        let mut next: Vec<NodeId> = graph
            .successors(current)
            .filter(|id| !assigned.contains(id))
            .collect();
        // Highest rank ends up on top of the stack.
        next.sort_by_key(|id| rank.get(id).copied().unwrap_or_default());
        for id in next {
            assigned.insert(id);
            stack.push(id);
        }
    }

    members
}
