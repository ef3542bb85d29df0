//! Rule dependency graph.
//!
//! Each node wraps one rule; an edge `A -> B` means a predicate in the body
//! of rule `A` reads the relation rule `B` derives. Nodes are identified by
//! the rule instance they wrap, so two textually identical rules are still
//! two nodes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use itertools::Itertools;

use crate::ast::Rule;

pub type NodeId = usize;

#[derive(Clone, Debug)]
pub struct Node<'a> {
    id: NodeId,
    rule: &'a Rule,
    adjacency: BTreeMap<NodeId, &'a Rule>,
    postorder: Option<usize>,
}

impl<'a> Node<'a> {
    fn new(id: NodeId, rule: &'a Rule) -> Self {
        Self {
            id,
            rule,
            adjacency: BTreeMap::new(),
            postorder: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn rule(&self) -> &'a Rule {
        self.rule
    }

    pub fn adjacency(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }

    /// Finish number from the last postorder traversal, starting at 1.
    pub fn postorder(&self) -> Option<usize> {
        self.postorder
    }
}

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph<'a> {
    nodes: BTreeMap<NodeId, Node<'a>>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph for `rules`. Every rule is registered first, so node
    /// ids equal rule indices.
    pub fn from_rules(rules: &'a [Rule]) -> Self {
        let mut graph = Self::new();

        for rule in rules {
            graph.add_dependency(rule, None);
        }

        for rule in rules {
            for predicate in &rule.body {
                for target in rules
                    .iter()
                    .filter(|target| target.head.identifier == predicate.identifier)
                {
                    graph.add_dependency(rule, Some(target));
                }
            }
        }

        graph
    }

    /// Id of the node wrapping `rule`, creating the node if needed.
    pub fn node_for_rule(&mut self, rule: &'a Rule) -> NodeId {
        if let Some(node) = self.nodes.values().find(|node| std::ptr::eq(node.rule, rule)) {
            return node.id;
        }

        let id = self.nodes.keys().next_back().map_or(0, |last| last + 1);
        self.nodes.insert(id, Node::new(id, rule));
        id
    }

    /// Adds the edge `parent -> child`. With no child, only makes sure
    /// `parent` has a node. Returns whether the graph changed.
    pub fn add_dependency(&mut self, parent: &'a Rule, child: Option<&'a Rule>) -> bool {
        let before = self.nodes.len();
        let parent_id = self.node_for_rule(parent);

        let added_edge = match child {
            Some(child) => {
                let child_id = self.node_for_rule(child);
                self.nodes
                    .get_mut(&parent_id)
                    .map_or(false, |node| node.adjacency.insert(child_id, child).is_none())
            }
            None => false,
        };

        added_edge || self.nodes.len() > before
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<'a>> {
        self.nodes.get(&id)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node<'a>> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.nodes
            .get(&from)
            .map_or(false, |node| node.adjacency.contains_key(&to))
    }

    /// Successors of `id` that are nodes of this graph, ascending.
    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|node| node.adjacency())
            .filter(move |next| self.nodes.contains_key(next))
    }

    /// True when the rules must be iterated to a fixpoint: more than one
    /// rule, or a rule that reads its own head.
    pub fn is_recursive(&self) -> bool {
        self.nodes.len() > 1 || self.nodes.keys().any(|&id| self.has_edge(id, id))
    }

    /// Numbers every node 1..=N in DFS finish order. The forest starts from
    /// the lowest unvisited id and explores lower-numbered neighbors first.
    pub fn compute_postorder(&mut self) {
        for node in self.nodes.values_mut() {
            node.postorder = None;
        }

        let mut visited = BTreeSet::new();
        let mut next = 1;
        for id in self.node_ids() {
            if !visited.contains(&id) {
                next = self.number_from(id, next, &mut visited);
            }
        }
    }

    fn number_from(&mut self, start: NodeId, mut next: usize, visited: &mut BTreeSet<NodeId>) -> usize {
        let mut stack = vec![start];

        while let Some(&current) = stack.last() {
            if !visited.insert(current) {
                // Second time on top: every child has finished.
                stack.pop();
                if let Some(node) = self.nodes.get_mut(&current) {
                    if node.postorder.is_none() {
                        node.postorder = Some(next);
                        next += 1;
                    }
                }
                continue;
            }

            let children: Vec<NodeId> = self
                .successors(current)
                .filter(|child| !visited.contains(child))
                .collect();
            stack.extend(children.into_iter().rev());
        }

        next
    }

    /// Node ids sorted by ascending postorder number.
    pub fn postorder(&mut self) -> Vec<NodeId> {
        self.compute_postorder();
        self.nodes
            .values()
            .sorted_by_key(|node| node.postorder)
            .map(|node| node.id)
            .collect()
    }

    /// One `R<id>: <postorder>` line per node.
    pub fn postorder_listing(&mut self) -> String {
        self.compute_postorder();
        self.nodes
            .values()
            .map(|node| format!("R{}: {}\n", node.id, node.postorder.unwrap_or_default()))
            .collect()
    }

    /// The same nodes with every edge reversed.
    pub fn invert(&self) -> DependencyGraph<'a> {
        let mut nodes: BTreeMap<NodeId, Node<'a>> = self
            .nodes
            .values()
            .map(|node| (node.id, Node::new(node.id, node.rule)))
            .collect();

        for node in self.nodes.values() {
            for target in node.adjacency() {
                if let Some(reversed) = nodes.get_mut(&target) {
                    reversed.adjacency.insert(node.id, node.rule);
                }
            }
        }

        DependencyGraph { nodes }
    }

    /// The subgraph induced by `ids`, keeping original ids and the edges
    /// between members.
    pub fn subgraph(&self, ids: &BTreeSet<NodeId>) -> DependencyGraph<'a> {
        let nodes = self
            .nodes
            .values()
            .filter(|node| ids.contains(&node.id))
            .map(|node| {
                let mut member = Node::new(node.id, node.rule);
                member.adjacency = node
                    .adjacency
                    .iter()
                    .filter(|(target, _)| ids.contains(target))
                    .map(|(&target, &rule)| (target, rule))
                    .collect();
                (node.id, member)
            })
            .collect();

        DependencyGraph { nodes }
    }

    /// `R0,R1,...` for the member ids.
    pub fn member_list(&self) -> String {
        self.nodes.keys().map(|id| format!("R{}", id)).join(",")
    }
}

impl fmt::Display for DependencyGraph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.nodes.values() {
            writeln!(
                f,
                "R{}:{}",
                node.id,
                node.adjacency().map(|id| format!("R{}", id)).join(",")
            )?;
        }
        Ok(())
    }
}
