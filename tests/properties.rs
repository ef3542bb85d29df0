//! Property-based tests for the relational algebra, the fixpoint and the
//! component scheduler (proptest).

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use dlrel::config::EvaluationConfig;
use dlrel::graph::NodeId;
use dlrel::{evaluate, parse_program, strongly_connected_components};
use dlrel::{DependencyGraph, Predicate, Relation, Rule, Tuple};

fn value(n: u8) -> String {
    format!("'{}'", n)
}

fn relation(name: &str, schema: &[&str], rows: &[(u8, u8)]) -> Relation {
    let mut relation = Relation::new(name, schema.iter().copied().collect());
    for &(a, b) in rows {
        relation.insert(Tuple::new(vec![value(a), value(b)]));
    }
    relation
}

fn pairs() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..5, 0u8..5), 0..16)
}

/// Transitive closure by repeated composition.
fn closure(edges: &[(u8, u8)]) -> BTreeSet<(String, String)> {
    let mut paths: BTreeSet<(u8, u8)> = edges.iter().copied().collect();
    loop {
        let extended: BTreeSet<(u8, u8)> = edges
            .iter()
            .flat_map(|&(x, z)| {
                paths
                    .iter()
                    .filter(move |&&(from, _)| from == z)
                    .map(move |&(_, y)| (x, y))
            })
            .collect();
        let before = paths.len();
        paths.extend(extended);
        if paths.len() == before {
            break;
        }
    }
    paths.into_iter().map(|(x, y)| (value(x), value(y))).collect()
}

fn closure_program(edges: &[(u8, u8)]) -> String {
    let facts: String = edges
        .iter()
        .map(|&(x, y)| format!("Edge({},{}).\n", value(x), value(y)))
        .collect();
    format!(
        "Schemes: Edge(x,y) Path(x,y)
         Facts: {}
         Rules:
            Path(x,y) :- Edge(x,y).
            Path(x,y) :- Edge(x,z),Path(z,y).
         Queries: Path(x,y)?",
        facts
    )
}

fn rules_strategy() -> impl Strategy<Value = Vec<Rule>> {
    prop::collection::vec((0usize..5, prop::collection::vec(0usize..6, 0..3)), 1..9).prop_map(
        |shapes| {
            shapes
                .into_iter()
                .map(|(head, body)| Rule {
                    head: Predicate::new(format!("P{}", head), ["x"]),
                    body: body
                        .into_iter()
                        .map(|name| Predicate::new(format!("P{}", name), ["x"]))
                        .collect(),
                })
                .collect()
        },
    )
}

fn reachable(graph: &DependencyGraph<'_>, start: NodeId) -> BTreeSet<NodeId> {
    let mut seen = BTreeSet::from([start]);
    let mut stack = vec![start];
    while let Some(current) = stack.pop() {
        for next in graph.successors(current) {
            if seen.insert(next) {
                stack.push(next);
            }
        }
    }
    seen
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Inserting the same rows twice never grows a relation
    #[test]
    fn prop_relations_are_sets(rows in pairs()) {
        let once = relation("R", &["a", "b"], &rows);
        let mut twice = once.clone();
        for &(a, b) in &rows {
            prop_assert!(!twice.insert(Tuple::new(vec![value(a), value(b)])));
        }

        let distinct: BTreeSet<(u8, u8)> = rows.iter().copied().collect();
        prop_assert_eq!(once.len(), distinct.len());
        prop_assert_eq!(twice, once);
    }

    /// Joining in either order gives the same rows once columns are aligned
    #[test]
    fn prop_join_commutes(left in pairs(), right in pairs()) {
        let r = relation("R", &["a", "b"], &left);
        let s = relation("S", &["b", "c"], &right);

        let rs = r.join(&s);
        let sr = s.join(&r).project(rs.schema());
        prop_assert_eq!(rs.schema(), sr.schema());
        prop_assert_eq!(rs.rows(), sr.rows());

        for row in rs.rows() {
            prop_assert!(r.contains(&Tuple::new(vec![row[0].clone(), row[1].clone()])));
            prop_assert!(s.contains(&Tuple::new(vec![row[1].clone(), row[2].clone()])));
        }
    }

    /// Projecting twice onto the same columns is the same as once
    #[test]
    fn prop_projection_is_idempotent(rows in pairs(), reversed in any::<bool>()) {
        let r = relation("R", &["a", "b"], &rows);
        let columns = if reversed { ["b", "a"] } else { ["b", "b"] };
        let target: Tuple = columns.into_iter().collect();

        prop_assert_eq!(&r.project(r.schema()), &r);

        let once = r.project(&target);
        let twice = once.project(&target);
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.len() <= r.len());
    }

    /// The fixpoint is the transitive closure, reached in a bounded number
    /// of passes by both schedulers
    #[test]
    fn prop_fixpoint_is_the_closure(edges in pairs()) {
        let program = parse_program(&closure_program(&edges)).unwrap();
        let optimized = evaluate(&program, &EvaluationConfig::default());
        let naive = evaluate(&program, &EvaluationConfig {
            optimize: false,
            ..EvaluationConfig::default()
        });

        let path = optimized.database.relation("Path").unwrap();
        let derived: BTreeSet<(String, String)> = path
            .rows()
            .iter()
            .map(|row| (row[0].clone(), row[1].clone()))
            .collect();
        let expected = closure(&edges);

        prop_assert_eq!(&derived, &expected);
        prop_assert_eq!(&optimized.database, &naive.database);
        prop_assert!(naive.report.rules.total_passes() <= expected.len() + 1);
    }

    /// Every rule lands in exactly one component, components are exactly
    /// the mutually reachable sets, and dependencies come first
    #[test]
    fn prop_components_are_sound(rules in rules_strategy()) {
        let graph = DependencyGraph::from_rules(&rules);
        let components = strongly_connected_components(&graph);

        let mut component_of: BTreeMap<NodeId, usize> = BTreeMap::new();
        for (index, component) in components.iter().enumerate() {
            for id in component.node_ids() {
                prop_assert!(component_of.insert(id, index).is_none());
            }
        }
        prop_assert_eq!(component_of.len(), graph.len());

        let reach: BTreeMap<NodeId, BTreeSet<NodeId>> = graph
            .node_ids()
            .into_iter()
            .map(|id| (id, reachable(&graph, id)))
            .collect();

        for a in graph.node_ids() {
            for b in graph.node_ids() {
                let mutual = reach[&a].contains(&b) && reach[&b].contains(&a);
                prop_assert_eq!(mutual, component_of[&a] == component_of[&b]);

                if graph.has_edge(a, b) {
                    prop_assert!(component_of[&b] <= component_of[&a]);
                }
            }
        }
    }
}
