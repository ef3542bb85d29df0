//! Rule evaluation to a fixpoint.
//!
//! Rules are grouped into strongly connected components of their
//! dependency graph and each component is run to its own fixpoint, in an
//! order where every component runs after the components it reads from.
//! With optimization off, all rules form one component.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::ast::{Program, Rule};
use crate::binding::bind;
use crate::config::EvaluationConfig;
use crate::database::Database;
use crate::graph::DependencyGraph;
use crate::query;
use crate::relation::Relation;
use crate::report::{ComponentReport, Report, RuleReport, RuleTrace};
use crate::scc::strongly_connected_components;
use crate::tuple::Tuple;

/// Applies rules to a database, remembering which tuples have already been
/// reported per relation so each derived tuple is traced exactly once.
pub struct RuleEvaluator<'d> {
    database: &'d mut Database,
    reported: BTreeMap<String, BTreeSet<String>>,
}

impl<'d> RuleEvaluator<'d> {
    pub fn new(database: &'d mut Database) -> Self {
        Self {
            database,
            reported: BTreeMap::new(),
        }
    }

    /// Evaluates `rule` once and unions the result into its head relation.
    pub fn evaluate_rule(&mut self, rule: &Rule) -> RuleTrace {
        let mut trace = RuleTrace {
            rule: rule.to_string(),
            derived: Vec::new(),
        };

        let derived = match self.derive(rule) {
            Some(derived) => derived,
            None => return trace,
        };
        let head = match self.database.relation(&rule.head.identifier) {
            Some(head) => head,
            None => return trace,
        };

        let reported = self.reported.entry(head.name().to_owned()).or_default();
        reported.extend(head.rendered_rows());

        let merged = head.union(&derived);
        let fresh: Vec<String> = merged
            .rendered_rows()
            .filter(|row| !reported.contains(row))
            .collect();

        if self.database.add_relation(merged) {
            reported.extend(fresh.iter().cloned());
            trace.derived = fresh;
        }

        trace
    }

    /// Joins the bound body predicates and reshapes the result to match the
    /// head relation. `None` if the rule cannot contribute.
    fn derive(&self, rule: &Rule) -> Option<Relation> {
        let head = match self.database.relation(&rule.head.identifier) {
            Some(head) => head,
            None => {
                warn!(rule = %rule, "rule head names an undeclared relation");
                return None;
            }
        };

        let mut bound = rule.body.iter().filter_map(|predicate| {
            self.database
                .relation(&predicate.identifier)
                .map(|relation| bind(relation, predicate).relation)
        });
        let first = bound.next()?;
        let joined = bound.fold(first, |joined, next| joined.join(&next));

        let head_terms: Tuple = rule.head.terms.iter().cloned().collect();
        let mut derived = joined.project(&head_terms).rename_schema(head.schema());
        derived.set_name(head.name());

        if derived.schema() != head.schema() {
            warn!(
                rule = %rule,
                "rule result is not union-compatible with its head relation"
            );
            return None;
        }

        Some(derived)
    }

    /// Runs the rules of `component` in id order. Recursive components repeat
    /// until a pass adds no tuple; others run exactly once.
    pub fn evaluate_component(&mut self, component: &DependencyGraph<'_>) -> ComponentReport {
        let recursive = component.is_recursive();
        let mut passes = 0;
        let mut traces = Vec::new();

        loop {
            passes += 1;
            let mut added = false;

            for node in component.nodes() {
                let trace = self.evaluate_rule(node.rule());
                added |= !trace.derived.is_empty();
                traces.push(trace);
            }

            debug!(
                members = %component.member_list(),
                pass = passes,
                added,
                "finished rule pass"
            );

            if !recursive || !added {
                break;
            }
        }

        ComponentReport {
            members: component.node_ids(),
            passes,
            traces,
        }
    }

    /// Evaluates every rule to a fixpoint, optionally component by component.
    pub fn evaluate_rules(&mut self, graph: &DependencyGraph<'_>, optimize: bool) -> RuleReport {
        if !optimize {
            return RuleReport::Naive(self.evaluate_component(graph));
        }

        let components = strongly_connected_components(graph);
        debug!(count = components.len(), "scheduling strongly connected components");
        RuleReport::Optimized(
            components
                .iter()
                .map(|component| self.evaluate_component(component))
                .collect(),
        )
    }
}

/// The result of running a whole program.
#[derive(Clone, Debug)]
pub struct Evaluation {
    pub database: Database,
    pub report: Report,
}

/// Loads schemes and facts, evaluates the rules, then answers the queries.
pub fn evaluate(program: &Program, config: &EvaluationConfig) -> Evaluation {
    let mut database = Database::from_program(program);
    info!(
        relations = database.len(),
        facts = database.fact_count(),
        "loaded schemes and facts"
    );

    let graph = DependencyGraph::from_rules(&program.rules);
    let dependency_graph = (config.optimize && config.print_dependency_graph)
        .then(|| graph.to_string());
    let postorder = (config.optimize && config.print_postorder)
        .then(|| graph.invert().postorder_listing());

    let rules = RuleEvaluator::new(&mut database).evaluate_rules(&graph, config.optimize);
    info!(
        passes = rules.total_passes(),
        facts = database.fact_count(),
        "rule evaluation reached a fixpoint"
    );

    let queries = query::answer_all(&database, &program.queries);

    Evaluation {
        database,
        report: Report {
            dependency_graph,
            postorder,
            rules,
            queries,
            trace_rules: config.trace_rules,
        },
    }
}
