//! Semantic checks on a parsed program.
//!
//! None of these stop evaluation: facts with the wrong shape are skipped,
//! rules that cannot contribute derive nothing, and queries on unknown
//! relations answer `No`. They are surfaced so the user can fix the source.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::ast::{term_kind, Predicate, Program, TermKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramIssue {
    #[error("scheme {0} is declared more than once")]
    DuplicateScheme(String),

    #[error("scheme {relation} repeats column {column}")]
    DuplicateColumn { relation: String, column: String },

    #[error("{place} {predicate} names undeclared relation {relation}")]
    UndeclaredRelation {
        place: &'static str,
        predicate: String,
        relation: String,
    },

    #[error("{place} {predicate} has {found} terms but {relation} has {expected} columns")]
    ArityMismatch {
        place: &'static str,
        predicate: String,
        relation: String,
        expected: usize,
        found: usize,
    },

    #[error("rule {rule} never binds head variable {variable}")]
    UnboundHeadVariable { rule: String, variable: String },
}

pub fn check_program(program: &Program) -> Vec<ProgramIssue> {
    let mut issues = Vec::new();
    let mut arities: BTreeMap<&str, usize> = BTreeMap::new();

    for scheme in &program.schemes {
        if arities
            .insert(&scheme.identifier, scheme.terms.len())
            .is_some()
        {
            issues.push(ProgramIssue::DuplicateScheme(scheme.identifier.clone()));
        }

        let mut seen = BTreeSet::new();
        for column in &scheme.terms {
            if !seen.insert(column) {
                issues.push(ProgramIssue::DuplicateColumn {
                    relation: scheme.identifier.clone(),
                    column: column.clone(),
                });
            }
        }
    }

    let mut check_shape = |place: &'static str, predicate: &Predicate| {
        match arities.get(predicate.identifier.as_str()) {
            None => issues.push(ProgramIssue::UndeclaredRelation {
                place,
                predicate: predicate.to_string(),
                relation: predicate.identifier.clone(),
            }),
            Some(&expected) if expected != predicate.terms.len() => {
                issues.push(ProgramIssue::ArityMismatch {
                    place,
                    predicate: predicate.to_string(),
                    relation: predicate.identifier.clone(),
                    expected,
                    found: predicate.terms.len(),
                })
            }
            Some(_) => {}
        }
    };

    for fact in &program.facts {
        check_shape("fact", fact);
    }
    for rule in &program.rules {
        check_shape("rule head", &rule.head);
        for predicate in &rule.body {
            check_shape("rule body", predicate);
        }
    }
    for query in &program.queries {
        check_shape("query", query);
    }

    for rule in &program.rules {
        let bound: BTreeSet<&str> = rule
            .body
            .iter()
            .flat_map(|predicate| &predicate.terms)
            .filter(|term| term_kind(term) != TermKind::Constant)
            .map(String::as_str)
            .collect();

        for variable in &rule.head.terms {
            if !bound.contains(variable.as_str()) {
                issues.push(ProgramIssue::UnboundHeadVariable {
                    rule: rule.to_string(),
                    variable: variable.clone(),
                });
            }
        }
    }

    issues
}
