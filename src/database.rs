use std::collections::BTreeMap;

use tracing::warn;

use crate::ast::Program;
use crate::relation::Relation;
use crate::tuple::Tuple;

/// Relations keyed by name. Each name maps to exactly one relation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Database {
    relations: BTreeMap<String, Relation>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty relation per scheme, then loads every fact. Facts
    /// for undeclared relations or with the wrong arity are skipped.
    pub fn from_program(program: &Program) -> Self {
        let mut database = Self::new();

        for scheme in &program.schemes {
            let schema: Tuple = scheme.terms.iter().cloned().collect();
            database.add_relation(Relation::new(scheme.identifier.clone(), schema));
        }

        for fact in &program.facts {
            let relation = match database.relations.get_mut(&fact.identifier) {
                Some(relation) => relation,
                None => {
                    warn!(relation = %fact.identifier, "fact names an undeclared relation");
                    continue;
                }
            };
            let arity = relation.arity();
            let row: Tuple = fact.terms.iter().cloned().collect();
            if row.len() != arity {
                warn!(
                    relation = %fact.identifier,
                    expected = arity,
                    found = row.len(),
                    "fact arity does not match its scheme"
                );
                continue;
            }
            relation.insert(row);
        }

        database
    }

    /// Stores `relation` under its name, replacing any previous entry.
    /// Returns `false`, leaving the database untouched, when an identical
    /// relation is already stored.
    pub fn add_relation(&mut self, relation: Relation) -> bool {
        match self.relations.get(relation.name()) {
            Some(existing) if *existing == relation => false,
            _ => {
                self.relations.insert(relation.name().to_owned(), relation);
                true
            }
        }
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Total number of rows across all relations.
    pub fn fact_count(&self) -> usize {
        self.relations.values().map(Relation::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Predicate;

    #[test]
    fn identical_relation_is_a_no_op() {
        let mut database = Database::new();
        let relation = Relation::new("R", ["a"].into_iter().collect());
        assert!(database.add_relation(relation.clone()));
        assert!(!database.add_relation(relation));
    }

    #[test]
    fn differing_relation_replaces() {
        let mut database = Database::new();
        let mut relation = Relation::new("R", ["a"].into_iter().collect());
        database.add_relation(relation.clone());

        relation.insert(["'1'"].into_iter().collect());
        assert!(database.add_relation(relation));
        assert_eq!(database.relation("R").map(Relation::len), Some(1));
        assert_eq!(database.len(), 1);
    }

    #[test]
    fn loads_schemes_and_valid_facts() {
        let program = Program {
            schemes: vec![Predicate::new("S", ["a", "b"])],
            facts: vec![
                Predicate::new("S", ["'1'", "'2'"]),
                Predicate::new("S", ["'1'"]),
                Predicate::new("T", ["'1'"]),
                Predicate::new("S", ["'1'", "'2'"]),
            ],
            ..Program::default()
        };

        let database = Database::from_program(&program);
        assert_eq!(database.len(), 1);
        assert_eq!(database.fact_count(), 1);
        assert!(database.relation("T").is_none());
    }
}
