use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;

pub type Identifier = String;
pub type RelationName = Identifier;
pub type Term = String;

/// How a predicate term takes part in matching. Terms stay opaque strings;
/// this is only a classification of their surface form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermKind {
    /// A quoted string such as `'alice'`.
    Constant,
    /// A plain identifier.
    Variable,
    /// A flattened arithmetic expression such as `x+y`.
    Expression,
}

pub fn term_kind(term: &str) -> TermKind {
    if term.starts_with('\'') {
        TermKind::Constant
    } else if term.chars().all(|c| c.is_ascii_alphanumeric()) {
        TermKind::Variable
    } else {
        TermKind::Expression
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Predicate {
    pub identifier: RelationName,
    pub terms: Vec<Term>,
}

impl Predicate {
    pub fn new(identifier: impl Into<String>, terms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            identifier: identifier.into(),
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.identifier, self.terms.iter().join(","))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub head: Predicate,
    pub body: Vec<Predicate>,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :- {}.", self.head, self.body.iter().join(","))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Program {
    pub schemes: Vec<Predicate>,
    pub facts: Vec<Predicate>,
    pub rules: Vec<Rule>,
    pub queries: Vec<Predicate>,
}

impl Program {
    /// Every distinct constant appearing in a fact, sorted.
    pub fn domain(&self) -> BTreeSet<&str> {
        self.facts
            .iter()
            .flat_map(|fact| &fact.terms)
            .map(String::as_str)
            .collect()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Schemes({}):", self.schemes.len())?;
        for scheme in &self.schemes {
            writeln!(f, "  {}", scheme)?;
        }

        writeln!(f, "Facts({}):", self.facts.len())?;
        for fact in &self.facts {
            writeln!(f, "  {}.", fact)?;
        }

        writeln!(f, "Rules({}):", self.rules.len())?;
        for rule in &self.rules {
            writeln!(f, "  {}", rule)?;
        }

        writeln!(f, "Queries({}):", self.queries.len())?;
        for query in &self.queries {
            writeln!(f, "  {}?", query)?;
        }

        let domain = self.domain();
        write!(f, "Domain({}):", domain.len())?;
        for value in domain {
            write!(f, "\n  {}", value)?;
        }

        Ok(())
    }
}
