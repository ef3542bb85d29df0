use std::borrow::BorrowMut;

use anyhow::{Context, Result};
use pest::Parser as _;
use pest_derive::Parser;

use crate::ast::{Identifier, Predicate, Program, Rule as DatalogRule, Term};

#[derive(Parser)]
#[grammar = "datalog.pest"]
struct Parser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;
type Pairs<'a> = pest::iterators::Pairs<'a, Rule>;

pub fn parse_program(code: &str) -> Result<Program> {
    let program = Parser::parse(Rule::program, code)
        .context("Failed to parse program")?
        .next()
        .context("Parser produced no program")?;

    let mut sections = program.into_inner();
    let schemes = expect_next_rule(&mut sections, Rule::schemes);
    let facts = expect_next_rule(&mut sections, Rule::facts);
    let rules = expect_next_rule(&mut sections, Rule::rules);
    let queries = expect_next_rule(&mut sections, Rule::queries);

    Ok(Program {
        schemes: schemes.into_inner().map(convert_scheme).collect(),
        facts: facts.into_inner().map(convert_fact).collect(),
        rules: rules.into_inner().map(DatalogRule::from).collect(),
        queries: queries.into_inner().map(convert_query).collect(),
    })
}

/// Parses a single `Name(terms)?` line.
pub fn parse_query(code: &str) -> Result<Predicate> {
    let line = Parser::parse(Rule::query_line, code)
        .context("Failed to parse query")?
        .next()
        .context("Parser produced no query")?;

    Ok(convert_query(expect_next_rule(line.into_inner(), Rule::query)))
}

fn expect_next_rule<'a, P: BorrowMut<Pairs<'a>>>(mut pairs: P, expected: Rule) -> Pair<'a> {
    let pair = pairs.borrow_mut().next().expect("missing pair");
    assert_eq!(pair.as_rule(), expected);
    pair
}

fn convert_identifier(pair: Pair) -> Identifier {
    assert_eq!(pair.as_rule(), Rule::identifier);
    pair.as_str().to_string()
}

fn expect_identifier<'a, P: BorrowMut<Pairs<'a>>>(pairs: P) -> Identifier {
    convert_identifier(expect_next_rule(pairs, Rule::identifier))
}

fn convert_string(pair: Pair) -> Term {
    assert_eq!(pair.as_rule(), Rule::string);
    pair.as_str().to_string()
}

// Expressions flatten to `lhs op rhs` with the parentheses dropped.
fn convert_parameter(pair: Pair) -> Term {
    assert_eq!(pair.as_rule(), Rule::parameter);
    let inner = pair.into_inner().next().expect("empty parameter");

    match inner.as_rule() {
        Rule::string => convert_string(inner),
        Rule::identifier => convert_identifier(inner),
        Rule::expression => {
            let mut pairs = inner.into_inner();
            let lhs = convert_parameter(expect_next_rule(&mut pairs, Rule::parameter));
            let op = expect_next_rule(&mut pairs, Rule::operator);
            let rhs = convert_parameter(expect_next_rule(&mut pairs, Rule::parameter));
            format!("{}{}{}", lhs, op.as_str(), rhs)
        }
        _ => unreachable!(),
    }
}

fn convert_scheme(pair: Pair) -> Predicate {
    assert_eq!(pair.as_rule(), Rule::scheme);
    let mut pairs = pair.into_inner();
    let identifier = expect_identifier(&mut pairs);
    let terms = pairs.map(convert_identifier).collect();
    Predicate { identifier, terms }
}

fn convert_fact(pair: Pair) -> Predicate {
    assert_eq!(pair.as_rule(), Rule::fact);
    let mut pairs = pair.into_inner();
    let identifier = expect_identifier(&mut pairs);
    let terms = pairs.map(convert_string).collect();
    Predicate { identifier, terms }
}

fn convert_query(pair: Pair) -> Predicate {
    assert_eq!(pair.as_rule(), Rule::query);
    Predicate::from(expect_next_rule(pair.into_inner(), Rule::predicate))
}

impl From<Pair<'_>> for Predicate {
    fn from(pair: Pair<'_>) -> Self {
        assert_eq!(pair.as_rule(), Rule::predicate);
        let mut pairs = pair.into_inner();
        let identifier = expect_identifier(&mut pairs);
        let terms = pairs.map(convert_parameter).collect();
        Self { identifier, terms }
    }
}

impl From<Pair<'_>> for DatalogRule {
    fn from(pair: Pair<'_>) -> Self {
        assert_eq!(pair.as_rule(), Rule::rule);
        let mut pairs = pair.into_inner();

        let head = expect_next_rule(&mut pairs, Rule::head_predicate);
        let mut head_pairs = head.into_inner();
        let identifier = expect_identifier(&mut head_pairs);
        let terms = head_pairs.map(convert_identifier).collect();

        let body = pairs.map(Predicate::from).collect();

        Self {
            head: Predicate { identifier, terms },
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANCESTORS: &str = r#"
Schemes:
  Parent(a,b)
  Ancestor(a,b)

Facts:
  Parent('alice','bob').
  Parent('bob','carol'). # trailing comment

Rules:
  Ancestor(x,y) :- Parent(x,y).
  #| block
     comment |#
  Ancestor(x,y) :- Parent(x,z),Ancestor(z,y).

Queries:
  Ancestor('alice',y)?
"#;

    #[test]
    fn parses_all_sections() {
        let program = parse_program(ANCESTORS).unwrap();
        assert_eq!(program.schemes.len(), 2);
        assert_eq!(program.facts.len(), 2);
        assert_eq!(program.rules.len(), 2);
        assert_eq!(program.queries.len(), 1);

        assert_eq!(program.facts[1].to_string(), "Parent('bob','carol')");
        assert_eq!(
            program.rules[1].to_string(),
            "Ancestor(x,y) :- Parent(x,z),Ancestor(z,y)."
        );
        assert_eq!(program.queries[0].to_string(), "Ancestor('alice',y)");
    }

    #[test]
    fn keeps_escaped_apostrophes() {
        let program =
            parse_program("Schemes: S(a) Facts: S('it''s'). Rules: Queries: S(x)?").unwrap();
        assert_eq!(program.facts[0].terms, vec!["'it''s'"]);
    }

    #[test]
    fn flattens_expressions() {
        let query = parse_query("S((x+(y*z)), 'k')?").unwrap();
        assert_eq!(query.terms, vec!["x+y*z", "'k'"]);
    }

    #[test]
    fn allows_empty_facts_and_rules() {
        let program = parse_program("Schemes: S(a) Facts: Rules: Queries: S('x')?").unwrap();
        assert!(program.facts.is_empty());
        assert!(program.rules.is_empty());
    }

    #[test]
    fn rejects_missing_queries() {
        assert!(parse_program("Schemes: S(a) Facts: Rules: Queries:").is_err());
    }

    #[test]
    fn rejects_keywords_as_identifiers() {
        assert!(parse_program("Schemes: Facts(a) Facts: Rules: Queries: S('x')?").is_err());
    }
}
