use tracing::debug;

use crate::ast::Predicate;
use crate::binding::{bind, Binding};
use crate::database::Database;
use crate::report::QueryAnswer;

/// Answers one query against the database. A query naming an unknown
/// relation is answered `No`.
pub fn answer(database: &Database, query: &Predicate) -> QueryAnswer {
    let relation = match database.relation(&query.identifier) {
        Some(relation) => relation,
        None => {
            debug!(relation = %query.identifier, "query names an unknown relation");
            return QueryAnswer::no(query.to_string());
        }
    };

    let Binding { relation, matches } = bind(relation, query);
    QueryAnswer {
        query: query.to_string(),
        matches,
        bindings: relation.rendered_rows().collect(),
    }
}

pub fn answer_all(database: &Database, queries: &[Predicate]) -> Vec<QueryAnswer> {
    queries.iter().map(|query| answer(database, query)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;

    fn family() -> Database {
        Database::from_program(&Program {
            schemes: vec![Predicate::new("Parent", ["a", "b"])],
            facts: vec![
                Predicate::new("Parent", ["'alice'", "'bob'"]),
                Predicate::new("Parent", ["'alice'", "'bill'"]),
                Predicate::new("Parent", ["'bob'", "'carol'"]),
            ],
            ..Program::default()
        })
    }

    #[test]
    fn reports_count_and_sorted_bindings() {
        let answer = answer(&family(), &Predicate::new("Parent", ["'alice'", "y"]));
        assert_eq!(answer.to_string(), "Parent('alice',y)? Yes(2)\n  y='bill'\n  y='bob'");
    }

    #[test]
    fn ground_query_has_no_binding_lines() {
        let answer = answer(&family(), &Predicate::new("Parent", ["'bob'", "'carol'"]));
        assert_eq!(answer.to_string(), "Parent('bob','carol')? Yes(1)");
    }

    #[test]
    fn unknown_relation_is_no() {
        let answer = answer(&family(), &Predicate::new("Sibling", ["x", "y"]));
        assert_eq!(answer.to_string(), "Sibling(x,y)? No");
    }

    #[test]
    fn binds_every_free_column() {
        let all = answer(&family(), &Predicate::new("Parent", ["x", "y"]));
        assert_eq!(all.matches, 3);
        assert_eq!(all.bindings.len(), 3);

        let parents = answer(&family(), &Predicate::new("Parent", ["x", "'bob'"]));
        assert_eq!(parents.bindings, vec!["x='alice'"]);
    }
}
