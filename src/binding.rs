//! Binds a predicate's terms against a relation.
//!
//! Constants become column-equals-value filters and repeated variables
//! become column-equals-column filters. The filtered rows are then projected
//! onto the first occurrence of each variable, and those columns are renamed
//! to the variable names.

use std::collections::HashMap;

use crate::ast::{term_kind, Predicate, TermKind};
use crate::relation::Relation;
use crate::tuple::Tuple;

#[derive(Clone, Debug)]
pub struct Binding {
    /// One column per distinct variable, named after it.
    pub relation: Relation,
    /// Rows that passed the filters, counted before projection.
    pub matches: usize,
}

pub fn bind(relation: &Relation, predicate: &Predicate) -> Binding {
    let schema = relation.schema();

    let mut values = Vec::new();
    let mut pairs = Vec::new();
    let mut first_column: HashMap<&str, usize> = HashMap::new();
    let mut columns = Vec::new();
    let mut variables = Vec::new();

    for (column, term) in predicate.terms.iter().enumerate() {
        if term_kind(term) == TermKind::Constant {
            values.push((column, term.clone()));
            continue;
        }

        match first_column.get(term.as_str()) {
            Some(&first) => pairs.push((first, column)),
            None if column < schema.len() => {
                first_column.insert(term.as_str(), column);
                columns.push(schema[column].clone());
                variables.push(term.clone());
            }
            None => {}
        }
    }

    let selected = relation.select_columns(&pairs).select_values(&values);
    let matches = selected.len();

    let relation = selected
        .project(&Tuple::new(columns))
        .rename_schema(&Tuple::new(variables));

    Binding { relation, matches }
}
