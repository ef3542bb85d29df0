//! Set-semantics relations and the relational algebra over them.
//!
//! Every operator returns a new [`Relation`] and leaves the receiver
//! untouched. Operators are total: out-of-range filters, incompatible unions
//! and colliding renames degrade to a well-defined result instead of failing.

use std::collections::BTreeSet;

use itertools::Itertools;

use crate::tuple::Tuple;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relation {
    name: String,
    schema: Tuple,
    rows: BTreeSet<Tuple>,
}

impl Relation {
    pub fn new(name: impl Into<String>, schema: Tuple) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: BTreeSet::new(),
        }
    }

    fn with_rows(name: &str, schema: Tuple, rows: BTreeSet<Tuple>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == schema.len()));
        Self {
            name: name.to_owned(),
            schema,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn schema(&self) -> &Tuple {
        &self.schema
    }

    pub fn rows(&self) -> &BTreeSet<Tuple> {
        &self.rows
    }

    pub fn arity(&self) -> usize {
        self.schema.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Adds a row. Returns `false` if the row was already present or its
    /// length does not match the schema, in which case nothing changes.
    pub fn insert(&mut self, row: Tuple) -> bool {
        if row.len() != self.arity() {
            return false;
        }
        self.rows.insert(row)
    }

    pub fn contains(&self, row: &Tuple) -> bool {
        self.rows.contains(row)
    }

    /// Rows rendered as `col=val, col=val`, in row order.
    pub fn rendered_rows(&self) -> impl Iterator<Item = String> + '_ {
        self.rows.iter().map(move |row| row.render_with(&self.schema))
    }

    /// Keeps the rows whose value at each filtered column equals the given
    /// constant. Filters on columns outside the schema hold vacuously.
    pub fn select_values(&self, filters: &[(usize, String)]) -> Relation {
        let arity = self.arity();
        let rows = self
            .rows
            .iter()
            .filter(|row| {
                filters
                    .iter()
                    .filter(|(column, _)| *column < arity)
                    .all(|(column, value)| row[*column] == *value)
            })
            .cloned()
            .collect();
        Self::with_rows(&self.name, self.schema.clone(), rows)
    }

    /// Keeps the rows whose values agree on every pair of columns. Pairs
    /// touching a column outside the schema hold vacuously.
    pub fn select_columns(&self, pairs: &[(usize, usize)]) -> Relation {
        let arity = self.arity();
        let rows = self
            .rows
            .iter()
            .filter(|row| {
                pairs
                    .iter()
                    .filter(|(a, b)| *a < arity && *b < arity)
                    .all(|(a, b)| row[*a] == row[*b])
            })
            .cloned()
            .collect();
        Self::with_rows(&self.name, self.schema.clone(), rows)
    }

    /// Reorders and truncates the columns to match `target`.
    ///
    /// Duplicate names in `target` keep their first occurrence and names the
    /// schema lacks are dropped. Projecting onto zero columns yields zero
    /// rows rather than a single empty row.
    pub fn project(&self, target: &Tuple) -> Relation {
        let columns: Vec<&String> = target
            .iter()
            .unique()
            .filter(|column| self.schema.contains(column))
            .collect();
        let indices: Vec<usize> = columns
            .iter()
            .filter_map(|column| self.schema.position(column))
            .collect();
        let schema: Tuple = columns.into_iter().cloned().collect();

        let rows = if schema.is_empty() {
            BTreeSet::new()
        } else {
            self.rows.iter().map(|row| row.gather(&indices)).collect()
        };
        Self::with_rows(&self.name, schema, rows)
    }

    /// Renames the first column called `old` to `new`, unless `new` is
    /// already a column name.
    pub fn rename(&self, old: &str, new: &str) -> Relation {
        let mut renamed = self.clone();
        if self.schema.contains(new) {
            return renamed;
        }
        if let Some(index) = self.schema.position(old) {
            let mut columns = self.schema.to_vec();
            columns[index] = new.to_owned();
            renamed.schema = Tuple::new(columns);
        }
        renamed
    }

    /// Replaces the whole schema at once. An empty entry keeps the current
    /// name at that position; entries past the current arity are ignored.
    /// Leaves the schema unchanged if the result would repeat a name.
    pub fn rename_schema(&self, names: &Tuple) -> Relation {
        let schema: Tuple = self
            .schema
            .iter()
            .enumerate()
            .map(|(i, current)| match names.get(i) {
                Some(name) if !name.is_empty() => name.clone(),
                _ => current.clone(),
            })
            .collect();

        let mut renamed = self.clone();
        if !schema.has_duplicates() {
            renamed.schema = schema;
        }
        renamed
    }

    /// Natural join on shared column names. The result keeps the receiver's
    /// columns in order, followed by the other side's remaining columns.
    pub fn join(&self, other: &Relation) -> Relation {
        let shared: Vec<(usize, usize)> = self
            .schema
            .iter()
            .enumerate()
            .filter_map(|(i, column)| other.schema.position(column).map(|j| (i, j)))
            .collect();
        let appended: Vec<usize> = other
            .schema
            .iter()
            .enumerate()
            .filter(|(_, column)| !self.schema.contains(column))
            .map(|(j, _)| j)
            .collect();

        let schema: Tuple = self
            .schema
            .iter()
            .chain(appended.iter().map(|&j| &other.schema[j]))
            .cloned()
            .collect();

        let by_key = other
            .rows
            .iter()
            .map(|row| {
                let key: Vec<&String> = shared.iter().map(|&(_, j)| &row[j]).collect();
                (key, row)
            })
            .into_group_map();

        let mut rows = BTreeSet::new();
        for left in &self.rows {
            let key: Vec<&String> = shared.iter().map(|&(i, _)| &left[i]).collect();
            let matches = match by_key.get(&key) {
                Some(matches) => matches,
                None => continue,
            };
            for right in matches {
                let combined: Tuple = left
                    .iter()
                    .chain(appended.iter().map(|&j| &right[j]))
                    .cloned()
                    .collect();
                rows.insert(combined);
            }
        }

        Self::with_rows(&self.name, schema, rows)
    }

    /// Set union. Relations with different schemas are not union-compatible
    /// and produce an empty relation under the receiver's name.
    pub fn union(&self, other: &Relation) -> Relation {
        if self.schema != other.schema {
            return Relation::new(self.name.clone(), self.schema.clone());
        }
        let rows = self.rows.union(&other.rows).cloned().collect();
        Self::with_rows(&self.name, self.schema.clone(), rows)
    }
}
