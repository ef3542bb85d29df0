use std::fmt;
use std::ops::Deref;

use itertools::Itertools;

/// An ordered sequence of string atoms. Serves both as a data row and as a
/// relation schema (the column names).
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tuple(Vec<String>);

impl Tuple {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    /// Index of the first occurrence of `value`.
    pub fn position(&self, value: &str) -> Option<usize> {
        self.0.iter().position(|v| v == value)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.position(value).is_some()
    }

    pub fn has_duplicates(&self) -> bool {
        !self.0.iter().all_unique()
    }

    /// Builds a new tuple from the values at `indices`, in that order.
    pub fn gather(&self, indices: &[usize]) -> Tuple {
        Tuple(indices.iter().map(|&i| self.0[i].clone()).collect())
    }

    /// Renders a row against `schema` as `col=val, col=val`.
    pub fn render_with(&self, schema: &Tuple) -> String {
        schema
            .iter()
            .zip(self.iter())
            .map(|(column, value)| format!("{}={}", column, value))
            .join(", ")
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for Tuple {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for Tuple {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<String>> for Tuple {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.iter().join(","))
    }
}
