#![forbid(unsafe_code)]

//! Sort descriptors and in-memory row values.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::schema::{Schema, SchemaDetector};

/// Sort direction for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One `(column, direction)` entry of a sort descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortColumn {
    pub id: String,
    pub direction: SortDirection,
}

impl SortColumn {
    #[must_use]
    pub fn new(id: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            id: id.into(),
            direction,
        }
    }
}

/// Ordered list of sort columns; earlier columns take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SortDescriptor {
    pub columns: Vec<SortColumn>,
}

impl SortDescriptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column to the descriptor.
    #[must_use]
    pub fn then_by(mut self, id: impl Into<String>, direction: SortDirection) -> Self {
        self.columns.push(SortColumn::new(id, direction));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Compare two rows column by column, stopping at the first difference.
    #[must_use]
    pub fn compare_rows(
        &self,
        a: &HashMap<String, String>,
        b: &HashMap<String, String>,
        schema: &Schema,
        detectors: &[SchemaDetector],
    ) -> Ordering {
        self.columns.iter().fold(Ordering::Equal, |acc, column| {
            acc.then_with(|| {
                schema.comparator_for(&column.id, detectors).compare(
                    a.get(&column.id).map(String::as_str),
                    b.get(&column.id).map(String::as_str),
                    column.direction,
                )
            })
        })
    }
}

/// Snapshot of row values held in memory for sorting, keyed by logical row.
///
/// The generation counter bumps on every write so derived maps can tell
/// when they are stale without comparing contents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryValues {
    rows: BTreeMap<usize, HashMap<String, String>>,
    generation: u64,
}

impl InMemoryValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one cell value.
    pub fn set(&mut self, row_index: usize, column_id: impl Into<String>, value: impl Into<String>) {
        self.rows
            .entry(row_index)
            .or_default()
            .insert(column_id.into(), value.into());
        self.generation += 1;
    }

    /// Replace a whole row.
    pub fn set_row(&mut self, row_index: usize, values: HashMap<String, String>) {
        self.rows.insert(row_index, values);
        self.generation += 1;
    }

    #[must_use]
    pub fn get(&self, row_index: usize, column_id: &str) -> Option<&str> {
        self.rows
            .get(&row_index)
            .and_then(|r| r.get(column_id))
            .map(String::as_str)
    }

    /// Rows in ascending logical order.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &HashMap<String, String>)> {
        self.rows.iter().map(|(i, r)| (*i, r))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{TYPE_NUMERIC, default_detectors};

    #[test]
    fn earlier_columns_take_precedence() {
        let mut values = InMemoryValues::new();
        values.set(0, "team", "b");
        values.set(0, "score", "1");
        values.set(1, "team", "a");
        values.set(1, "score", "9");
        let schema = Schema::new().with("score", TYPE_NUMERIC);
        let detectors = default_detectors();
        let rows: Vec<_> = values.rows().map(|(_, r)| r).collect();

        let by_team = SortDescriptor::new().then_by("team", SortDirection::Asc);
        assert_eq!(by_team.compare_rows(rows[0], rows[1], &schema, &detectors), Ordering::Greater);

        let by_score = SortDescriptor::new()
            .then_by("score", SortDirection::Desc)
            .then_by("team", SortDirection::Asc);
        assert_eq!(by_score.compare_rows(rows[0], rows[1], &schema, &detectors), Ordering::Greater);
    }

    #[test]
    fn ties_fall_through_to_next_column() {
        let mut values = InMemoryValues::new();
        values.set(0, "a", "x");
        values.set(0, "b", "2");
        values.set(1, "a", "x");
        values.set(1, "b", "1");
        let rows: Vec<_> = values.rows().map(|(_, r)| r).collect();
        let sort = SortDescriptor::new()
            .then_by("a", SortDirection::Asc)
            .then_by("b", SortDirection::Asc);
        let ord = sort.compare_rows(rows[0], rows[1], &Schema::new(), &default_detectors());
        assert_eq!(ord, Ordering::Greater);
    }

    #[test]
    fn generation_bumps_on_write() {
        let mut values = InMemoryValues::new();
        let g0 = values.generation();
        values.set(3, "c", "v");
        assert!(values.generation() > g0);
        assert_eq!(values.get(3, "c"), Some("v"));
        assert_eq!(values.get(3, "missing"), None);
    }
}
