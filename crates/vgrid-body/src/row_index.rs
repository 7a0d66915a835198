#![forbid(unsafe_code)]

//! Visible position → logical row index translation.
//!
//! When in-memory sorting is active the mapper holds a [`RowIndexMap`] built
//! from a snapshot of the row values. The map is derived state: it is
//! rebuilt and swapped out whole whenever the sort descriptor, the value
//! snapshot, or the schema changes, and never patched in place.

use std::collections::HashMap;

use crate::pagination::Pagination;
use crate::schema::{Schema, SchemaDetector};
use crate::sorting::{InMemoryValues, SortDescriptor};

/// Sorted position → logical row index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowIndexMap {
    sorted: Vec<usize>,
}

impl RowIndexMap {
    /// Sort a snapshot of `values` and record where each row landed.
    ///
    /// The sort is stable: rows equal under every sort column keep their
    /// original relative order.
    #[must_use]
    pub fn build(
        sort: &SortDescriptor,
        values: &InMemoryValues,
        schema: &Schema,
        detectors: &[SchemaDetector],
    ) -> Self {
        let mut snapshot: Vec<(usize, &HashMap<String, String>)> = values.rows().collect();
        snapshot.sort_by(|(_, a), (_, b)| sort.compare_rows(a, b, schema, detectors));
        Self {
            sorted: snapshot.into_iter().map(|(row, _)| row).collect(),
        }
    }

    /// Logical row shown at sorted `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<usize> {
        self.sorted.get(position).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Logical row → sorted position.
    #[must_use]
    pub fn inverse(&self) -> HashMap<usize, usize> {
        self.sorted
            .iter()
            .enumerate()
            .map(|(position, row)| (*row, position))
            .collect()
    }
}

/// Inputs a [`RowIndexMap`] was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MapInputs {
    sort: SortDescriptor,
    generation: u64,
    schema: Schema,
}

/// Translates visible row positions into logical row indices.
#[derive(Debug, Clone, Default)]
pub struct RowIndexMapper {
    map: Option<RowIndexMap>,
    inputs: Option<MapInputs>,
    pagination: Option<Pagination>,
}

impl RowIndexMapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the sorted map in line with the current sort inputs.
    ///
    /// Sorting is active only with a non-empty descriptor and an in-memory
    /// snapshot. Returns `true` if the map was rebuilt or dropped.
    pub fn sync(
        &mut self,
        sort: Option<&SortDescriptor>,
        values: Option<&InMemoryValues>,
        schema: &Schema,
        detectors: &[SchemaDetector],
    ) -> bool {
        let (Some(sort), Some(values)) = (sort.filter(|s| !s.is_empty()), values) else {
            let changed = self.map.is_some();
            self.map = None;
            self.inputs = None;
            return changed;
        };

        let stale = self.inputs.as_ref().is_none_or(|inputs| {
            inputs.generation != values.generation()
                || inputs.sort != *sort
                || inputs.schema != *schema
        });
        if !stale {
            return false;
        }

        let map = RowIndexMap::build(sort, values, schema, detectors);
        vgrid_core::debug!(
            rows = map.len(),
            sort_columns = sort.columns.len(),
            "rebuilt row index map"
        );
        self.map = Some(map);
        self.inputs = Some(MapInputs {
            sort: sort.clone(),
            generation: values.generation(),
            schema: schema.clone(),
        });
        true
    }

    /// Set or clear pagination.
    pub fn set_pagination(&mut self, pagination: Option<Pagination>) {
        self.pagination = pagination;
    }

    #[must_use]
    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    /// Whether a sorted map is in effect.
    #[must_use]
    pub fn is_sorting(&self) -> bool {
        self.map.is_some()
    }

    #[must_use]
    pub fn map(&self) -> Option<&RowIndexMap> {
        self.map.as_ref()
    }

    /// Logical row index for a visible position.
    ///
    /// A position before the current page's first row is taken to be
    /// page-relative and gets the page offset added back. Positions without
    /// a sorted entry map to themselves.
    #[must_use]
    pub fn corrected_index(&self, visible_position: usize) -> usize {
        let mut position = visible_position;
        if let Some(pagination) = &self.pagination {
            let start_row = pagination.start_row();
            if position < start_row {
                position = position.saturating_add(start_row);
            }
        }
        self.map
            .as_ref()
            .and_then(|map| map.get(position))
            .unwrap_or(position)
    }
}
