#![forbid(unsafe_code)]

//! Row containers for mounted cells.
//!
//! The window mounts cells individually; the row manager groups them by
//! logical row so hosts can reach a whole row (for row-level styling or
//! imperative access) through a [`RowHandle`]. Handles hold the row key,
//! not the row itself, and are resolved against the manager on demand.

use std::collections::{BTreeMap, BTreeSet};

/// Key for a mounted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowHandle {
    row_index: usize,
}

impl RowHandle {
    /// Logical row index this handle refers to.
    #[must_use]
    pub const fn row_index(&self) -> usize {
        self.row_index
    }
}

/// A mounted row and the columns currently rendered in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedRow {
    pub row_index: usize,
    pub visible_row_index: usize,
    /// Top offset in the scroll content, header included.
    pub top: u32,
    pub height: u32,
    /// Odd visible position.
    pub striped: bool,
    columns: BTreeSet<usize>,
}

impl MountedRow {
    /// Flat column indices mounted in this row.
    pub fn columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns.iter().copied()
    }
}

/// Tracks mounted rows keyed by logical row index.
#[derive(Debug, Clone, Default)]
pub struct RowManager {
    rows: BTreeMap<usize, MountedRow>,
}

impl RowManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a cell into its row, creating the row if needed, and refresh
    /// the row's position.
    pub fn get_row(
        &mut self,
        row_index: usize,
        visible_row_index: usize,
        column_index: usize,
        top: u32,
        height: u32,
    ) -> RowHandle {
        let row = self.rows.entry(row_index).or_insert_with(|| MountedRow {
            row_index,
            visible_row_index,
            top,
            height,
            striped: false,
            columns: BTreeSet::new(),
        });
        row.visible_row_index = visible_row_index;
        row.top = top;
        row.height = height;
        row.striped = visible_row_index % 2 == 1;
        row.columns.insert(column_index);
        RowHandle { row_index }
    }

    /// Unmount a cell; the row goes away with its last cell.
    pub fn release_cell(&mut self, handle: RowHandle, column_index: usize) {
        if let Some(row) = self.rows.get_mut(&handle.row_index) {
            row.columns.remove(&column_index);
            if row.columns.is_empty() {
                self.rows.remove(&handle.row_index);
            }
        }
    }

    /// Current state of a handle's row, if still mounted.
    #[must_use]
    pub fn resolve(&self, handle: RowHandle) -> Option<&MountedRow> {
        self.rows.get(&handle.row_index)
    }

    /// Handle for a mounted logical row.
    #[must_use]
    pub fn handle_for(&self, row_index: usize) -> Option<RowHandle> {
        self.rows
            .contains_key(&row_index)
            .then_some(RowHandle { row_index })
    }

    /// Unmount every row outside `keep`'s logical indices.
    pub fn retain_rows(&mut self, keep: impl Fn(usize) -> bool) {
        self.rows.retain(|row, _| keep(*row));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
