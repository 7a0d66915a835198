#![forbid(unsafe_code)]

//! Windowing primitive: render only the cells intersecting the viewport.
//!
//! The body talks to the primitive through [`WindowingPrimitive`]. The
//! primitive asks for row heights and column widths through callbacks,
//! caches them, and only re-asks from the first index the body invalidated.
//!
//! [`VariableSizeGrid`] is the stock implementation. It keeps row heights
//! and column widths in two [`FenwickTree`]s so offsets and viewport
//! lookups are O(log n) regardless of how many rows have custom heights.

use std::ops::Range;

use vgrid_core::geometry::{Rect, Size};

use crate::fenwick::FenwickTree;

/// Scroll request for [`WindowingPrimitive::scroll_to_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollTarget {
    pub row_index: Option<usize>,
    pub column_index: Option<usize>,
}

impl ScrollTarget {
    #[must_use]
    pub const fn row(row_index: usize) -> Self {
        Self {
            row_index: Some(row_index),
            column_index: None,
        }
    }
}

/// Rows and columns intersecting a viewport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellRange {
    pub rows: Range<usize>,
    pub columns: Range<usize>,
}

impl CellRange {
    /// Iterate `(row, column)` pairs row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows
            .clone()
            .flat_map(move |r| self.columns.clone().map(move |c| (r, c)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }
}

/// The capability the grid body needs from a windowing implementation.
pub trait WindowingPrimitive {
    /// Refresh cached sizes for everything at or after the first invalid
    /// index, growing or shrinking to the given counts.
    fn sync_sizes(
        &mut self,
        row_count: usize,
        column_count: usize,
        row_height: &dyn Fn(usize) -> u32,
        column_width: &dyn Fn(usize) -> u32,
    );

    /// Cells intersecting the viewport at the current scroll position,
    /// including overscan.
    fn visible_cells(&self, viewport: Size) -> CellRange;

    /// Position of a cell relative to the scroll content origin.
    fn cell_area(&self, row: usize, column: usize) -> Rect;

    /// Forget cached row heights from `index` onward.
    fn reset_after_row_index(&mut self, index: usize);

    /// Forget cached column widths from `index` onward.
    fn reset_after_column_index(&mut self, index: usize);

    /// Scroll so the target row and/or column starts the viewport.
    fn scroll_to_item(&mut self, target: ScrollTarget);
}

/// Fenwick-backed variable-size grid.
#[derive(Debug, Clone, Default)]
pub struct VariableSizeGrid {
    rows: FenwickTree,
    columns: FenwickTree,
    /// Rows `[0, rows_valid)` hold sizes still trusted.
    rows_valid: usize,
    columns_valid: usize,
    scroll_top: u64,
    scroll_left: u64,
    overscan_rows: usize,
    overscan_columns: usize,
}

impl VariableSizeGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_overscan(mut self, rows: usize, columns: usize) -> Self {
        self.overscan_rows = rows;
        self.overscan_columns = columns;
        self
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Total content height of all rows.
    #[must_use]
    pub fn total_height(&self) -> u64 {
        self.rows.total()
    }

    /// Total content width of all columns.
    #[must_use]
    pub fn total_width(&self) -> u64 {
        self.columns.total()
    }

    #[must_use]
    pub fn scroll_top(&self) -> u64 {
        self.scroll_top
    }

    #[must_use]
    pub fn scroll_left(&self) -> u64 {
        self.scroll_left
    }

    /// Scroll to a pixel position, clamped to the content.
    pub fn set_scroll(&mut self, top: u64, left: u64) {
        self.scroll_top = top.min(self.total_height());
        self.scroll_left = left.min(self.total_width());
    }

    /// Cached height of a row (0 past the end).
    #[must_use]
    pub fn row_height(&self, row: usize) -> u32 {
        if row < self.rows.len() { self.rows.get(row) } else { 0 }
    }

    fn span(tree: &FenwickTree, start: u64, extent: u32, overscan: usize) -> Range<usize> {
        let n = tree.len();
        if n == 0 || extent == 0 {
            return 0..0;
        }
        let Some(first) = tree.index_at(start) else {
            return n..n;
        };
        let end_px = start.saturating_add(u64::from(extent) - 1);
        let last = tree.index_at(end_px).unwrap_or(n - 1);
        first.saturating_sub(overscan)..(last + 1 + overscan).min(n)
    }
}

impl WindowingPrimitive for VariableSizeGrid {
    fn sync_sizes(
        &mut self,
        row_count: usize,
        column_count: usize,
        row_height: &dyn Fn(usize) -> u32,
        column_width: &dyn Fn(usize) -> u32,
    ) {
        if self.rows.len() != row_count {
            self.rows_valid = self.rows_valid.min(self.rows.len()).min(row_count);
            self.rows.resize(row_count);
        }
        if self.columns.len() != column_count {
            self.columns_valid = self.columns_valid.min(self.columns.len()).min(column_count);
            self.columns.resize(column_count);
        }
        for row in self.rows_valid..row_count {
            self.rows.set(row, row_height(row));
        }
        for column in self.columns_valid..column_count {
            self.columns.set(column, column_width(column));
        }
        if self.rows_valid < row_count || self.columns_valid < column_count {
            vgrid_core::trace!(
                rows_from = self.rows_valid,
                columns_from = self.columns_valid,
                "window sizes refreshed"
            );
        }
        self.rows_valid = row_count;
        self.columns_valid = column_count;
        self.scroll_top = self.scroll_top.min(self.rows.total());
        self.scroll_left = self.scroll_left.min(self.columns.total());
    }

    fn visible_cells(&self, viewport: Size) -> CellRange {
        CellRange {
            rows: Self::span(&self.rows, self.scroll_top, viewport.height, self.overscan_rows),
            columns: Self::span(
                &self.columns,
                self.scroll_left,
                viewport.width,
                self.overscan_columns,
            ),
        }
    }

    fn cell_area(&self, row: usize, column: usize) -> Rect {
        let clamp = |v: u64| v.min(u64::from(u32::MAX)) as u32;
        let width = if column < self.columns.len() {
            self.columns.get(column)
        } else {
            0
        };
        Rect::new(
            clamp(self.columns.offset(column)),
            clamp(self.rows.offset(row)),
            width,
            self.row_height(row),
        )
    }

    fn reset_after_row_index(&mut self, index: usize) {
        self.rows_valid = self.rows_valid.min(index);
    }

    fn reset_after_column_index(&mut self, index: usize) {
        self.columns_valid = self.columns_valid.min(index);
    }

    fn scroll_to_item(&mut self, target: ScrollTarget) {
        if let Some(row) = target.row_index {
            self.scroll_top = self.rows.offset(row);
        }
        if let Some(column) = target.column_index {
            self.scroll_left = self.columns.offset(column);
        }
    }
}
