#![forbid(unsafe_code)]

//! Pagination state and visible row boundaries.

use std::ops::Range;

/// Current page of a paginated grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pagination {
    /// Zero-based page index.
    pub page_index: usize,
    /// Rows per page. Zero disables pagination.
    pub page_size: usize,
}

impl Pagination {
    /// Create pagination state.
    #[must_use]
    pub const fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    /// Logical index of the first row on the current page.
    #[must_use]
    pub const fn start_row(&self) -> usize {
        self.page_index.saturating_mul(self.page_size)
    }

    /// Half-open logical row range shown on the current page.
    ///
    /// A page index past the end yields an empty range at `row_count`.
    #[must_use]
    pub fn visible_range(&self, row_count: usize) -> Range<usize> {
        if self.page_size == 0 {
            return 0..row_count;
        }
        let start = self.start_row().min(row_count);
        let end = self
            .page_index
            .saturating_add(1)
            .saturating_mul(self.page_size)
            .min(row_count);
        start..end
    }

    /// Number of pages needed for `row_count` rows.
    #[must_use]
    pub fn page_count(&self, row_count: usize) -> usize {
        if self.page_size == 0 {
            return usize::from(row_count > 0);
        }
        row_count.div_ceil(self.page_size)
    }
}

/// Visible logical rows for optional pagination.
#[must_use]
pub fn visible_rows(pagination: Option<&Pagination>, row_count: usize) -> Range<usize> {
    match pagination {
        Some(p) => p.visible_range(row_count),
        None => 0..row_count,
    }
}
