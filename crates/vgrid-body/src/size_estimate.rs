#![forbid(unsafe_code)]

//! Best-guess content size before every row has been measured.

use std::ops::Range;

use crate::columns::ColumnLayout;
use crate::row_height::{RowHeightRegistry, RowHeightsOptions};
use crate::row_index::RowIndexMapper;

/// Scroll box metrics of the outer grid container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    pub scroll_width: u32,
    pub client_width: u32,
    pub offset_height: u32,
    pub client_height: u32,
}

impl ScrollMetrics {
    /// Height taken by a horizontal scrollbar, 0 without horizontal overflow.
    #[must_use]
    pub fn horizontal_scrollbar_height(&self) -> u32 {
        if self.scroll_width > self.client_width {
            self.offset_height.saturating_sub(self.client_height)
        } else {
            0
        }
    }
}

/// Inputs for one height estimate.
#[derive(Debug, Clone, Copy)]
pub struct EstimateInputs<'a> {
    pub registry: &'a RowHeightRegistry,
    pub mapper: &'a RowIndexMapper,
    pub options: Option<&'a RowHeightsOptions>,
    /// Height assumed for rows with no option.
    pub default_height: u32,
    pub header_height: u32,
    pub footer_height: u32,
    pub scroll_metrics: Option<ScrollMetrics>,
}

/// Breakdown of an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeightEstimate {
    pub known_height: u64,
    pub known_rows: usize,
    pub unknown_rows: usize,
    /// Header + footer + scrollbar.
    pub chrome: u64,
}

impl HeightEstimate {
    /// Total estimated height, saturated to `u32`.
    #[must_use]
    pub fn total(&self, default_height: u32) -> u32 {
        let unknown = u64::from(default_height) * self.unknown_rows as u64;
        (self.known_height + unknown + self.chrome).min(u64::from(u32::MAX)) as u32
    }
}

/// Computes unconstrained content sizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeEstimator;

impl SizeEstimator {
    /// Estimate the content height for visible positions in `rows`.
    ///
    /// Rows whose logical index has a height option contribute their
    /// calculated height; the rest are assumed to be `default_height`.
    /// Every term is non-negative, so growing `rows` never shrinks the
    /// estimate.
    #[must_use]
    pub fn estimate_height(&self, rows: Range<usize>, inputs: &EstimateInputs<'_>) -> u32 {
        self.breakdown(rows, inputs).total(inputs.default_height)
    }

    /// Same as [`estimate_height`](Self::estimate_height) with the parts.
    #[must_use]
    pub fn breakdown(&self, rows: Range<usize>, inputs: &EstimateInputs<'_>) -> HeightEstimate {
        let mut estimate = HeightEstimate::default();
        for visible in rows {
            let row = inputs.mapper.corrected_index(visible);
            match inputs.registry.get_row_height_option(row, inputs.options) {
                Some(option) => {
                    let is_override = inputs.registry.is_row_height_override(row, inputs.options);
                    estimate.known_rows += 1;
                    estimate.known_height += u64::from(inputs.registry.get_calculated_height(
                        option,
                        inputs.default_height,
                        Some(row),
                        is_override,
                    ));
                }
                None => estimate.unknown_rows += 1,
            }
        }
        let scrollbar = inputs
            .scroll_metrics
            .map_or(0, |m| m.horizontal_scrollbar_height());
        estimate.chrome = u64::from(inputs.header_height)
            + u64::from(inputs.footer_height)
            + u64::from(scrollbar);
        estimate
    }

    /// Sum of every column's width.
    #[must_use]
    pub fn estimate_width(&self, layout: &ColumnLayout) -> u32 {
        let total: u64 = (0..layout.column_count())
            .map(|i| u64::from(layout.column_width(i)))
            .sum();
        total.min(u64::from(u32::MAX)) as u32
    }
}
