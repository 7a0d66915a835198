#![forbid(unsafe_code)]

//! Row height configuration and measurement settlement.
//!
//! [`RowHeightRegistry`] is the only owner of measured row heights. Other
//! components ask it for heights and never write to it directly.
//!
//! Auto-height rows go through a two-phase settle:
//!
//! ```text
//! Unmeasured ──(first measurement)──▶ Settled(px) ──(new value)──▶ Settled(px')
//! ```
//!
//! While unmeasured the registry answers with the caller's fallback height.
//! A settlement does not notify anyone immediately: it records the lowest
//! visible row that changed and raises a pending flag. The host drains that
//! with [`RowHeightRegistry::flush`] after the current pass, which fires the
//! re-render callback once no matter how many rows settled.

use std::collections::HashMap;
use std::fmt;

use vgrid_core::config::Density;

/// Height configuration for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowHeightOption {
    /// Content-driven height, optionally never below `min` pixels.
    Auto { min: Option<u32> },
    /// Enough height for `n` lines of text.
    LineCount(u32),
    /// Fixed pixel height.
    Pixels(u32),
}

impl RowHeightOption {
    /// Plain auto height with no minimum.
    pub const AUTO: Self = Self::Auto { min: None };
}

/// Global and per-row height options.
///
/// Per-row entries are keyed by logical row index; inserting twice for the
/// same row replaces the earlier option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowHeightsOptions {
    /// Applies to rows without their own entry.
    pub default_height: Option<RowHeightOption>,
    /// Per-row overrides.
    pub row_heights: HashMap<usize, RowHeightOption>,
}

impl RowHeightsOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_height(mut self, option: RowHeightOption) -> Self {
        self.default_height = Some(option);
        self
    }

    #[must_use]
    pub fn with_row_height(mut self, row_index: usize, option: RowHeightOption) -> Self {
        self.row_heights.insert(row_index, option);
        self
    }
}

/// Measurement state of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Unmeasured,
    Settled(u32),
}

type RerenderFn = Box<dyn FnMut()>;

/// Owner of row height options resolution and measured heights.
pub struct RowHeightRegistry {
    /// Measured content heights per logical row, per column.
    measured: HashMap<usize, HashMap<String, u32>>,
    /// Lowest visible row touched since the last flush.
    pending_reset: Option<usize>,
    rerender: Option<RerenderFn>,
    cell_padding: u32,
    line_height: u32,
}

impl fmt::Debug for RowHeightRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowHeightRegistry")
            .field("measured_rows", &self.measured.len())
            .field("pending_reset", &self.pending_reset)
            .field("has_rerender", &self.rerender.is_some())
            .field("cell_padding", &self.cell_padding)
            .field("line_height", &self.line_height)
            .finish()
    }
}

impl Default for RowHeightRegistry {
    fn default() -> Self {
        Self::new(Density::Normal, Density::Normal.line_height())
    }
}

impl RowHeightRegistry {
    /// Create a registry for the given density and text line height.
    #[must_use]
    pub fn new(density: Density, line_height: u32) -> Self {
        Self {
            measured: HashMap::new(),
            pending_reset: None,
            rerender: None,
            cell_padding: density.cell_padding(),
            line_height,
        }
    }

    /// Update padding and line height after a density change.
    ///
    /// Measurements include padding, so they are discarded.
    pub fn set_density(&mut self, density: Density, line_height: u32) {
        self.cell_padding = density.cell_padding();
        self.line_height = line_height;
        self.measured.clear();
    }

    /// Register the callback fired by [`flush`](Self::flush).
    pub fn set_rerender_callback(&mut self, f: impl FnMut() + 'static) {
        self.rerender = Some(Box::new(f));
    }

    /// Effective option for a row: its own entry, else the global default.
    #[must_use]
    pub fn get_row_height_option(
        &self,
        row_index: usize,
        options: Option<&RowHeightsOptions>,
    ) -> Option<RowHeightOption> {
        let options = options?;
        options
            .row_heights
            .get(&row_index)
            .copied()
            .or(options.default_height)
    }

    /// Whether the row has its own entry.
    #[must_use]
    pub fn is_row_height_override(
        &self,
        row_index: usize,
        options: Option<&RowHeightsOptions>,
    ) -> bool {
        options.is_some_and(|o| o.row_heights.contains_key(&row_index))
    }

    /// Whether the row's effective option is auto.
    #[must_use]
    pub fn is_auto_height(&self, row_index: usize, options: Option<&RowHeightsOptions>) -> bool {
        matches!(
            self.get_row_height_option(row_index, options),
            Some(RowHeightOption::Auto { .. })
        )
    }

    /// Pixel height for an option.
    ///
    /// `default_height` is the fallback. Heights inherited from the global
    /// default (`is_override == false`) never go below it; a row's own entry
    /// is honoured exactly. Auto rows use their settled height, or the
    /// fallback while unmeasured. The result is never zero.
    #[must_use]
    pub fn get_calculated_height(
        &self,
        option: RowHeightOption,
        default_height: u32,
        row_index: Option<usize>,
        is_override: bool,
    ) -> u32 {
        let fallback = default_height.max(1);
        let height = match option {
            RowHeightOption::Pixels(px) => px,
            RowHeightOption::LineCount(lines) => self.calculate_height_for_line_count(lines),
            RowHeightOption::Auto { min } => {
                let measured = match row_index.map(|row| self.settlement(row)) {
                    Some(Settlement::Settled(px)) => px,
                    _ => fallback,
                };
                measured.max(min.unwrap_or(0))
            }
        };
        if height == 0 {
            return fallback;
        }
        if is_override { height } else { height.max(fallback) }
    }

    /// Height of `lines` lines of text plus vertical padding.
    #[must_use]
    pub fn calculate_height_for_line_count(&self, lines: u32) -> u32 {
        lines
            .max(1)
            .saturating_mul(self.line_height)
            .saturating_add(self.cell_padding.saturating_mul(2))
    }

    /// Measurement state of a logical row.
    #[must_use]
    pub fn settlement(&self, row_index: usize) -> Settlement {
        self.measured
            .get(&row_index)
            .and_then(|cols| cols.values().copied().max())
            .map_or(Settlement::Unmeasured, Settlement::Settled)
    }

    /// Record a measured content height for one cell.
    ///
    /// The row settles to the tallest measured cell plus padding. Garbage
    /// measurements (NaN, infinite, not positive) are dropped. Returns
    /// `true` if the row's settled height changed, in which case a flush is
    /// pending.
    pub fn set_row_height(
        &mut self,
        row_index: usize,
        column_id: &str,
        content_height: f64,
        visible_row_index: usize,
    ) -> bool {
        if !content_height.is_finite() || content_height <= 0.0 {
            vgrid_core::warn!(
                row_index,
                column_id,
                content_height,
                "ignoring invalid row measurement"
            );
            return false;
        }
        let padded = (content_height.ceil() as u64)
            .saturating_add(u64::from(self.cell_padding) * 2)
            .min(u64::from(u32::MAX)) as u32;

        let before = self.settlement(row_index);
        let cols = self.measured.entry(row_index).or_default();
        if cols.get(column_id) == Some(&padded) {
            return false;
        }
        cols.insert(column_id.to_string(), padded);
        let after = self.settlement(row_index);
        if before == after {
            return false;
        }

        vgrid_core::debug!(row_index, ?before, ?after, "row height settled");
        self.pending_reset = Some(
            self.pending_reset
                .map_or(visible_row_index, |r| r.min(visible_row_index)),
        );
        true
    }

    /// Forget measurements for columns that are no longer shown.
    ///
    /// Measurements are keyed by logical row, not window position, so any
    /// re-settled row schedules a reset from the first visible row.
    /// Returns `true` if a row's settled height changed.
    pub fn prune_hidden_columns(&mut self, visible_column_ids: &[&str]) -> bool {
        let mut changed = false;
        for cols in self.measured.values_mut() {
            let before = cols.values().copied().max();
            cols.retain(|id, _| visible_column_ids.contains(&id.as_str()));
            changed |= cols.values().copied().max() != before;
        }
        self.measured.retain(|_, cols| !cols.is_empty());
        if changed {
            vgrid_core::debug!(
                columns = visible_column_ids.len(),
                "row heights re-settled after column prune"
            );
            self.pending_reset = Some(0);
        }
        changed
    }

    /// Whether settlements are waiting for a flush.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending_reset.is_some()
    }

    /// Drain pending settlements.
    ///
    /// Returns the lowest visible row whose height changed so the caller can
    /// invalidate the window from there, and fires the re-render callback
    /// once. Does nothing if no settlement is pending.
    pub fn flush(&mut self) -> Option<usize> {
        let row = self.pending_reset.take()?;
        if let Some(rerender) = self.rerender.as_mut() {
            rerender();
        }
        Some(row)
    }

}
