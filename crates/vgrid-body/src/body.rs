#![forbid(unsafe_code)]

//! Grid body orchestration.
//!
//! [`GridBody`] owns the body's derived state and wires it to a
//! [`WindowingPrimitive`]:
//!
//! - row heights and column widths are answered from the
//!   [`RowHeightRegistry`] and [`ColumnLayout`] through the window's size
//!   callbacks;
//! - visible rows are translated to logical rows by the [`RowIndexMapper`];
//! - each visible cell is dispatched to a [`CellWindowRenderer`];
//! - configuration changes invalidate the window's cached sizes.
//!
//! # Sizing
//!
//! ```text
//! Unmeasured ──render──▶ Estimated ──resize──▶ Measured
//!                            ▲                    │
//!                            └── rows / page / fullscreen change
//! ```
//!
//! In fullscreen the viewport size is used directly and the state machine
//! is bypassed.
//!
//! # Deferred work
//!
//! Height settlements never re-render synchronously. The host calls
//! [`GridBody::flush`] once the current pass has finished; that invalidates
//! the window from the lowest changed row and fires the re-render callback
//! once.

use std::collections::HashSet;
use std::ops::Range;

use vgrid_core::config::{BodyConfig, Density};
use vgrid_core::geometry::Size;

use crate::cell::{CellRenderPlan, CellValueSource, CellWindowRenderer, PopoverContents};
use crate::columns::{ColumnDefinition, ColumnLayout, ControlColumn};
use crate::pagination::{Pagination, visible_rows};
use crate::row_height::{RowHeightRegistry, RowHeightsOptions};
use crate::row_index::RowIndexMapper;
use crate::row_manager::{RowHandle, RowManager};
use crate::schema::{Schema, SchemaDetector, default_detectors};
use crate::size_estimate::{EstimateInputs, ScrollMetrics, SizeEstimator};
use crate::sorting::{InMemoryValues, SortDescriptor};
use crate::tab_guard::{FocusTree, GuardReport, MutationRecord, TabGuard};
use crate::window::{ScrollTarget, VariableSizeGrid, WindowingPrimitive};

/// Rows and cell values the body renders.
pub trait GridDataSource: CellValueSource {
    /// Total logical rows, before pagination.
    fn row_count(&self) -> usize;

    /// Row values available for in-memory sorting and schema detection.
    fn in_memory_values(&self) -> Option<&InMemoryValues> {
        None
    }
}

impl CellValueSource for InMemoryValues {
    fn render_cell_value(&self, row_index: usize, column_id: &str) -> String {
        self.get(row_index, column_id).unwrap_or_default().to_string()
    }
}

/// A dense in-memory snapshot is its own data source.
impl GridDataSource for InMemoryValues {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn in_memory_values(&self) -> Option<&InMemoryValues> {
        Some(self)
    }
}

/// Container sizing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizingState {
    /// Nothing computed yet.
    #[default]
    Unmeasured,
    /// Analytic estimate of the unconstrained content box.
    Estimated(Size),
    /// Last client box reported by the resize observer.
    Measured(Size),
}

/// Height lookups that only borrow what they need, so they can be handed
/// to the window while it is borrowed mutably.
#[derive(Clone, Copy)]
struct Heights<'a> {
    registry: &'a RowHeightRegistry,
    mapper: &'a RowIndexMapper,
    options: Option<&'a RowHeightsOptions>,
    fallback: u32,
}

impl Heights<'_> {
    fn default_height(&self) -> u32 {
        self.options
            .and_then(|o| o.default_height)
            .map_or(self.fallback.max(1), |option| {
                self.registry
                    .get_calculated_height(option, self.fallback, None, false)
            })
    }

    fn row_height(&self, visible_row_index: usize) -> u32 {
        let row = self.mapper.corrected_index(visible_row_index);
        match self.registry.get_row_height_option(row, self.options) {
            Some(option) => self.registry.get_calculated_height(
                option,
                self.fallback,
                Some(row),
                self.registry.is_row_height_override(row, self.options),
            ),
            None => self.default_height(),
        }
    }
}

/// The virtualized grid body.
pub struct GridBody<D, W = VariableSizeGrid> {
    config: BodyConfig,
    data: D,
    window: W,
    layout: ColumnLayout,
    schema: Schema,
    detectors: Vec<SchemaDetector>,
    popovers: PopoverContents,
    registry: RowHeightRegistry,
    mapper: RowIndexMapper,
    sort: Option<SortDescriptor>,
    row_heights: Option<RowHeightsOptions>,
    row_manager: RowManager,
    mounted: HashSet<(RowHandle, usize)>,
    tab_guard: TabGuard,
    header_height: u32,
    footer_height: u32,
    scroll_metrics: Option<ScrollMetrics>,
    sizing: SizingState,
    fullscreen: Option<Size>,
}

impl<D: GridDataSource> GridBody<D, VariableSizeGrid> {
    /// Body over the stock [`VariableSizeGrid`], overscan taken from `config`.
    #[must_use]
    pub fn with_default_window(config: BodyConfig, data: D, columns: Vec<ColumnDefinition>) -> Self {
        let window = VariableSizeGrid::new().with_overscan(config.overscan_rows, config.overscan_columns);
        Self::new(config, data, window, columns)
    }
}

impl<D: GridDataSource, W: WindowingPrimitive> GridBody<D, W> {
    #[must_use]
    pub fn new(config: BodyConfig, data: D, window: W, columns: Vec<ColumnDefinition>) -> Self {
        let layout = ColumnLayout::new(columns, config.default_column_width);
        let registry = RowHeightRegistry::new(config.density, config.effective_line_height());
        Self {
            config,
            data,
            window,
            layout,
            schema: Schema::new(),
            detectors: default_detectors(),
            popovers: PopoverContents::default(),
            registry,
            mapper: RowIndexMapper::new(),
            sort: None,
            row_heights: None,
            row_manager: RowManager::new(),
            mounted: HashSet::new(),
            tab_guard: TabGuard::new(),
            header_height: 0,
            footer_height: 0,
            scroll_metrics: None,
            sizing: SizingState::Unmeasured,
            fullscreen: None,
        }
    }

    #[must_use]
    pub fn with_leading_controls(mut self, controls: Vec<ControlColumn>) -> Self {
        self.layout = self.layout.with_leading(controls);
        self
    }

    #[must_use]
    pub fn with_trailing_controls(mut self, controls: Vec<ControlColumn>) -> Self {
        self.layout = self.layout.with_trailing(controls);
        self
    }

    #[must_use]
    pub fn with_detectors(mut self, detectors: Vec<SchemaDetector>) -> Self {
        self.detectors = detectors;
        self
    }

    #[must_use]
    pub fn with_popover_contents(mut self, popovers: PopoverContents) -> Self {
        self.popovers = popovers;
        self
    }

    // ─── Accessors ────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &BodyConfig {
        &self.config
    }

    #[must_use]
    pub fn data(&self) -> &D {
        &self.data
    }

    /// Mutable data access. Call [`on_row_count_changed`](Self::on_row_count_changed)
    /// if the row count changes.
    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    #[must_use]
    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }

    #[must_use]
    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn registry(&self) -> &RowHeightRegistry {
        &self.registry
    }

    #[must_use]
    pub fn mapper(&self) -> &RowIndexMapper {
        &self.mapper
    }

    /// Rows currently mounted by the window.
    #[must_use]
    pub fn row_manager(&self) -> &RowManager {
        &self.row_manager
    }

    #[must_use]
    pub fn tab_guard(&self) -> &TabGuard {
        &self.tab_guard
    }

    #[must_use]
    pub fn sizing(&self) -> SizingState {
        self.sizing
    }

    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_some()
    }

    #[must_use]
    pub fn header_height(&self) -> u32 {
        self.header_height
    }

    // ─── Size callbacks ───────────────────────────────────────────

    fn heights(&self) -> Heights<'_> {
        Heights {
            registry: &self.registry,
            mapper: &self.mapper,
            options: self.row_heights.as_ref(),
            fallback: self.config.default_row_height,
        }
    }

    /// Height used for rows without an option of their own.
    #[must_use]
    pub fn default_height(&self) -> u32 {
        self.heights().default_height()
    }

    /// Height of the row at a visible position.
    #[must_use]
    pub fn row_height(&self, visible_row_index: usize) -> u32 {
        self.heights().row_height(visible_row_index)
    }

    /// Width of a flat column index.
    #[must_use]
    pub fn column_width(&self, column_index: usize) -> u32 {
        self.layout.column_width(column_index)
    }

    /// Logical rows shown on the current page.
    #[must_use]
    pub fn visible_rows(&self) -> Range<usize> {
        visible_rows(self.mapper.pagination().as_ref(), self.data.row_count())
    }

    /// Rows the window renders.
    #[must_use]
    pub fn visible_row_count(&self) -> usize {
        self.visible_rows().len()
    }

    // ─── Sizing ───────────────────────────────────────────────────

    /// Analytic content size: every column, every visible row, plus chrome.
    #[must_use]
    pub fn unconstrained_size(&self) -> Size {
        let inputs = EstimateInputs {
            registry: &self.registry,
            mapper: &self.mapper,
            options: self.row_heights.as_ref(),
            default_height: self.default_height(),
            header_height: self.header_height,
            footer_height: self.footer_height,
            scroll_metrics: self.scroll_metrics,
        };
        Size::new(
            SizeEstimator.estimate_width(&self.layout),
            SizeEstimator.estimate_height(0..self.visible_row_count(), &inputs),
        )
    }

    /// Size the body renders at.
    #[must_use]
    pub fn final_size(&self) -> Size {
        if let Some(viewport) = self.fullscreen {
            return viewport;
        }
        match self.sizing {
            SizingState::Measured(size) | SizingState::Estimated(size) => size,
            SizingState::Unmeasured => self.unconstrained_size(),
        }
    }

    fn transition(&mut self, next: SizingState) {
        if self.sizing != next {
            vgrid_core::debug!(from = ?self.sizing, to = ?next, "sizing state");
            self.sizing = next;
        }
    }

    /// Drop any measurement and fall back to a fresh estimate.
    fn invalidate_sizing(&mut self) {
        let estimate = self.unconstrained_size();
        self.transition(SizingState::Estimated(estimate));
    }

    /// Recompute the estimate if the body is not measured.
    fn refresh_estimate(&mut self) {
        if matches!(self.sizing, SizingState::Estimated(_)) {
            self.invalidate_sizing();
        }
    }

    /// Container resized. An empty box keeps using the estimate.
    pub fn on_resize(&mut self, size: Size) {
        if size.is_empty() {
            self.invalidate_sizing();
        } else {
            self.transition(SizingState::Measured(size));
        }
    }

    pub fn on_header_resize(&mut self, height: u32) {
        if std::mem::replace(&mut self.header_height, height) != height {
            self.refresh_estimate();
        }
    }

    pub fn on_footer_resize(&mut self, height: u32) {
        if std::mem::replace(&mut self.footer_height, height) != height {
            self.refresh_estimate();
        }
    }

    /// Scroll box metrics, used for scrollbar compensation in the estimate.
    pub fn set_scroll_metrics(&mut self, metrics: ScrollMetrics) {
        if self.scroll_metrics != Some(metrics) {
            self.scroll_metrics = Some(metrics);
            self.refresh_estimate();
        }
    }

    /// The data source's row count changed. Rows past the new end are
    /// unmounted.
    pub fn on_row_count_changed(&mut self) {
        let row_count = self.data.row_count();
        self.row_manager.retain_rows(|row| row < row_count);
        self.mounted.retain(|(handle, _)| handle.row_index() < row_count);
        self.sync_row_map();
        self.invalidate_sizing();
    }

    /// Enter fullscreen at `viewport`, or leave it with `None`.
    pub fn set_fullscreen(&mut self, viewport: Option<Size>) {
        let was = self.fullscreen.is_some();
        self.fullscreen = viewport;
        if was != viewport.is_some() {
            self.invalidate_sizing();
        }
    }

    // ─── Configuration changes ────────────────────────────────────

    /// Change page. Unmounts the old page's rows, scrolls back to the first
    /// row and re-measures rows.
    pub fn set_pagination(&mut self, pagination: Option<Pagination>) {
        if self.mapper.pagination() == pagination {
            return;
        }
        self.mapper.set_pagination(pagination);
        self.row_manager.clear();
        self.mounted.clear();
        self.window.scroll_to_item(ScrollTarget::row(0));
        self.window.reset_after_row_index(0);
        vgrid_core::trace!(?pagination, "row sizes invalidated for page change");
        self.invalidate_sizing();
    }

    pub fn set_sorting(&mut self, sort: Option<SortDescriptor>) {
        self.sort = sort;
        self.sync_row_map();
    }

    /// Replace the resolved schema.
    pub fn set_schema(&mut self, schema: Schema) {
        self.schema = schema;
        self.sync_row_map();
    }

    /// Infer the schema from in-memory values; explicit column schemas win.
    pub fn detect_schema(&mut self) {
        let columns: Vec<(&str, Option<&str>)> = self
            .layout
            .columns()
            .iter()
            .map(|c| (c.id.as_str(), c.schema.as_deref()))
            .collect();
        let rows = self
            .data
            .in_memory_values()
            .into_iter()
            .flat_map(|values| values.rows().map(|(_, row)| row));
        let schema = Schema::detect(&columns, rows, &self.detectors);
        self.set_schema(schema);
    }

    /// Rebuild the sorted map if its inputs changed.
    fn sync_row_map(&mut self) {
        let changed = self.mapper.sync(
            self.sort.as_ref(),
            self.data.in_memory_values(),
            &self.schema,
            &self.detectors,
        );
        if changed {
            self.window.reset_after_row_index(0);
            vgrid_core::trace!("row sizes invalidated for sort change");
        }
    }

    pub fn set_row_heights_options(&mut self, options: Option<RowHeightsOptions>) {
        if self.row_heights == options {
            return;
        }
        self.row_heights = options;
        self.window.reset_after_row_index(0);
        vgrid_core::trace!("row sizes invalidated for height options");
        self.refresh_estimate();
    }

    pub fn set_density(&mut self, density: Density) {
        if self.config.density == density {
            return;
        }
        self.config.density = density;
        self.registry
            .set_density(density, self.config.effective_line_height());
        self.window.reset_after_row_index(0);
        vgrid_core::trace!(%density, "row sizes invalidated for density");
        self.refresh_estimate();
    }

    /// Set the fallback row height, e.g. once the first rendered row has
    /// been measured.
    pub fn set_default_row_height(&mut self, height: u32) {
        if std::mem::replace(&mut self.config.default_row_height, height) != height {
            self.window.reset_after_row_index(0);
            self.refresh_estimate();
        }
    }

    pub fn set_column_width(&mut self, column_id: &str, width: u32) {
        if self.layout.set_column_width(column_id, width) {
            self.window.reset_after_column_index(0);
            vgrid_core::trace!(column_id, width, "column sizes invalidated");
            self.refresh_estimate();
        }
    }

    pub fn set_default_column_width(&mut self, width: u32) {
        self.config.default_column_width = width;
        if self.layout.set_default_width(width) {
            self.window.reset_after_column_index(0);
            self.refresh_estimate();
        }
    }

    /// Replace the data columns. Measurements of removed columns are
    /// dropped, which may re-settle auto rows.
    pub fn set_columns(&mut self, columns: Vec<ColumnDefinition>) {
        self.layout.set_columns(columns);
        let ids = self.layout.data_column_ids();
        let resettled = self.registry.prune_hidden_columns(&ids);
        self.window.reset_after_column_index(0);
        vgrid_core::trace!(columns = ids.len(), resettled, "column sizes invalidated");
        self.refresh_estimate();
    }

    // ─── Measurement and deferred work ────────────────────────────

    /// Register the callback fired when settled heights need a re-render.
    pub fn set_rerender_callback(&mut self, f: impl FnMut() + 'static) {
        self.registry.set_rerender_callback(f);
    }

    /// A cell's content height was measured.
    ///
    /// Only auto-height rows take measurements. Returns `true` if the row's
    /// settled height changed; the change takes effect on the next
    /// [`flush`](Self::flush).
    pub fn on_cell_measured(
        &mut self,
        visible_row_index: usize,
        column_id: &str,
        content_height: f64,
    ) -> bool {
        let row = self.mapper.corrected_index(visible_row_index);
        if !self.registry.is_auto_height(row, self.row_heights.as_ref()) {
            return false;
        }
        self.registry
            .set_row_height(row, column_id, content_height, visible_row_index)
    }

    /// Apply pending height settlements.
    ///
    /// Returns the visible row the window was invalidated from, or `None`
    /// if nothing was pending.
    pub fn flush(&mut self) -> Option<usize> {
        let row = self.registry.flush()?;
        self.window.reset_after_row_index(row);
        vgrid_core::trace!(row, "row sizes invalidated after settlement");
        self.refresh_estimate();
        Some(row)
    }

    /// Feed a mutation batch from the rendered cells to the tab guard.
    pub fn on_mutations<T: FocusTree + ?Sized>(
        &mut self,
        tree: &mut T,
        records: &[MutationRecord],
    ) -> GuardReport {
        self.tab_guard.on_mutations(tree, records)
    }

    // ─── Render pass ──────────────────────────────────────────────

    /// Render the cells intersecting `viewport`.
    ///
    /// Brings the sorted map and the window's size caches up to date, then
    /// builds one [`CellRenderPlan`] per visible cell and mounts it in the
    /// row manager. Cells from the previous pass that are no longer visible
    /// are unmounted.
    pub fn render(&mut self, viewport: Size) -> Vec<CellRenderPlan> {
        self.sync_row_map();
        if self.sizing == SizingState::Unmeasured {
            self.invalidate_sizing();
        }

        let row_count = self.visible_row_count();
        let column_count = self.layout.column_count();
        let heights = Heights {
            registry: &self.registry,
            mapper: &self.mapper,
            options: self.row_heights.as_ref(),
            fallback: self.config.default_row_height,
        };
        let layout = &self.layout;
        self.window.sync_sizes(
            row_count,
            column_count,
            &|row| heights.row_height(row),
            &|column| layout.column_width(column),
        );

        let range = self.window.visible_cells(viewport);
        let span = vgrid_core::debug_span!(
            "grid_body_render",
            rows = range.rows.len(),
            cols = range.columns.len()
        );
        let _guard = span.enter();

        let renderer = CellWindowRenderer {
            layout: &self.layout,
            schema: &self.schema,
            detectors: &self.detectors,
            popovers: &self.popovers,
            mapper: &self.mapper,
            values: &self.data,
            header_height: self.header_height,
        };

        let mut plans = Vec::with_capacity(range.rows.len() * range.columns.len());
        let mut mounted = HashSet::with_capacity(plans.capacity());
        for (row, column) in range.cells() {
            let area = self.window.cell_area(row, column);
            let Some(plan) = renderer.render_cell(row, column, area) else {
                continue;
            };
            let handle = self.row_manager.get_row(
                plan.row_index,
                row,
                column,
                plan.area.y,
                plan.area.height,
            );
            mounted.insert((handle, column));
            plans.push(plan);
        }

        for (handle, column) in self.mounted.difference(&mounted) {
            self.row_manager.release_cell(*handle, *column);
        }
        self.mounted = mounted;
        plans
    }
}
