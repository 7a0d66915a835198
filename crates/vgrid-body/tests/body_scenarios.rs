//! End-to-end scenarios for the grid body.
//!
//! Each test drives a [`GridBody`] the way a host event loop would and
//! checks what the window and the host observe.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vgrid_body::{
    BodyConfig, CellKind, CellRange, ColumnDefinition, ControlColumn, ElementFlags, ElementTree,
    GridBody, InMemoryValues, MutationRecord, Pagination, Rect, RowHeightOption,
    RowHeightsOptions, ScrollTarget, Settlement, Size, SizingState, SortDescriptor, SortDirection,
    VariableSizeGrid, WindowingPrimitive,
};

// ============================================================================
// Recording window
// ============================================================================

/// Imperative calls the body made on its window.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WindowCall {
    ResetRows(usize),
    ResetColumns(usize),
    ScrollTo(ScrollTarget),
}

/// Wraps the stock grid and records every invalidation.
struct RecordingWindow {
    inner: VariableSizeGrid,
    calls: Rc<RefCell<Vec<WindowCall>>>,
}

impl RecordingWindow {
    fn new() -> (Self, Rc<RefCell<Vec<WindowCall>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let window = Self {
            inner: VariableSizeGrid::new(),
            calls: Rc::clone(&calls),
        };
        (window, calls)
    }
}

impl WindowingPrimitive for RecordingWindow {
    fn sync_sizes(
        &mut self,
        row_count: usize,
        column_count: usize,
        row_height: &dyn Fn(usize) -> u32,
        column_width: &dyn Fn(usize) -> u32,
    ) {
        self.inner
            .sync_sizes(row_count, column_count, row_height, column_width);
    }

    fn visible_cells(&self, viewport: Size) -> CellRange {
        self.inner.visible_cells(viewport)
    }

    fn cell_area(&self, row: usize, column: usize) -> Rect {
        self.inner.cell_area(row, column)
    }

    fn reset_after_row_index(&mut self, index: usize) {
        self.calls.borrow_mut().push(WindowCall::ResetRows(index));
        self.inner.reset_after_row_index(index);
    }

    fn reset_after_column_index(&mut self, index: usize) {
        self.calls.borrow_mut().push(WindowCall::ResetColumns(index));
        self.inner.reset_after_column_index(index);
    }

    fn scroll_to_item(&mut self, target: ScrollTarget) {
        self.calls.borrow_mut().push(WindowCall::ScrollTo(target));
        self.inner.scroll_to_item(target);
    }
}

fn dataset(rows: usize) -> InMemoryValues {
    let mut mem = InMemoryValues::new();
    for r in 0..rows {
        mem.set(r, "name", format!("row-{r}"));
        mem.set(r, "amount", format!("${}.00", (r * 7) % 13));
    }
    mem
}

fn columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("name").with_width(120),
        ColumnDefinition::new("amount"),
    ]
}

fn config() -> BodyConfig {
    BodyConfig::default().with_overscan(0, 0)
}

// ============================================================================
// Pagination
// ============================================================================

#[test]
fn page_change_resets_scroll_and_row_cache() {
    let (window, calls) = RecordingWindow::new();
    let mut body = GridBody::new(config(), dataset(100), window, columns());
    body.set_pagination(Some(Pagination::new(0, 20)));
    body.render(Size::new(220, 200));
    calls.borrow_mut().clear();

    body.set_pagination(Some(Pagination::new(1, 20)));

    assert_eq!(body.visible_rows(), 20..40);
    let calls = calls.borrow().clone();
    assert!(calls.contains(&WindowCall::ScrollTo(ScrollTarget::row(0))));
    assert!(calls.contains(&WindowCall::ResetRows(0)));
    assert!(matches!(body.sizing(), SizingState::Estimated(_)));

    let plans = body.render(Size::new(220, 68));
    assert_eq!(plans[0].row_index, 20);
    assert_eq!(plans[0].visible_row_index, 0);
    assert_eq!(plans[0].content, "row-20");
}

#[test]
fn same_page_is_not_an_invalidation() {
    let (window, calls) = RecordingWindow::new();
    let mut body = GridBody::new(config(), dataset(50), window, columns());
    body.set_pagination(Some(Pagination::new(2, 10)));
    calls.borrow_mut().clear();
    body.set_pagination(Some(Pagination::new(2, 10)));
    assert!(calls.borrow().is_empty());
}

#[test]
fn last_page_is_short() {
    let mut body = GridBody::with_default_window(config(), dataset(45), columns());
    body.set_pagination(Some(Pagination::new(2, 20)));
    assert_eq!(body.visible_rows(), 40..45);
    let plans = body.render(Size::new(220, 1000));
    let mut rows: Vec<_> = plans.iter().map(|p| p.row_index).collect();
    rows.dedup();
    assert_eq!(rows, vec![40, 41, 42, 43, 44]);
}

// ============================================================================
// Row height settlement
// ============================================================================

#[test]
fn auto_height_settles_with_one_rerender() {
    let mut body = GridBody::with_default_window(config(), dataset(5), columns());
    let rerenders = Rc::new(Cell::new(0));
    let r = Rc::clone(&rerenders);
    body.set_rerender_callback(move || r.set(r.get() + 1));
    body.set_row_heights_options(Some(
        RowHeightsOptions::new().with_row_height(2, RowHeightOption::AUTO),
    ));

    // First estimate: unmeasured auto row uses the fallback height.
    body.render(Size::new(220, 500));
    assert_eq!(body.row_height(2), 34);
    assert_eq!(body.window().total_height(), 5 * 34);

    // Both cells of the row report during the same pass.
    assert!(body.on_cell_measured(2, "name", 48.0));
    assert!(body.on_cell_measured(2, "amount", 70.0));
    assert!(!body.on_cell_measured(2, "amount", 70.0));
    assert_eq!(rerenders.get(), 0);

    assert_eq!(body.flush(), Some(2));
    assert_eq!(rerenders.get(), 1);
    assert_eq!(body.flush(), None);
    assert_eq!(rerenders.get(), 1);

    body.render(Size::new(220, 500));
    // 70 content + 2 * 6 padding
    assert_eq!(body.row_height(2), 82);
    assert_eq!(body.window().total_height(), 4 * 34 + 82);
}

#[test]
fn garbage_measurements_keep_fallback() {
    let mut body = GridBody::with_default_window(config(), dataset(3), columns());
    body.set_row_heights_options(Some(
        RowHeightsOptions::new().with_default_height(RowHeightOption::AUTO),
    ));
    assert!(!body.on_cell_measured(0, "name", f64::NAN));
    assert!(!body.on_cell_measured(0, "name", -10.0));
    assert_eq!(body.flush(), None);
    assert_eq!(body.row_height(0), 34);
}

#[test]
fn removing_a_column_resettles_rows() {
    let (window, calls) = RecordingWindow::new();
    let mut body = GridBody::new(config(), dataset(3), window, columns());
    body.set_row_heights_options(Some(
        RowHeightsOptions::new().with_default_height(RowHeightOption::AUTO),
    ));
    body.on_cell_measured(1, "name", 20.0);
    body.on_cell_measured(1, "amount", 90.0);
    body.flush();
    assert_eq!(body.row_height(1), 102);

    calls.borrow_mut().clear();
    body.set_columns(vec![ColumnDefinition::new("name")]);
    assert!(calls.borrow().contains(&WindowCall::ResetColumns(0)));
    assert_eq!(body.flush(), Some(0));
    assert!(calls.borrow().contains(&WindowCall::ResetRows(0)));
    assert_eq!(body.row_height(1), 34);
}

#[test]
fn settlement_and_prune_on_a_later_page() {
    let (window, calls) = RecordingWindow::new();
    let mut body = GridBody::new(config(), dataset(100), window, columns());
    body.set_pagination(Some(Pagination::new(1, 20)));
    body.set_row_heights_options(Some(
        RowHeightsOptions::new().with_default_height(RowHeightOption::AUTO),
    ));
    body.render(Size::new(220, 1000));

    // Window position 0 shows logical row 20.
    assert!(body.on_cell_measured(0, "name", 20.0));
    assert!(body.on_cell_measured(0, "amount", 200.0));
    assert_eq!(body.flush(), Some(0));
    assert_eq!(body.registry().settlement(20), Settlement::Settled(212));
    body.render(Size::new(220, 1000));
    assert_eq!(body.window().cell_area(0, 0).height, 212);
    assert_eq!(body.window().cell_area(1, 0).y, 212);

    calls.borrow_mut().clear();
    body.set_columns(vec![ColumnDefinition::new("name")]);
    assert_eq!(body.flush(), Some(0));
    assert!(calls.borrow().contains(&WindowCall::ResetRows(0)));
    body.render(Size::new(220, 1000));
    assert_eq!(body.row_height(0), 34);
    assert_eq!(body.window().cell_area(0, 0).height, 34);
    assert_eq!(body.window().cell_area(1, 0).y, 34);
}

#[test]
fn settlement_and_prune_under_sorting() {
    let (window, _calls) = RecordingWindow::new();
    let mut body = GridBody::new(config(), dataset(13), window, columns());
    body.detect_schema();
    body.set_sorting(Some(
        SortDescriptor::new().then_by("amount", SortDirection::Desc),
    ));
    body.set_row_heights_options(Some(
        RowHeightsOptions::new().with_default_height(RowHeightOption::AUTO),
    ));
    body.render(Size::new(220, 1000));

    // Amounts are (r * 7) % 13, so position 3 holds $9.00 at logical row 5.
    assert!(body.on_cell_measured(3, "amount", 58.0));
    assert_eq!(body.flush(), Some(3));
    assert_eq!(body.registry().settlement(5), Settlement::Settled(70));
    body.render(Size::new(220, 1000));
    assert_eq!(body.row_height(3), 70);
    assert_eq!(body.window().cell_area(3, 0).height, 70);
    assert_eq!(body.window().cell_area(4, 0).y, 3 * 34 + 70);
    assert_eq!(body.window().cell_area(8, 0).height, 34);

    body.set_columns(vec![ColumnDefinition::new("name")]);
    assert_eq!(body.flush(), Some(0));
    body.render(Size::new(220, 1000));
    assert_eq!(body.window().cell_area(3, 0).height, 34);
    assert_eq!(body.window().cell_area(4, 0).y, 4 * 34);
}

// ============================================================================
// Sorting
// ============================================================================

#[test]
fn sorting_rebuilds_map_and_invalidates_rows() {
    let (window, calls) = RecordingWindow::new();
    let mut body = GridBody::new(config(), dataset(13), window, columns());
    body.detect_schema();
    assert_eq!(body.schema().column_type("amount"), Some("currency"));

    calls.borrow_mut().clear();
    body.set_sorting(Some(
        SortDescriptor::new().then_by("amount", SortDirection::Desc),
    ));
    assert!(body.mapper().is_sorting());
    assert!(calls.borrow().contains(&WindowCall::ResetRows(0)));

    let plans = body.render(Size::new(220, 34));
    // (r * 7) % 13 == 12 at r == 11.
    assert_eq!(plans[0].row_index, 11);
    assert_eq!(plans[1].content, "$12.00");

    body.set_sorting(None);
    assert!(!body.mapper().is_sorting());
    let plans = body.render(Size::new(220, 34));
    assert_eq!(plans[0].row_index, 0);
}

#[test]
fn data_edits_resort_on_next_render() {
    let mut body = GridBody::with_default_window(config(), dataset(4), columns());
    body.set_sorting(Some(SortDescriptor::new().then_by("name", SortDirection::Asc)));
    body.render(Size::new(220, 34));
    body.data_mut().set(3, "name", "a-first");
    let plans = body.render(Size::new(220, 34));
    assert_eq!(plans[0].row_index, 3);
}

// ============================================================================
// Control columns and layout
// ============================================================================

#[test]
fn control_columns_frame_the_data() {
    let mut body = GridBody::with_default_window(config(), dataset(2), columns())
        .with_leading_controls(vec![ControlColumn::new("select", 30, |ctx| {
            format!("select {}", ctx.row_index)
        })])
        .with_trailing_controls(vec![ControlColumn::new("actions", 40, |_| "…".into())]);
    let plans = body.render(Size::new(1000, 34));
    let kinds: Vec<_> = plans.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CellKind::LeadingControl,
            CellKind::Data,
            CellKind::Data,
            CellKind::TrailingControl
        ]
    );
    assert_eq!(plans[0].content, "select 0");
    assert_eq!(body.unconstrained_size().width, 30 + 120 + 100 + 40);
}

#[test]
fn column_width_change_invalidates_columns() {
    let (window, calls) = RecordingWindow::new();
    let mut body = GridBody::new(config(), dataset(2), window, columns());
    body.set_column_width("name", 120);
    assert!(calls.borrow().is_empty(), "unchanged width must not invalidate");
    body.set_column_width("amount", 180);
    assert_eq!(*calls.borrow(), vec![WindowCall::ResetColumns(0)]);
    assert_eq!(body.column_width(1), 180);
}

// ============================================================================
// Sizing
// ============================================================================

#[test]
fn sizing_reenters_estimate_on_row_count_change() {
    let mut body = GridBody::with_default_window(config(), dataset(3), columns());
    body.on_header_resize(40);
    body.render(Size::new(220, 300));
    assert_eq!(body.sizing(), SizingState::Estimated(Size::new(220, 3 * 34 + 40)));

    body.on_resize(Size::new(220, 150));
    assert_eq!(body.sizing(), SizingState::Measured(Size::new(220, 150)));

    body.data_mut().set(3, "name", "row-3");
    body.on_row_count_changed();
    assert_eq!(body.sizing(), SizingState::Estimated(Size::new(220, 4 * 34 + 40)));
}

#[test]
fn fullscreen_bypasses_measurement() {
    let mut body = GridBody::with_default_window(config(), dataset(3), columns());
    body.on_resize(Size::new(220, 150));
    body.set_fullscreen(Some(Size::new(1280, 720)));
    assert_eq!(body.final_size(), Size::new(1280, 720));
    body.on_resize(Size::new(500, 500));
    assert_eq!(body.final_size(), Size::new(1280, 720));
    // Leaving fullscreen drops the measurement until the next resize.
    body.set_fullscreen(None);
    assert_eq!(body.final_size(), Size::new(220, 3 * 34));
    body.on_resize(Size::new(500, 500));
    assert_eq!(body.final_size(), Size::new(500, 500));
}

// ============================================================================
// Tab guard
// ============================================================================

#[test]
fn tab_guard_processes_each_root_once() {
    let mut tree = ElementTree::new();
    let grid = tree.append(None, "div", ElementFlags::empty());
    let mut targets = Vec::new();
    for _ in 0..2 {
        let root = tree.append(Some(grid), "div", ElementFlags::CELL_CONTENT_ROOT);
        let wrapper = tree.append(Some(root), "span", ElementFlags::empty());
        let link = tree.append(Some(wrapper), "a", ElementFlags::HAS_HREF);
        let button = tree.append(Some(root), "button", ElementFlags::empty());
        tree.append(Some(root), "button", ElementFlags::TAB_MANAGED);
        targets.push((root, wrapper, link, button));
    }
    let (a, b) = (targets[0], targets[1]);
    let records = [
        MutationRecord::new(a.1),
        MutationRecord::new(a.2),
        MutationRecord::new(a.3),
        MutationRecord::new(b.0),
        MutationRecord::new(b.2),
    ];

    let mut body = GridBody::with_default_window(config(), dataset(1), columns());
    let report = body.on_mutations(&mut tree, &records);
    assert_eq!(report.records, 5);
    assert_eq!(report.roots, 2);
    assert_eq!(report.demoted, 4);
    for (_, _, link, button) in targets {
        assert_eq!(tree.get(link).unwrap().tab_index, Some(-1));
        assert_eq!(tree.get(button).unwrap().tab_index, Some(-1));
    }
    assert_eq!(body.tab_guard().batches(), 1);
}
