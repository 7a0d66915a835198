#![forbid(unsafe_code)]

//! Per-cell render dispatch.
//!
//! The window calls [`CellWindowRenderer::render_cell`] for every visible
//! `(row, column)` pair. The renderer classifies the column, resolves the
//! column's schema, width, and formatter, and returns a [`CellRenderPlan`]
//! describing what the presentational cell should draw and where.

use std::collections::HashMap;

use bitflags::bitflags;
use vgrid_core::geometry::Rect;

use crate::columns::{ColumnKind, ColumnLayout, ControlCellContext};
use crate::row_index::RowIndexMapper;
use crate::schema::{Schema, SchemaDetector, TYPE_JSON, TextTransform, match_detector};

bitflags! {
    /// Visual classification of a rendered cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u8 {
        /// Odd visible row.
        const STRIPED = 1 << 0;
        const FIRST_COLUMN = 1 << 1;
        const LAST_COLUMN = 1 << 2;
        /// Leading or trailing control column.
        const CONTROL_COLUMN = 1 << 3;
        /// Cell content can be expanded into a popover.
        const EXPANDABLE = 1 << 4;
    }
}

/// Which edge group a cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    LeadingControl,
    TrailingControl,
    Data,
}

/// Formatter used for a cell's expansion popover.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PopoverFormatter {
    /// Show the raw cell text.
    #[default]
    Default,
    /// Pretty-print JSON.
    Json,
    /// Host-registered formatter, identified by key.
    Named(String),
}

impl PopoverFormatter {
    /// Format raw cell text for the popover.
    ///
    /// `Named` formatters are resolved by the host; here they pass the text
    /// through unchanged.
    #[must_use]
    pub fn format(&self, raw: &str) -> String {
        match self {
            Self::Json => serde_json::from_str::<serde_json::Value>(raw)
                .and_then(|v| serde_json::to_string_pretty(&v))
                .unwrap_or_else(|_| raw.to_string()),
            Self::Default | Self::Named(_) => raw.to_string(),
        }
    }
}

/// Column type → popover formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopoverContents {
    by_type: HashMap<String, PopoverFormatter>,
}

impl Default for PopoverContents {
    fn default() -> Self {
        let mut by_type = HashMap::new();
        by_type.insert(TYPE_JSON.to_string(), PopoverFormatter::Json);
        Self { by_type }
    }
}

impl PopoverContents {
    /// Register or replace the formatter for a column type.
    pub fn insert(&mut self, column_type: impl Into<String>, formatter: PopoverFormatter) {
        self.by_type.insert(column_type.into(), formatter);
    }

    /// Formatter for a column type, falling back to the default.
    #[must_use]
    pub fn resolve(&self, column_type: Option<&str>) -> PopoverFormatter {
        column_type
            .and_then(|ty| self.by_type.get(ty))
            .cloned()
            .unwrap_or_default()
    }
}

/// Source of displayed cell values.
pub trait CellValueSource {
    /// Text for a data cell.
    fn render_cell_value(&self, row_index: usize, column_id: &str) -> String;
}

/// Everything the presentational cell needs for one `(row, column)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRenderPlan {
    /// Logical row used for data lookups.
    pub row_index: usize,
    /// Row position within the window.
    pub visible_row_index: usize,
    pub column_index: usize,
    pub column_id: String,
    pub kind: CellKind,
    pub column_type: Option<String>,
    pub width: u32,
    pub popover: PopoverFormatter,
    pub flags: CellFlags,
    pub text_transform: Option<TextTransform>,
    /// Cell box in scroll content coordinates, below the header.
    pub area: Rect,
    pub content: String,
}

/// Lookup tables shared by every cell in a pass.
#[derive(Clone, Copy)]
pub struct CellWindowRenderer<'a> {
    pub layout: &'a ColumnLayout,
    pub schema: &'a Schema,
    pub detectors: &'a [SchemaDetector],
    pub popovers: &'a PopoverContents,
    pub mapper: &'a RowIndexMapper,
    pub values: &'a dyn CellValueSource,
    /// Height of the header, rendered outside the window.
    pub header_height: u32,
}

impl CellWindowRenderer<'_> {
    /// Build the render plan for one window cell.
    ///
    /// `area` is the box the window assigned to the cell; it is shifted
    /// down by the header height so header and body scroll as one. Returns
    /// `None` for a column index past the end.
    #[must_use]
    pub fn render_cell(
        &self,
        visible_row_index: usize,
        column_index: usize,
        area: Rect,
    ) -> Option<CellRenderPlan> {
        let kind = self.layout.classify(column_index)?;
        let row_index = self.mapper.corrected_index(visible_row_index);

        let mut flags = CellFlags::empty();
        flags.set(CellFlags::STRIPED, visible_row_index % 2 == 1);
        flags.set(CellFlags::FIRST_COLUMN, column_index == 0);
        flags.set(
            CellFlags::LAST_COLUMN,
            column_index + 1 == self.layout.column_count(),
        );
        flags.set(CellFlags::CONTROL_COLUMN, kind.is_control());
        let area = area.shifted_down(self.header_height);
        let column_id = kind.id().to_string();

        let plan = match kind {
            ColumnKind::LeadingControl(control) | ColumnKind::TrailingControl(control) => {
                let ctx = ControlCellContext {
                    row_index,
                    visible_row_index,
                    column_id: &column_id,
                };
                let content = control.render(&ctx);
                CellRenderPlan {
                    row_index,
                    visible_row_index,
                    column_index,
                    column_id,
                    kind: if matches!(kind, ColumnKind::LeadingControl(_)) {
                        CellKind::LeadingControl
                    } else {
                        CellKind::TrailingControl
                    },
                    column_type: None,
                    width: control.width,
                    popover: PopoverFormatter::Default,
                    flags,
                    text_transform: None,
                    area,
                    content,
                }
            }
            ColumnKind::Data { column, .. } => {
                let column_type = self.schema.column_type(&column.id).map(str::to_string);
                flags.set(CellFlags::EXPANDABLE, column.expandable());
                let text_transform = column.text_transform.or_else(|| {
                    match_detector(self.detectors, &column.id, column.schema.as_deref())
                        .and_then(|d| d.text_transform)
                });
                let content = self.values.render_cell_value(row_index, &column.id);
                CellRenderPlan {
                    row_index,
                    visible_row_index,
                    column_index,
                    column_id,
                    kind: CellKind::Data,
                    popover: self.popovers.resolve(column_type.as_deref()),
                    column_type,
                    width: self.layout.data_width(&column.id),
                    flags,
                    text_transform,
                    area,
                    content,
                }
            }
        };
        Some(plan)
    }
}
