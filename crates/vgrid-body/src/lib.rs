#![forbid(unsafe_code)]

//! Virtualized body for the vgrid data grid.
//!
//! The body renders only the cells intersecting the scroll viewport. It
//! resolves row heights (fixed, line-count, or measured auto heights),
//! maps visible positions to logical rows under in-memory sorting and
//! pagination, estimates the content size before rows are measured, and
//! keeps interactive cell content out of the tab order.
//!
//! [`GridBody`] is the entry point; the other modules are its parts and can
//! be used on their own.

pub mod body;
pub mod cell;
pub mod columns;
pub mod fenwick;
pub mod pagination;
pub mod row_height;
pub mod row_index;
pub mod row_manager;
pub mod schema;
pub mod size_estimate;
pub mod sorting;
pub mod tab_guard;
pub mod window;

pub use body::{GridBody, GridDataSource, SizingState};
pub use cell::{
    CellFlags, CellKind, CellRenderPlan, CellValueSource, CellWindowRenderer, PopoverContents,
    PopoverFormatter,
};
pub use columns::{ColumnDefinition, ColumnKind, ColumnLayout, ControlCellContext, ControlColumn};
pub use pagination::Pagination;
pub use row_height::{RowHeightOption, RowHeightRegistry, RowHeightsOptions, Settlement};
pub use row_index::{RowIndexMap, RowIndexMapper};
pub use row_manager::{MountedRow, RowHandle, RowManager};
pub use schema::{Comparator, Schema, SchemaDetector, TextTransform};
pub use size_estimate::{EstimateInputs, HeightEstimate, ScrollMetrics, SizeEstimator};
pub use sorting::{InMemoryValues, SortColumn, SortDescriptor, SortDirection};
pub use tab_guard::{ElementFlags, ElementTree, FocusTree, GuardReport, MutationRecord, TabGuard};
pub use window::{CellRange, ScrollTarget, VariableSizeGrid, WindowingPrimitive};

pub use vgrid_core::config::{BodyConfig, Density};
pub use vgrid_core::geometry::{Rect, Size};
