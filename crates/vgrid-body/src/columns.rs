#![forbid(unsafe_code)]

//! Column definitions and column index classification.
//!
//! The window sees one flat sequence of columns:
//!
//! ```text
//! [ leading controls | data columns | trailing controls ]
//!   0 .. L             L .. L+D       L+D .. L+D+T
//! ```

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::schema::TextTransform;

/// A schema-driven data column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnDefinition {
    /// Unique id, also the key into row values.
    pub id: String,
    /// Explicit schema type, overriding detection.
    pub schema: Option<String>,
    /// Explicit width in pixels.
    pub initial_width: Option<u32>,
    /// `Some(false)` disables the cell expansion popover.
    pub is_expandable: Option<bool>,
    /// Pinned text transform; wins over the schema detector's.
    pub text_transform: Option<TextTransform>,
}

impl ColumnDefinition {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: u32) -> Self {
        self.initial_width = Some(width);
        self
    }

    #[must_use]
    pub fn with_expandable(mut self, expandable: bool) -> Self {
        self.is_expandable = Some(expandable);
        self
    }

    #[must_use]
    pub fn with_text_transform(mut self, transform: TextTransform) -> Self {
        self.text_transform = Some(transform);
        self
    }

    /// Columns are expandable unless explicitly disabled.
    #[must_use]
    pub fn expandable(&self) -> bool {
        self.is_expandable.unwrap_or(true)
    }
}

/// Cell coordinates handed to a control column's content producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlCellContext<'a> {
    pub row_index: usize,
    pub visible_row_index: usize,
    pub column_id: &'a str,
}

type ControlRenderFn = Rc<dyn Fn(&ControlCellContext<'_>) -> String>;

/// A fixed-width column pinned to the leading or trailing edge.
#[derive(Clone)]
pub struct ControlColumn {
    pub id: String,
    pub width: u32,
    render: ControlRenderFn,
}

impl fmt::Debug for ControlColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlColumn")
            .field("id", &self.id)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

impl ControlColumn {
    pub fn new(
        id: impl Into<String>,
        width: u32,
        render: impl Fn(&ControlCellContext<'_>) -> String + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            width,
            render: Rc::new(render),
        }
    }

    /// Produce the cell content for one row.
    #[must_use]
    pub fn render(&self, ctx: &ControlCellContext<'_>) -> String {
        (self.render)(ctx)
    }
}

/// What a flat column index refers to.
#[derive(Debug, Clone, Copy)]
pub enum ColumnKind<'a> {
    LeadingControl(&'a ControlColumn),
    TrailingControl(&'a ControlColumn),
    Data {
        column: &'a ColumnDefinition,
        /// Index into the data columns.
        data_index: usize,
    },
}

impl ColumnKind<'_> {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::LeadingControl(c) | Self::TrailingControl(c) => &c.id,
            Self::Data { column, .. } => &column.id,
        }
    }

    #[must_use]
    pub fn is_control(&self) -> bool {
        !matches!(self, Self::Data { .. })
    }
}

/// Ordered columns plus their width overrides.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    leading: Vec<ControlColumn>,
    columns: Vec<ColumnDefinition>,
    trailing: Vec<ControlColumn>,
    /// Column id → width; wins over `initial_width`.
    widths: HashMap<String, u32>,
    default_width: u32,
}

impl ColumnLayout {
    #[must_use]
    pub fn new(columns: Vec<ColumnDefinition>, default_width: u32) -> Self {
        let widths = columns
            .iter()
            .filter_map(|c| c.initial_width.map(|w| (c.id.clone(), w)))
            .collect();
        Self {
            leading: Vec::new(),
            columns,
            trailing: Vec::new(),
            widths,
            default_width,
        }
    }

    #[must_use]
    pub fn with_leading(mut self, leading: Vec<ControlColumn>) -> Self {
        self.leading = leading;
        self
    }

    #[must_use]
    pub fn with_trailing(mut self, trailing: Vec<ControlColumn>) -> Self {
        self.trailing = trailing;
        self
    }

    #[must_use]
    pub fn leading(&self) -> &[ControlColumn] {
        &self.leading
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    #[must_use]
    pub fn trailing(&self) -> &[ControlColumn] {
        &self.trailing
    }

    /// Total columns the window renders.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.leading.len() + self.columns.len() + self.trailing.len()
    }

    /// Classify a flat column index. Leading controls are checked first,
    /// then trailing, then data.
    #[must_use]
    pub fn classify(&self, column_index: usize) -> Option<ColumnKind<'_>> {
        let leading = self.leading.len();
        if column_index < leading {
            return Some(ColumnKind::LeadingControl(&self.leading[column_index]));
        }
        let trailing_start = leading + self.columns.len();
        if column_index >= trailing_start {
            return self
                .trailing
                .get(column_index - trailing_start)
                .map(ColumnKind::TrailingControl);
        }
        let data_index = column_index - leading;
        Some(ColumnKind::Data {
            column: &self.columns[data_index],
            data_index,
        })
    }

    /// Width of a data column by id: explicit width, else the default.
    #[must_use]
    pub fn data_width(&self, column_id: &str) -> u32 {
        self.widths
            .get(column_id)
            .copied()
            .filter(|w| *w > 0)
            .unwrap_or(self.default_width)
    }

    /// Width of a flat column index; 0 past the end.
    #[must_use]
    pub fn column_width(&self, column_index: usize) -> u32 {
        match self.classify(column_index) {
            Some(ColumnKind::LeadingControl(c) | ColumnKind::TrailingControl(c)) => c.width,
            Some(ColumnKind::Data { column, .. }) => self.data_width(&column.id),
            None => 0,
        }
    }

    /// Set a data column's width. Returns `true` if it changed.
    pub fn set_column_width(&mut self, column_id: &str, width: u32) -> bool {
        self.widths.insert(column_id.to_string(), width) != Some(width)
    }

    /// Set the width used by data columns without one.
    pub fn set_default_width(&mut self, width: u32) -> bool {
        std::mem::replace(&mut self.default_width, width) != width
    }

    /// Replace the data columns, keeping width overrides for ids that remain.
    pub fn set_columns(&mut self, columns: Vec<ColumnDefinition>) {
        self.widths
            .retain(|id, _| columns.iter().any(|c| &c.id == id));
        for c in &columns {
            if let Some(w) = c.initial_width {
                self.widths.entry(c.id.clone()).or_insert(w);
            }
        }
        self.columns = columns;
    }

    /// Ids of the data columns, in order.
    #[must_use]
    pub fn data_column_ids(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.id.as_str()).collect()
    }
}
