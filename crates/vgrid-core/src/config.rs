#![forbid(unsafe_code)]

//! Grid body configuration.
//!
//! [`BodyConfig`] holds the pixel constants the body falls back to when no
//! measurement or per-row option is available. Values come from
//! [`Default`], the `with_*` builders, or environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `VGRID_ROW_HEIGHT` | `default_row_height` |
//! | `VGRID_COLUMN_WIDTH` | `default_column_width` |
//! | `VGRID_DENSITY` | `density` (`compact`/`normal`/`expanded`) |
//! | `VGRID_LINE_HEIGHT` | `line_height` (0 = density default) |
//! | `VGRID_OVERSCAN_ROWS` | `overscan_rows` |
//! | `VGRID_OVERSCAN_COLUMNS` | `overscan_columns` |
//!
//! Parsing never fails: bad values are reported in [`ConfigParse::errors`]
//! and the default is kept.

use std::env;
use std::fmt;

/// Row height used before anything has been measured.
pub const DEFAULT_ROW_HEIGHT: u32 = 34;
/// Width for data columns with no explicit width.
pub const DEFAULT_COLUMN_WIDTH: u32 = 100;

const ENV_ROW_HEIGHT: &str = "VGRID_ROW_HEIGHT";
const ENV_COLUMN_WIDTH: &str = "VGRID_COLUMN_WIDTH";
const ENV_DENSITY: &str = "VGRID_DENSITY";
const ENV_LINE_HEIGHT: &str = "VGRID_LINE_HEIGHT";
const ENV_OVERSCAN_ROWS: &str = "VGRID_OVERSCAN_ROWS";
const ENV_OVERSCAN_COLUMNS: &str = "VGRID_OVERSCAN_COLUMNS";

/// Cell density: controls padding and the default line height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Density {
    /// Small font, tight padding.
    Compact,
    /// Medium font and padding.
    #[default]
    Normal,
    /// Large font, loose padding.
    Expanded,
}

impl Density {
    /// Parse a density name (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "s" => Some(Self::Compact),
            "normal" | "m" => Some(Self::Normal),
            "expanded" | "l" => Some(Self::Expanded),
            _ => None,
        }
    }

    /// Vertical padding applied above and below cell content, in pixels.
    #[must_use]
    pub const fn cell_padding(self) -> u32 {
        match self {
            Self::Compact => 4,
            Self::Normal => 6,
            Self::Expanded => 8,
        }
    }

    /// Line height of cell text, in pixels.
    #[must_use]
    pub const fn line_height(self) -> u32 {
        match self {
            Self::Compact => 16,
            Self::Normal => 20,
            Self::Expanded => 24,
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Compact => "compact",
            Self::Normal => "normal",
            Self::Expanded => "expanded",
        };
        f.write_str(name)
    }
}

/// Pixel constants and windowing knobs for a grid body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyConfig {
    /// Fallback row height in pixels.
    pub default_row_height: u32,
    /// Width of data columns without an explicit width.
    pub default_column_width: u32,
    /// Cell density.
    pub density: Density,
    /// Explicit text line height; 0 uses the density default.
    pub line_height: u32,
    /// Extra rows rendered above and below the viewport.
    pub overscan_rows: usize,
    /// Extra columns rendered left and right of the viewport.
    pub overscan_columns: usize,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            default_row_height: DEFAULT_ROW_HEIGHT,
            default_column_width: DEFAULT_COLUMN_WIDTH,
            density: Density::Normal,
            line_height: 0,
            overscan_rows: 2,
            overscan_columns: 1,
        }
    }
}

/// Result of parsing configuration from the environment.
#[derive(Debug, Clone)]
pub struct ConfigParse {
    pub config: BodyConfig,
    pub errors: Vec<ConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl BodyConfig {
    /// Set the fallback row height.
    #[must_use]
    pub fn with_default_row_height(mut self, height: u32) -> Self {
        self.default_row_height = height;
        self
    }

    /// Set the default data column width.
    #[must_use]
    pub fn with_default_column_width(mut self, width: u32) -> Self {
        self.default_column_width = width;
        self
    }

    /// Set the cell density.
    #[must_use]
    pub fn with_density(mut self, density: Density) -> Self {
        self.density = density;
        self
    }

    /// Set an explicit line height (0 restores the density default).
    #[must_use]
    pub fn with_line_height(mut self, line_height: u32) -> Self {
        self.line_height = line_height;
        self
    }

    /// Set row and column overscan.
    #[must_use]
    pub fn with_overscan(mut self, rows: usize, columns: usize) -> Self {
        self.overscan_rows = rows;
        self.overscan_columns = columns;
        self
    }

    /// Line height actually used for line-count rows.
    #[must_use]
    pub fn effective_line_height(&self) -> u32 {
        if self.line_height > 0 {
            self.line_height
        } else {
            self.density.line_height()
        }
    }

    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> ConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Parse config using a custom environment lookup (for tests).
    pub fn from_env_with<F>(mut get: F) -> ConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(value) = get(ENV_ROW_HEIGHT) {
            match parse_positive(&value) {
                Some(parsed) => config.default_row_height = parsed,
                None => errors.push(ConfigError::new(
                    "default_row_height",
                    value,
                    "expected positive integer",
                )),
            }
        }

        if let Some(value) = get(ENV_COLUMN_WIDTH) {
            match parse_positive(&value) {
                Some(parsed) => config.default_column_width = parsed,
                None => errors.push(ConfigError::new(
                    "default_column_width",
                    value,
                    "expected positive integer",
                )),
            }
        }

        if let Some(value) = get(ENV_DENSITY) {
            match Density::parse(&value) {
                Some(parsed) => config.density = parsed,
                None => errors.push(ConfigError::new(
                    "density",
                    value,
                    "expected compact|normal|expanded",
                )),
            }
        }

        if let Some(value) = get(ENV_LINE_HEIGHT) {
            match value.trim().parse::<u32>() {
                Ok(parsed) => config.line_height = parsed,
                Err(_) => errors.push(ConfigError::new(
                    "line_height",
                    value,
                    "expected non-negative integer",
                )),
            }
        }

        if let Some(value) = get(ENV_OVERSCAN_ROWS) {
            match value.trim().parse::<usize>() {
                Ok(parsed) => config.overscan_rows = parsed,
                Err(_) => errors.push(ConfigError::new(
                    "overscan_rows",
                    value,
                    "expected non-negative integer",
                )),
            }
        }

        if let Some(value) = get(ENV_OVERSCAN_COLUMNS) {
            match value.trim().parse::<usize>() {
                Ok(parsed) => config.overscan_columns = parsed,
                Err(_) => errors.push(ConfigError::new(
                    "overscan_columns",
                    value,
                    "expected non-negative integer",
                )),
            }
        }

        ConfigParse { config, errors }
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if self.default_row_height == 0 {
            errors.push(ConfigError::new("default_row_height", "0", "must be >= 1"));
        }
        if self.default_column_width == 0 {
            errors.push(ConfigError::new("default_column_width", "0", "must be >= 1"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[inline]
fn parse_positive(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|v| *v > 0)
}
