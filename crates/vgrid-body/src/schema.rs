#![forbid(unsafe_code)]

//! Column schemas: type detection, sort comparators, and text transforms.
//!
//! A [`SchemaDetector`] describes one column type. The grid keeps an ordered
//! table of them; lookups walk the table and the first matching rule wins.
//! Comparators are a closed enum so sorting never dispatches through
//! user closures.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::sorting::SortDirection;

/// Built-in type names.
pub const TYPE_BOOLEAN: &str = "boolean";
pub const TYPE_CURRENCY: &str = "currency";
pub const TYPE_DATETIME: &str = "datetime";
pub const TYPE_NUMERIC: &str = "numeric";
pub const TYPE_JSON: &str = "json";

/// Minimum mean score for a detector to claim a column.
const DETECTION_THRESHOLD: f64 = 0.5;

/// Text case applied to a column's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextTransform {
    Uppercase,
    Lowercase,
    Capitalize,
}

impl TextTransform {
    /// Class-name suffix used by the cell styling layer.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uppercase => "uppercase",
            Self::Lowercase => "lowercase",
            Self::Capitalize => "capitalize",
        }
    }
}

/// How values of a column type are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Comparator {
    /// Lexical string ordering.
    #[default]
    Default,
    /// Parse as `f64`.
    Numeric,
    /// Strip currency symbols and separators, then numeric.
    Currency,
    /// `false` before `true`.
    Boolean,
    /// Normalised ISO-8601 ordering.
    Datetime,
}

impl Comparator {
    /// Compare two cell values in the given direction.
    ///
    /// Missing values compare as the empty string. Values the comparator
    /// cannot interpret sort after every value it can, and among
    /// themselves in lexical order.
    #[must_use]
    pub fn compare(self, a: Option<&str>, b: Option<&str>, direction: SortDirection) -> Ordering {
        let a = a.unwrap_or("");
        let b = b.unwrap_or("");
        let ord = match self {
            Self::Default => a.cmp(b),
            Self::Numeric => compare_parsed(a, b, parse_number),
            Self::Currency => compare_parsed(a, b, parse_currency),
            Self::Boolean => compare_parsed(a, b, parse_bool),
            Self::Datetime => compare_parsed(a, b, normalize_datetime),
        };
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// Parsed values first, in value order; unparsable values after them.
fn compare_parsed<T: PartialOrd>(a: &str, b: &str, parse: fn(&str) -> Option<T>) -> Ordering {
    match (parse(a), parse(b)) {
        // Parsers only yield comparable values (no NaN).
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_currency(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    parse_number(&cleaned)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// `YYYY-MM-DD[ T]HH:MM[:SS]...` with the separator normalised to `T`.
fn normalize_datetime(value: &str) -> Option<String> {
    let value = value.trim();
    let bytes = value.as_bytes();
    if bytes.len() < 10 {
        return None;
    }
    let date_ok = bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit);
    if !date_ok {
        return None;
    }
    let mut normalized = value[..10].to_string();
    if bytes.len() > 10 {
        if bytes[10] != b'T' && bytes[10] != b' ' {
            return None;
        }
        normalized.push('T');
        normalized.push_str(&value[11..]);
    }
    Some(normalized)
}

/// Score in `[0, 1]` for how well a value fits a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueScorer {
    Boolean,
    Currency,
    Datetime,
    Numeric,
    Json,
}

impl ValueScorer {
    #[must_use]
    pub fn score(self, value: &str) -> f64 {
        let value = value.trim();
        let matched = match self {
            Self::Boolean => parse_bool(value).is_some(),
            Self::Numeric => parse_number(value).is_some(),
            Self::Currency => {
                value.starts_with(['$', '€', '£', '¥']) && parse_currency(value).is_some()
            }
            Self::Datetime => normalize_datetime(value).is_some(),
            Self::Json => {
                (value.starts_with('{') || value.starts_with('['))
                    && serde_json::from_str::<serde_json::Value>(value).is_ok()
            }
        };
        if matched { 1.0 } else { 0.0 }
    }
}

/// One entry in the schema detector table.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDetector {
    /// Type name matched against column ids and explicit schemas.
    pub type_name: String,
    /// Scorer used by [`Schema::detect`]; `None` never auto-detects.
    pub scorer: Option<ValueScorer>,
    /// Comparator for in-memory sorting.
    pub comparator: Option<Comparator>,
    /// Text transform applied to cells of this type.
    pub text_transform: Option<TextTransform>,
}

impl SchemaDetector {
    /// A detector with only a type name.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            scorer: None,
            comparator: None,
            text_transform: None,
        }
    }

    #[must_use]
    pub fn with_scorer(mut self, scorer: ValueScorer) -> Self {
        self.scorer = Some(scorer);
        self
    }

    #[must_use]
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = Some(comparator);
        self
    }

    #[must_use]
    pub fn with_text_transform(mut self, transform: TextTransform) -> Self {
        self.text_transform = Some(transform);
        self
    }
}

/// The built-in detector table.
#[must_use]
pub fn default_detectors() -> Vec<SchemaDetector> {
    vec![
        SchemaDetector::new(TYPE_BOOLEAN)
            .with_scorer(ValueScorer::Boolean)
            .with_comparator(Comparator::Boolean)
            .with_text_transform(TextTransform::Capitalize),
        SchemaDetector::new(TYPE_CURRENCY)
            .with_scorer(ValueScorer::Currency)
            .with_comparator(Comparator::Currency),
        SchemaDetector::new(TYPE_DATETIME)
            .with_scorer(ValueScorer::Datetime)
            .with_comparator(Comparator::Datetime),
        SchemaDetector::new(TYPE_NUMERIC)
            .with_scorer(ValueScorer::Numeric)
            .with_comparator(Comparator::Numeric),
        SchemaDetector::new(TYPE_JSON).with_scorer(ValueScorer::Json),
    ]
}

/// First detector matching a column: by explicit schema name if the column
/// has one, otherwise by column id.
#[must_use]
pub fn match_detector<'a>(
    detectors: &'a [SchemaDetector],
    column_id: &str,
    explicit_schema: Option<&str>,
) -> Option<&'a SchemaDetector> {
    let key = explicit_schema.unwrap_or(column_id);
    detectors.iter().find(|d| d.type_name == key)
}

/// Resolved type of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub column_type: String,
}

/// Column id → resolved column type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: HashMap<String, ColumnSchema>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a column type, replacing any previous one.
    pub fn insert(&mut self, column_id: impl Into<String>, column_type: impl Into<String>) {
        self.columns.insert(
            column_id.into(),
            ColumnSchema {
                column_type: column_type.into(),
            },
        );
    }

    #[must_use]
    pub fn with(mut self, column_id: impl Into<String>, column_type: impl Into<String>) -> Self {
        self.insert(column_id, column_type);
        self
    }

    /// Type of a column, if known.
    #[must_use]
    pub fn column_type(&self, column_id: &str) -> Option<&str> {
        self.columns.get(column_id).map(|c| c.column_type.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Comparator for sorting by `column_id`.
    ///
    /// Columns absent from the schema, or whose type has no comparator,
    /// use [`Comparator::Default`].
    #[must_use]
    pub fn comparator_for(&self, column_id: &str, detectors: &[SchemaDetector]) -> Comparator {
        self.column_type(column_id)
            .and_then(|ty| {
                detectors
                    .iter()
                    .filter(|d| d.type_name == ty)
                    .find_map(|d| d.comparator)
            })
            .unwrap_or_default()
    }

    /// Infer column types from sample values.
    ///
    /// `explicit` pins a column's type regardless of its values. For other
    /// columns the detector with the highest mean score wins if that mean
    /// exceeds one half; ties go to the earlier detector. Empty values are
    /// ignored.
    pub fn detect<'v, I>(
        columns: &[(&str, Option<&str>)],
        rows: I,
        detectors: &[SchemaDetector],
    ) -> Self
    where
        I: IntoIterator<Item = &'v HashMap<String, String>>,
    {
        let mut schema = Self::new();
        let mut totals: HashMap<&str, (Vec<f64>, usize)> = HashMap::new();
        for (id, explicit) in columns {
            match explicit {
                Some(ty) => schema.insert(*id, *ty),
                None => {
                    totals.insert(*id, (vec![0.0; detectors.len()], 0));
                }
            }
        }
        if totals.is_empty() {
            return schema;
        }

        for row in rows {
            for (id, (scores, count)) in totals.iter_mut() {
                let Some(value) = row.get(*id).filter(|v| !v.trim().is_empty()) else {
                    continue;
                };
                *count += 1;
                for (slot, detector) in scores.iter_mut().zip(detectors) {
                    if let Some(scorer) = detector.scorer {
                        *slot += scorer.score(value);
                    }
                }
            }
        }

        for (id, (scores, count)) in totals {
            if count == 0 {
                continue;
            }
            let mut best: Option<(usize, f64)> = None;
            for (i, total) in scores.iter().enumerate() {
                let mean = total / count as f64;
                if mean > DETECTION_THRESHOLD && best.is_none_or(|(_, b)| mean > b) {
                    best = Some((i, mean));
                }
            }
            if let Some((i, _)) = best {
                schema.insert(id, detectors[i].type_name.clone());
            }
        }
        schema
    }
}
