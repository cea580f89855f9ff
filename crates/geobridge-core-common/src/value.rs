//! Tagged attribute values and field schemas.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Logical type of an attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Integer,
    Float,
    Boolean,
    DateTime,
    Text,
}

impl LogicalType {
    /// Human-readable label used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Text => "Text",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single attribute cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Text(String),
}

// 2^63 as f64; every finite float strictly below it (and >= -2^63) fits in i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl FieldValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The logical type carried by the value, `None` for nulls.
    #[must_use]
    pub fn logical_type(&self) -> Option<LogicalType> {
        match self {
            Self::Null => None,
            Self::Integer(_) => Some(LogicalType::Integer),
            Self::Float(_) => Some(LogicalType::Float),
            Self::Boolean(_) => Some(LogicalType::Boolean),
            Self::DateTime(_) => Some(LogicalType::DateTime),
            Self::Text(_) => Some(LogicalType::Text),
        }
    }

    /// Numeric view of integer and float values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numeric view that also accepts numeric text such as `" 12.5 "`.
    #[must_use]
    pub fn parse_f64(&self) -> Option<f64> {
        match self {
            Self::Text(text) => text.trim().parse::<f64>().ok(),
            other => other.as_f64(),
        }
    }

    /// Integer view of values without a fractional part.
    ///
    /// Floats qualify when they are finite, have no fractional part and fit in
    /// the signed 64-bit range.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_integral(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Float(f)
                if f.is_finite() && f.fract() == 0.0 && *f >= -I64_BOUND && *f < I64_BOUND =>
            {
                Some(*f as i64)
            },
            _ => None,
        }
    }

    /// Date-time view of date-time values and timestamp-like text.
    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            Self::Text(text) => parse_timestamp(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Convert the value to the given logical type.
    ///
    /// Nulls stay null. Returns `None` when the value cannot be represented in
    /// the target type (for example `"abc"` as Integer or `2.5` as Integer).
    #[must_use]
    pub fn coerce(&self, target: LogicalType) -> Option<FieldValue> {
        if self.is_null() {
            return Some(Self::Null);
        }
        match target {
            LogicalType::Integer => self.as_integral().map(Self::Integer).or_else(|| match self {
                Self::Boolean(b) => Some(Self::Integer(i64::from(*b))),
                Self::Text(text) => text.trim().parse::<i64>().ok().map(Self::Integer),
                _ => None,
            }),
            LogicalType::Float => self.parse_f64().map(Self::Float),
            LogicalType::Boolean => match self {
                Self::Boolean(b) => Some(Self::Boolean(*b)),
                Self::Integer(0) => Some(Self::Boolean(false)),
                Self::Integer(1) => Some(Self::Boolean(true)),
                Self::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(Self::Boolean(true)),
                    "false" => Some(Self::Boolean(false)),
                    _ => None,
                },
                _ => None,
            },
            LogicalType::DateTime => self.as_datetime().map(Self::DateTime),
            LogicalType::Text => Some(Self::Text(self.to_string())),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Parse timestamp-like text.
///
/// Accepts RFC 3339 (converted to UTC), `YYYY-MM-DD[ T]HH:MM:SS[.fff]`,
/// `YYYY/MM/DD HH:MM:SS` and bare `YYYY-MM-DD` dates (at midnight).
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// One `(name, logical type)` entry of a [`FieldSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub logical_type: LogicalType,
}

/// Ordered attribute schema.
///
/// Column order is fixed at construction and defines the order in which
/// attributes are written to a destination sink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    fields: Vec<FieldDef>,
}

impl FieldSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. A field with an existing name replaces its type in place.
    pub fn push(&mut self, name: impl Into<String>, logical_type: LogicalType) {
        let name = name.into();
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == name) {
            existing.logical_type = logical_type;
        } else {
            self.fields.push(FieldDef { name, logical_type });
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, logical_type: LogicalType) -> Self {
        self.push(name, logical_type);
        self
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<LogicalType> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.logical_type)
    }
}

impl<S: Into<String>> FromIterator<(S, LogicalType)> for FieldSchema {
    fn from_iter<I: IntoIterator<Item = (S, LogicalType)>>(iter: I) -> Self {
        let mut schema = Self::new();
        for (name, logical_type) in iter {
            schema.push(name, logical_type);
        }
        schema
    }
}
