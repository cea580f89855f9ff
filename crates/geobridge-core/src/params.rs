//! Decoding of loosely typed parameter values.
//!
//! Hosts hand matrix and list parameters over in whatever shape their
//! forms produced: nested one-row matrices, flat sequences or
//! comma-separated strings. These decoders turn them into strict types or
//! fail with a validation error naming what was received.

use std::collections::HashSet;
use std::fmt;

use geobridge_core_common::FieldValue;
use log::info;
use serde_json::Value;

use crate::error::{Result, ValidationError};
use crate::table::GeoTable;

/// Axis-aligned extent with `minx < maxx` and `miny < maxy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl BoundingBox {
    /// Create a bounding box, rejecting empty or inverted extents.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidBoundingBox`] unless `minx < maxx`
    /// and `miny < maxy`.
    pub fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Result<Self> {
        let bbox = Self {
            minx,
            miny,
            maxx,
            maxy,
        };
        // Written so that NaN bounds fail too.
        if minx < maxx && miny < maxy {
            Ok(bbox)
        } else {
            Err(ValidationError::InvalidBoundingBox {
                bbox: bbox.to_string(),
            }
            .into())
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }

    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.minx && x <= self.maxx && y >= self.miny && y <= self.maxy
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.minx, self.miny, self.maxx, self.maxy
        )
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn bbox_shape(shape: impl Into<String>) -> ValidationError {
    ValidationError::BoundingBoxShape {
        shape: shape.into(),
    }
}

fn parse_number_text(text: &str) -> Result<Option<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| bbox_shape(format!("string with non-numeric entry '{text}'")).into())
}

fn numbers_from_sequence(items: &[Value]) -> Result<Vec<f64>> {
    let mut numbers = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Number(n) => {
                numbers.push(n.as_f64().ok_or_else(|| bbox_shape("non-finite number"))?);
            },
            Value::String(text) => numbers.extend(parse_number_text(text)?),
            other => {
                return Err(bbox_shape(format!("sequence containing {}", shape_name(other))).into());
            },
        }
    }
    Ok(numbers)
}

/// Decode a bounding box from a host matrix parameter.
///
/// Accepted shapes, in order: a nested one-row matrix
/// (`[[minx, miny, maxx, maxy]]`), a flat sequence of four numbers, or a
/// comma-separated string. Numeric strings inside sequences are accepted.
///
/// # Errors
///
/// - [`ValidationError::EnumPassedAsMatrix`] for a plain integer, the usual
///   sign of a choice index passed instead of a matrix
/// - [`ValidationError::NotEnoughNumbers`] for fewer than four numbers
/// - [`ValidationError::BoundingBoxShape`] for any other shape, including more
///   than four numbers or a multi-row matrix
/// - [`ValidationError::InvalidBoundingBox`] when `minx >= maxx` or `miny >= maxy`
pub fn decode_bbox(value: &Value) -> Result<BoundingBox> {
    let numbers = match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => {
            return Err(ValidationError::EnumPassedAsMatrix {
                value: n.to_string(),
            }
            .into());
        },
        Value::String(text) => text
            .split(',')
            .map(parse_number_text)
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect(),
        Value::Array(rows) if !rows.is_empty() && rows.iter().all(Value::is_array) => {
            match rows.as_slice() {
                [Value::Array(row)] => numbers_from_sequence(row)?,
                _ => return Err(bbox_shape(format!("{}-row matrix", rows.len())).into()),
            }
        },
        Value::Array(items) => numbers_from_sequence(items)?,
        other => return Err(bbox_shape(shape_name(other)).into()),
    };

    match numbers.len() {
        n if n < 4 => Err(ValidationError::NotEnoughNumbers { found: n }.into()),
        4 => BoundingBox::new(numbers[0], numbers[1], numbers[2], numbers[3]),
        n => Err(bbox_shape(format!("sequence of {n} numbers")).into()),
    }
}

fn collect_names(value: &Value, out: &mut Vec<String>) -> Result<()> {
    match value {
        Value::Null => {},
        Value::String(text) => out.extend(text.split(',').map(str::to_owned)),
        Value::Number(n) => out.push(n.to_string()),
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(text) => out.push(text.clone()),
                    Value::Bool(_) | Value::Object(_) => {
                        return Err(ValidationError::ListShape {
                            shape: format!("sequence containing {}", shape_name(item)),
                        }
                        .into());
                    },
                    nested => collect_names(nested, out)?,
                }
            }
        },
        Value::Bool(_) | Value::Object(_) => {
            return Err(ValidationError::ListShape {
                shape: shape_name(value).to_string(),
            }
            .into());
        },
    }
    Ok(())
}

/// Decode an ordered list of names (stratigraphic column, ignore list).
///
/// Matrices are flattened row by row, and a string is split on commas.
/// Entries are trimmed and blanks are dropped. Duplicates are matched
/// ignoring case, and the first spelling seen is kept in place.
///
/// # Errors
///
/// Returns [`ValidationError::ListShape`] for booleans and objects.
pub fn decode_ordered_list(value: &Value) -> Result<Vec<String>> {
    let mut raw = Vec::new();
    collect_names(value, &mut raw)?;

    let mut seen = HashSet::new();
    Ok(raw
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect())
}

/// Build a stratigraphic column table from ordered unit names.
///
/// The table has an `order` column (1-based) and a `unit_name` column.
/// Blank names are skipped without consuming an order number.
///
/// # Errors
///
/// Propagates table construction errors.
pub fn stratigraphic_column_table<S: AsRef<str>>(units: &[S]) -> Result<GeoTable> {
    let names: Vec<&str> = units
        .iter()
        .map(|unit| unit.as_ref().trim())
        .filter(|unit| !unit.is_empty())
        .collect();
    info!("building stratigraphic column with {} units", names.len());

    let order: Vec<FieldValue> = (1_i64..)
        .take(names.len())
        .map(FieldValue::Integer)
        .collect();
    let unit_names: Vec<FieldValue> = names.into_iter().map(FieldValue::from).collect();
    GeoTable::from_columns([("order", order), ("unit_name", unit_names)], None)
}
