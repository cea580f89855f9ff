//! Per-record diagnostics shared by the geometry codec and the converters.
//!
//! Conversions never abort on a single dirty record. Instead every skipped
//! feature, row or sample is described by a [`RecordError`] whose
//! [`RecordPosition`] is precise enough to find the offending source data.

use std::error::Error as StdError;
use std::fmt;

/// Location of a record inside a feature collection or table.
///
/// Row indices are 1-based to align with what users see in attribute tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPosition {
    /// Host feature identifier, when the source exposes one
    pub feature_id: Option<i64>,
    /// Row number in the table being read or written (1-based)
    pub row: Option<u64>,
    /// Column (field) name involved in the failure
    pub column: Option<String>,
    /// Vertex number inside the geometry (1-based)
    pub vertex: Option<u64>,
}

impl RecordPosition {
    /// Position of a host feature.
    #[must_use]
    pub fn feature(feature_id: Option<i64>, row: u64) -> Self {
        Self {
            feature_id,
            row: Some(row),
            ..Self::default()
        }
    }

    /// Position of a table row.
    #[must_use]
    pub fn row(row: u64) -> Self {
        Self {
            row: Some(row),
            ..Self::default()
        }
    }

    /// Returns the same position narrowed to a column.
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Returns the same position narrowed to a vertex.
    #[must_use]
    pub fn with_vertex(mut self, vertex: u64) -> Self {
        self.vertex = Some(vertex);
        self
    }

    /// Returns true when the position does not contain any location metadata.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feature_id.is_none()
            && self.row.is_none()
            && self.column.is_none()
            && self.vertex.is_none()
    }
}

impl fmt::Display for RecordPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(fid) = self.feature_id {
            parts.push(format!("feature {fid}"));
        }
        if let Some(row) = self.row {
            parts.push(format!("row {row}"));
        }
        if let Some(column) = &self.column {
            parts.push(format!("column '{column}'"));
        }
        if let Some(vertex) = self.vertex {
            parts.push(format!("vertex {vertex}"));
        }

        if parts.is_empty() {
            write!(f, "unknown position")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// A recoverable problem with one record.
///
/// The record is dropped from the output (or, for samples, replaced by the
/// no-data sentinel) and the conversion carries on.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    /// Geometry could not be decoded, encoded or matched to the destination type.
    Geometry {
        /// Human readable description of the failure.
        message: String,
        /// Where the failure occurred.
        position: Option<RecordPosition>,
        /// Optional context describing the operation.
        context: Option<String>,
    },
    /// An attribute value could not be read or coerced.
    Attribute {
        /// Human readable description of the failure.
        message: String,
        /// Where the failure occurred.
        position: Option<RecordPosition>,
        /// Optional context describing the operation.
        context: Option<String>,
    },
    /// A raster sample fell back to the no-data sentinel.
    Sample {
        /// Human readable description of the failure.
        message: String,
        /// Where the failure occurred.
        position: Option<RecordPosition>,
        /// Optional context describing the operation.
        context: Option<String>,
    },
    /// The destination sink rejected a feature.
    Sink {
        /// Human readable description of the failure.
        message: String,
        /// Where the failure occurred.
        position: Option<RecordPosition>,
    },
    /// Other error type not classified above.
    Other {
        /// Human readable description of the failure.
        message: String,
    },
}

impl RecordError {
    /// Geometry failure at a position.
    pub fn geometry(message: impl Into<String>, position: RecordPosition) -> Self {
        Self::Geometry {
            message: message.into(),
            position: Some(position),
            context: None,
        }
    }

    /// Attribute failure at a position.
    pub fn attribute(message: impl Into<String>, position: RecordPosition) -> Self {
        Self::Attribute {
            message: message.into(),
            position: Some(position),
            context: None,
        }
    }

    /// Sampling failure at a position.
    pub fn sample(message: impl Into<String>, position: RecordPosition) -> Self {
        Self::Sample {
            message: message.into(),
            position: Some(position),
            context: None,
        }
    }

    /// Sink rejection at a position.
    pub fn sink(message: impl Into<String>, position: RecordPosition) -> Self {
        Self::Sink {
            message: message.into(),
            position: Some(position),
        }
    }

    /// The position attached to the error, if any.
    #[must_use]
    pub fn position(&self) -> Option<&RecordPosition> {
        match self {
            Self::Geometry { position, .. }
            | Self::Attribute { position, .. }
            | Self::Sample { position, .. }
            | Self::Sink { position, .. } => position.as_ref(),
            Self::Other { .. } => None,
        }
    }

    /// Replace the position of the error, returning the updated error.
    ///
    /// Codec errors are raised without knowing which feature they belong to;
    /// the converter attaches the position afterwards.
    #[must_use]
    pub fn at(mut self, new_position: RecordPosition) -> Self {
        match &mut self {
            Self::Geometry { position, .. }
            | Self::Attribute { position, .. }
            | Self::Sample { position, .. }
            | Self::Sink { position, .. } => *position = Some(new_position),
            Self::Other { .. } => {},
        }
        self
    }

    fn fmt_context(context: Option<&str>) -> String {
        context.map(|c| format!(" while {c}")).unwrap_or_default()
    }

    fn fmt_position(position: Option<&RecordPosition>) -> String {
        position.map(|pos| format!(" at {pos}")).unwrap_or_default()
    }

    /// Attach additional context to the error, returning the updated error.
    #[must_use]
    pub fn with_additional_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        match &mut self {
            Self::Geometry {
                context: existing, ..
            }
            | Self::Attribute {
                context: existing, ..
            }
            | Self::Sample {
                context: existing, ..
            } => match existing {
                Some(existing) if !existing.is_empty() => {
                    existing.push_str("; ");
                    existing.push_str(&context);
                },
                _ => *existing = Some(context),
            },
            Self::Sink { message, .. } | Self::Other { message } => {
                message.push_str(" (");
                message.push_str(&context);
                message.push(')');
            },
        }
        self
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geometry {
                message,
                position,
                context,
            } => write!(
                f,
                "Geometry error{}{}: {message}",
                Self::fmt_context(context.as_deref()),
                Self::fmt_position(position.as_ref())
            ),
            Self::Attribute {
                message,
                position,
                context,
            } => write!(
                f,
                "Attribute error{}{}: {message}",
                Self::fmt_context(context.as_deref()),
                Self::fmt_position(position.as_ref())
            ),
            Self::Sample {
                message,
                position,
                context,
            } => write!(
                f,
                "Sample error{}{}: {message}",
                Self::fmt_context(context.as_deref()),
                Self::fmt_position(position.as_ref())
            ),
            Self::Sink { message, position } => write!(
                f,
                "Sink rejected feature{}: {message}",
                Self::fmt_position(position.as_ref())
            ),
            Self::Other { message } => f.write_str(message),
        }
    }
}

impl StdError for RecordError {}

/// Result type alias that uses [`RecordError`].
pub type RecordResult<T> = Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_record_position() {
        let pos = RecordPosition::feature(Some(42), 3).with_column("unitname");

        assert_eq!(pos.to_string(), "feature 42, row 3, column 'unitname'");
    }

    #[test]
    fn empty_position_displays_unknown() {
        let pos = RecordPosition::default();
        assert!(pos.is_empty());
        assert_eq!(pos.to_string(), "unknown position");
    }

    #[test]
    fn display_geometry_error_with_context() {
        let error = RecordError::geometry("ring is not closed", RecordPosition::row(7))
            .with_additional_context("writing contacts layer");

        assert_eq!(
            error.to_string(),
            "Geometry error while writing contacts layer at row 7: ring is not closed"
        );
    }

    #[test]
    fn context_accumulates() {
        let error = RecordError::sample("transform failed", RecordPosition::row(1).with_vertex(2))
            .with_additional_context("sampling DTM")
            .with_additional_context("faults layer");

        assert_eq!(
            error.to_string(),
            "Sample error while sampling DTM; faults layer at row 1, vertex 2: transform failed"
        );
    }

    #[test]
    fn at_replaces_position() {
        let error = RecordError::Geometry {
            message: "bad".to_string(),
            position: None,
            context: None,
        }
        .at(RecordPosition::feature(Some(9), 1));

        assert_eq!(error.position().and_then(|p| p.feature_id), Some(9));
    }
}
