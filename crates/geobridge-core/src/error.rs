//! Custom error types for `GeoBridge` conversions.
//!
//! Operation-level failures are reported through [`GeoBridgeError`] and abort
//! the call. Problems with a single record never surface here; they are
//! collected as [`geobridge_shared::RecordError`] diagnostics on the
//! conversion outcome instead.

use geobridge_wkb::CodecError;
use thiserror::Error;

/// Main error type for `GeoBridge` operations.
///
/// This is the root error type that encompasses all domain-specific errors.
/// It uses `#[error(transparent)]` to delegate display formatting to the
/// underlying error variants.
#[derive(Debug, Error)]
pub enum GeoBridgeError {
    /// Malformed inputs (parameter shapes, missing fields, bad bounding boxes)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Host resources that could not be created or used
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Geometry codec errors surfaced at operation level
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Arrow record batch construction or decoding errors
    #[error(transparent)]
    Arrow(#[from] arrow_schema::ArrowError),

    /// Generic errors from host collaborators
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Input validation errors.
///
/// These fail the whole operation immediately; inputs are never silently
/// corrected.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A plain integer was supplied where a matrix was expected
    #[error("Bounding box got the integer {value} (enum passed as matrix); expected 4 numbers")]
    EnumPassedAsMatrix {
        /// The integer that was received
        value: String,
    },

    /// Fewer than four numbers were found
    #[error("Bounding box parsing failed: need 4 numbers (minx, miny, maxx, maxy), found {found}")]
    NotEnoughNumbers {
        /// How many numeric values were found
        found: usize,
    },

    /// The value has a shape that cannot hold a bounding box
    #[error("Bounding box parsing failed: unsupported value shape {shape}")]
    BoundingBoxShape {
        /// Description of the received shape (e.g. "object", "2x2 matrix")
        shape: String,
    },

    /// Bounds are not strictly increasing
    #[error("Invalid bounding box {bbox}: minx must be < maxx and miny must be < maxy")]
    InvalidBoundingBox {
        /// The offending box, formatted as `[minx, miny, maxx, maxy]`
        bbox: String,
    },

    /// The value has a shape that cannot hold a list of names
    #[error("Ordered list parsing failed: unsupported value shape {shape}")]
    ListShape {
        /// Description of the received shape
        shape: String,
    },

    /// Required fields are missing from an input table
    #[error("{context} missing required field(s): {fields}")]
    MissingFields {
        /// What the table holds, e.g. "Orientation data"
        context: String,
        /// Comma-separated missing field names
        fields: String,
    },

    /// A named column does not exist
    #[error("Column '{column}' not found. Available columns: {available}")]
    ColumnNotFound {
        /// The requested column
        column: String,
        /// Comma-separated list of available columns
        available: String,
    },

    /// A column with that name already exists
    #[error("Column '{column}' already exists")]
    DuplicateColumn {
        /// The duplicated column name
        column: String,
    },

    /// A column does not have one value per row
    #[error("Column '{column}' has {found} values, expected {expected}")]
    ColumnLength {
        /// The column name
        column: String,
        /// Number of rows in the table
        expected: usize,
        /// Number of values in the column
        found: usize,
    },

    /// An Arrow column cannot be mapped onto a logical type
    #[error("Column '{column}' has unsupported Arrow type {data_type}")]
    UnsupportedColumnType {
        /// The column name
        column: String,
        /// The Arrow data type, formatted
        data_type: String,
    },
}

/// Host resource errors.
///
/// These are fatal for the operation that hit them.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The host could not create the destination sink
    #[error("Failed to create destination layer: {message}")]
    SinkCreation {
        /// Cause reported by the host
        message: String,
    },

    /// The host could not finalise the destination sink
    #[error("Failed to finalise destination layer: {message}")]
    SinkFinish {
        /// Cause reported by the host
        message: String,
    },

    /// A non-random-access raster could not be copied locally
    #[error("Failed to materialize raster '{source_id}' locally: {message}")]
    RasterMaterialization {
        /// The raster's source handle
        source_id: String,
        /// Description of the failure
        message: String,
    },
}

/// Configuration errors.
///
/// These errors occur when options or configuration are invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },

    /// Required option is missing
    #[error("Missing required option: {option}")]
    MissingRequired {
        /// The missing option name
        option: String,
    },
}

/// Type alias for Results using `GeoBridgeError`.
pub type Result<T> = std::result::Result<T, GeoBridgeError>;

impl GeoBridgeError {
    /// Get a user-friendly error message.
    ///
    /// This formats the error in a way that's helpful for end users,
    /// including context and actionable information.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.user_message(),
            Self::Resource(e) => e.to_string(),
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Codec(e) => format!("Geometry error: {e}"),
            Self::Arrow(e) => format!("Table error: {e}"),
            Self::Other(e) => format!("Error: {e}"),
        }
    }

    /// Get recovery suggestions if available.
    ///
    /// Returns helpful suggestions on how to fix or work around the error.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Validation(e) => e.recovery_suggestion(),
            Self::Resource(e) => e.recovery_suggestion(),
            _ => None,
        }
    }

    /// Check if this error is potentially recoverable.
    ///
    /// Recoverable errors might be fixed by retrying with different
    /// parameters or after the user takes some action.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Validation(_))
    }
}

impl ValidationError {
    fn user_message(&self) -> String {
        match self {
            Self::ColumnNotFound { column, available } => {
                format!(
                    "Column '{column}' not found.\n\nAvailable columns:\n{}",
                    available
                        .split(", ")
                        .map(|c| format!("  - {c}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                )
            },
            _ => self.to_string(),
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::EnumPassedAsMatrix { .. } => Some(
                "Pass the bounding box as [minx, miny, maxx, maxy] rather than a choice index."
                    .to_string(),
            ),
            Self::NotEnoughNumbers { .. } | Self::BoundingBoxShape { .. } => Some(
                "Provide four numbers as a one-row matrix, a list or a comma-separated string."
                    .to_string(),
            ),
            Self::InvalidBoundingBox { .. } => {
                Some("Check that the minimum coordinates come before the maximums.".to_string())
            },
            Self::MissingFields { .. } | Self::ColumnNotFound { .. } => {
                Some("Check the field mapping of the input layer.".to_string())
            },
            _ => None,
        }
    }
}

impl ResourceError {
    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::RasterMaterialization { .. } => Some(
                "Check that the raster is reachable, or provide a local copy of the DTM."
                    .to_string(),
            ),
            Self::SinkCreation { .. } | Self::SinkFinish { .. } => {
                Some("Check that the destination is writable.".to_string())
            },
        }
    }
}

/// Helper to create [`ValidationError::ColumnNotFound`] listing the available columns.
#[must_use]
pub fn column_not_found<S: AsRef<str>>(column: &str, available: &[S]) -> ValidationError {
    ValidationError::ColumnNotFound {
        column: column.to_string(),
        available: available
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_recoverable() {
        let err: GeoBridgeError = ValidationError::NotEnoughNumbers { found: 3 }.into();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("need 4 numbers"));
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn resource_errors_are_fatal() {
        let err: GeoBridgeError = ResourceError::SinkCreation {
            message: "disk full".to_string(),
        }
        .into();
        assert!(!err.is_recoverable());
        assert_eq!(
            err.user_message(),
            "Failed to create destination layer: disk full"
        );
    }

    #[test]
    fn missing_fields_message() {
        let err = ValidationError::MissingFields {
            context: "Orientation data".to_string(),
            fields: "DIP, DIPDIR".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Orientation data missing required field(s): DIP, DIPDIR"
        );
    }

    #[test]
    fn column_not_found_lists_columns() {
        let err = GeoBridgeError::from(column_not_found("X", &["a", "b"]));
        let message = err.user_message();
        assert!(message.contains("  - a\n  - b"));
    }

    #[test]
    fn other_errors_wrap_anyhow() {
        let err: GeoBridgeError = anyhow::anyhow!("host failure").into();
        assert_eq!(err.user_message(), "Error: host failure");
    }
}
