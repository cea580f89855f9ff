//! Codec errors.

use geobridge_shared::{RecordError, RecordPosition};
use thiserror::Error;

/// Errors raised while encoding or decoding a single geometry.
///
/// These are always per-record: converters turn them into a
/// [`RecordError`] and skip the offending feature.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// The geometry is structurally invalid for the requested encoding
    #[error("Malformed geometry: {message}")]
    Malformed {
        /// Description of the structural problem
        message: String,
    },

    /// The WKB writer failed
    #[error("WKB encoding failed: {message}")]
    WkbEncode {
        /// Writer error message
        message: String,
    },

    /// The WKT writer failed
    #[error("WKT encoding failed: {message}")]
    WktEncode {
        /// Writer error message
        message: String,
    },

    /// Binary or text input could not be decoded
    #[error("Failed to decode {format}: {message}")]
    Decode {
        /// "WKB" or "WKT"
        format: &'static str,
        /// Reader error message
        message: String,
    },

    /// The input is valid but outside the point/line/polygon families
    #[error("Unsupported geometry type: {geometry_type}")]
    Unsupported {
        /// The unsupported geometry type
        geometry_type: String,
    },

    /// Both the WKB and the WKT stage failed
    #[error("Geometry could not be encoded as WKB ({wkb}) nor as WKT ({wkt})")]
    Unencodable {
        /// Failure of the WKB stage
        wkb: Box<CodecError>,
        /// Failure of the WKT stage
        wkt: Box<CodecError>,
    },
}

impl CodecError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Convert into a per-record diagnostic at `position`.
    #[must_use]
    pub fn into_record_error(self, position: RecordPosition) -> RecordError {
        RecordError::geometry(self.to_string(), position)
    }
}

impl From<CodecError> for RecordError {
    fn from(err: CodecError) -> Self {
        RecordError::Geometry {
            message: err.to_string(),
            position: None,
            context: None,
        }
    }
}

/// Result type alias that uses [`CodecError`].
pub type CodecResult<T> = Result<T, CodecError>;
