use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing ASCII grids.
#[derive(Debug, Error)]
pub enum GridError {
    /// Failed to read or write a grid file
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The grid text is malformed
    #[error("Failed to parse ASCII grid at line {line}: {message}")]
    Parse {
        /// Line number (1-based) where parsing failed
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// The grid dimensions do not match the cell values
    #[error("Invalid grid: {message}")]
    Invalid {
        /// Description of the inconsistency
        message: String,
    },
}

impl GridError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type alias that uses [`GridError`].
pub type GridResult<T> = Result<T, GridError>;
