//! Conversion options and host-supplied model parameters.
//!
//! Settings a host used to persist between runs (last bounding box, last
//! stratigraphic column) arrive here as ordinary inputs.

use serde_json::Value;

use crate::error::{ConfigError, Result};
use crate::params::{BoundingBox, decode_bbox, decode_ordered_list};
use crate::table::DEFAULT_GEOMETRY_COLUMN;

/// Options shared by the layer ↔ table converters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Name of the table's geometry column
    pub geometry_column: String,
    /// Report progress every this many rows
    pub progress_interval: usize,
    /// Column carrying host feature ids, if any
    pub fid_column: Option<String>,
    /// Attribute subset, in output order; `None` keeps every attribute
    pub attributes: Option<Vec<String>>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            geometry_column: DEFAULT_GEOMETRY_COLUMN.to_string(),
            progress_interval: 1,
            fid_column: None,
            attributes: None,
        }
    }
}

impl ConversionOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_geometry_column(mut self, name: impl Into<String>) -> Self {
        self.geometry_column = name.into();
        self
    }

    #[must_use]
    pub fn with_progress_interval(mut self, rows: usize) -> Self {
        self.progress_interval = rows;
        self
    }

    /// Carry feature ids through a column with this name.
    #[must_use]
    pub fn with_fid_column(mut self, name: impl Into<String>) -> Self {
        self.fid_column = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_attributes<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.attributes = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Check the options before a conversion starts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for a zero progress interval, a
    /// blank geometry column name or a fid column that shadows the geometry
    /// column.
    pub fn validate(&self) -> Result<()> {
        if self.progress_interval == 0 {
            return Err(ConfigError::InvalidOption {
                option: "progress_interval".to_string(),
                message: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.geometry_column.trim().is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "geometry_column".to_string(),
                message: "must not be blank".to_string(),
            }
            .into());
        }
        if self.fid_column.as_deref() == Some(self.geometry_column.as_str()) {
            return Err(ConfigError::InvalidOption {
                option: "fid_column".to_string(),
                message: format!("'{}' is the geometry column", self.geometry_column),
            }
            .into());
        }
        Ok(())
    }
}

/// Coordinate columns of a non-geometric point table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointColumns {
    pub x: String,
    pub y: String,
    pub z: Option<String>,
    pub m: Option<String>,
    /// Keep the coordinate columns as attributes too
    pub include_coords_in_attrs: bool,
    /// Report progress every this many rows
    pub progress_interval: usize,
}

impl PointColumns {
    #[must_use]
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            z: None,
            m: None,
            include_coords_in_attrs: false,
            progress_interval: 1000,
        }
    }

    #[must_use]
    pub fn with_z(mut self, column: impl Into<String>) -> Self {
        self.z = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_m(mut self, column: impl Into<String>) -> Self {
        self.m = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_coords_in_attrs(mut self, include: bool) -> Self {
        self.include_coords_in_attrs = include;
        self
    }

    #[must_use]
    pub fn with_progress_interval(mut self, rows: usize) -> Self {
        self.progress_interval = rows;
        self
    }

    /// Every configured coordinate column name.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        [Some(&self.x), Some(&self.y), self.z.as_ref(), self.m.as_ref()]
            .into_iter()
            .flatten()
            .map(String::as_str)
    }
}

/// Model parameters a host collects from its settings or parameter forms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelParameters {
    pub bounding_box: Option<BoundingBox>,
    /// Stratigraphic units, youngest first
    pub stratigraphic_order: Vec<String>,
    /// Units excluded from contact extraction
    pub ignore_units: Vec<String>,
}

impl ModelParameters {
    /// Decode loosely typed parameters.
    ///
    /// `values` is an object with optional `bounding_box`,
    /// `stratigraphic_order` and `ignore_units` entries; absent and null
    /// entries are left empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] when `values` is not an object,
    /// and the decoder's validation error when an entry is malformed.
    pub fn from_values(values: &Value) -> Result<Self> {
        let Value::Object(map) = values else {
            return Err(ConfigError::InvalidOption {
                option: "model parameters".to_string(),
                message: "expected an object".to_string(),
            }
            .into());
        };
        let entry = |key: &str| map.get(key).filter(|v| !v.is_null());

        Ok(Self {
            bounding_box: entry("bounding_box").map(decode_bbox).transpose()?,
            stratigraphic_order: entry("stratigraphic_order")
                .map(decode_ordered_list)
                .transpose()?
                .unwrap_or_default(),
            ignore_units: entry("ignore_units")
                .map(decode_ordered_list)
                .transpose()?
                .unwrap_or_default(),
        })
    }

    /// The bounding box, required by algorithms that clip their inputs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequired`] when no box was supplied.
    pub fn require_bounding_box(&self) -> Result<BoundingBox> {
        self.bounding_box.ok_or_else(|| {
            ConfigError::MissingRequired {
                option: "bounding_box".to_string(),
            }
            .into()
        })
    }
}
