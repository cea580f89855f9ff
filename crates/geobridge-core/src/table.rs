//! The tabular geometric dataset exchanged with external algorithms.

use geobridge_core_common::{Crs, FieldSchema, FieldValue, Geometry};

use crate::error::{Result, ValidationError, column_not_found};
use crate::schema::infer_schema;

/// Default name of the geometry column.
pub const DEFAULT_GEOMETRY_COLUMN: &str = "geometry";

/// A named attribute column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<FieldValue>,
}

/// The geometry column of a [`GeoTable`]; `None` cells are null geometries.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryColumn {
    pub name: String,
    pub values: Vec<Option<Geometry>>,
}

/// Rows of scalar attributes plus an optional geometry column and CRS.
///
/// Every column holds exactly [`GeoTable::num_rows`] values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoTable {
    columns: Vec<Column>,
    geometry: Option<GeometryColumn>,
    crs: Option<Crs>,
    num_rows: usize,
}

impl GeoTable {
    /// An empty table with no columns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from attribute columns and an optional geometry column.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when column lengths differ or a column
    /// name is repeated.
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Vec<FieldValue>)>,
        geometry: Option<GeometryColumn>,
    ) -> Result<Self> {
        let mut table = Self::new();
        if let Some(geometry) = geometry {
            table.num_rows = geometry.values.len();
            table.geometry = Some(geometry);
        }
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    #[must_use]
    pub fn with_crs(mut self, crs: Option<Crs>) -> Self {
        self.crs = crs;
        self
    }

    /// Append an attribute column.
    ///
    /// The first column of an empty table fixes the row count.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the name exists or the length does
    /// not match the row count.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<FieldValue>) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(ValidationError::DuplicateColumn { column: name }.into());
        }
        if self.columns.is_empty() && self.geometry.is_none() {
            self.num_rows = values.len();
        }
        if values.len() != self.num_rows {
            return Err(ValidationError::ColumnLength {
                column: name,
                expected: self.num_rows,
                found: values.len(),
            }
            .into());
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Attribute values of a column by (case-sensitive) name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[FieldValue]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Like [`GeoTable::column`] but reports the available columns when missing.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ColumnNotFound`] when no column has that name.
    pub fn require_column(&self, name: &str) -> Result<&[FieldValue]> {
        self.column(name)
            .ok_or_else(|| column_not_found(name, &self.column_names()).into())
    }

    /// True when an attribute or the geometry column has this name.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
            || self.geometry.as_ref().is_some_and(|g| g.name == name)
    }

    #[must_use]
    pub fn geometry(&self) -> Option<&GeometryColumn> {
        self.geometry.as_ref()
    }

    #[must_use]
    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// Attach or replace the geometry column.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ColumnLength`] when the table already has
    /// attribute rows and the geometry count differs.
    pub fn set_geometry(&mut self, geometry: GeometryColumn) -> Result<()> {
        if self.columns.is_empty() {
            self.num_rows = geometry.values.len();
        } else if geometry.values.len() != self.num_rows {
            return Err(ValidationError::ColumnLength {
                column: geometry.name,
                expected: self.num_rows,
                found: geometry.values.len(),
            }
            .into());
        }
        self.geometry = Some(geometry);
        Ok(())
    }

    /// Rename an attribute or the geometry column.
    ///
    /// Renaming a column to its own name is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when `from` does not exist or `to` is
    /// already taken.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to && self.has_column(from) {
            return Ok(());
        }
        if self.has_column(to) {
            return Err(ValidationError::DuplicateColumn {
                column: to.to_string(),
            }
            .into());
        }
        if let Some(column) = self.columns.iter_mut().find(|c| c.name == from) {
            column.name = to.to_string();
            return Ok(());
        }
        if let Some(geometry) = self.geometry.as_mut().filter(|g| g.name == from) {
            geometry.name = to.to_string();
            return Ok(());
        }
        Err(column_not_found(from, &self.column_names()).into())
    }

    /// Schema of the attribute columns, inferred from their values.
    #[must_use]
    pub fn schema(&self) -> FieldSchema {
        let columns: Vec<(&str, &[FieldValue])> = self
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.values.as_slice()))
            .collect();
        infer_schema(&columns)
    }

    /// Keep only the rows for which `keep(row)` is true.
    #[must_use]
    pub fn filter_rows(&self, mut keep: impl FnMut(usize) -> bool) -> Self {
        let kept: Vec<usize> = (0..self.num_rows).filter(|&row| keep(row)).collect();
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: kept.iter().map(|&row| c.values[row].clone()).collect(),
                })
                .collect(),
            geometry: self.geometry.as_ref().map(|g| GeometryColumn {
                name: g.name.clone(),
                values: kept.iter().map(|&row| g.values[row].clone()).collect(),
            }),
            crs: self.crs.clone(),
            num_rows: kept.len(),
        }
    }
}

/// One vertex of a source geometry with its parent feature's attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledPoint {
    pub x: f64,
    pub y: f64,
    /// Elevation, `0.0` without a DTM, the no-data sentinel when sampling failed
    pub z: f64,
    pub attributes: Vec<FieldValue>,
}

/// Output of vertex sampling: one row per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTable {
    /// Names of the attributes carried by every point
    pub attribute_names: Vec<String>,
    pub points: Vec<SampledPoint>,
    /// CRS of the X/Y columns
    pub crs: Option<Crs>,
}

impl SampleTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Flatten into a non-geometric table with `X`, `Y`, `Z` columns followed
    /// by the carried attributes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateColumn`] when an attribute is itself
    /// named `X`, `Y` or `Z`.
    pub fn to_geo_table(&self) -> Result<GeoTable> {
        let coordinate = |get: fn(&SampledPoint) -> f64| -> Vec<FieldValue> {
            self.points.iter().map(|p| FieldValue::Float(get(p))).collect()
        };
        let mut columns: Vec<(String, Vec<FieldValue>)> = vec![
            ("X".to_string(), coordinate(|p| p.x)),
            ("Y".to_string(), coordinate(|p| p.y)),
            ("Z".to_string(), coordinate(|p| p.z)),
        ];
        for (index, name) in self.attribute_names.iter().enumerate() {
            columns.push((
                name.clone(),
                self.points
                    .iter()
                    .map(|p| p.attributes.get(index).cloned().unwrap_or_default())
                    .collect(),
            ));
        }
        let mut table = GeoTable::new();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table.with_crs(self.crs.clone()))
    }
}
