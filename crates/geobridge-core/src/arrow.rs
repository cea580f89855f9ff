//! Arrow interop for [`GeoTable`].
//!
//! Attribute columns are written with the Arrow type of their inferred
//! logical type. The geometry column is a nullable `Binary` column of WKB
//! tagged with the `geoarrow.wkb` extension, and the table CRS travels in the
//! schema metadata.

use std::collections::HashMap;
use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::{
    Float32Type, Float64Type, Int32Type, Int64Type, TimestampMillisecondType,
};
use arrow_array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Float64Array, Int64Array, RecordBatch,
    RecordBatchOptions, StringArray, TimestampMillisecondArray,
};
use arrow_schema::{DataType, Field, Schema};
use chrono::DateTime;
use geoarrow_schema::{GeoArrowType, WkbType};
use geobridge_core_common::{Crs, FieldValue, LogicalType};
use geobridge_wkb::{decode_wkb, encode_wkb};

use crate::error::{Result, ValidationError, column_not_found};
use crate::schema::coerce_column;
use crate::table::{GeoTable, GeometryColumn};
use crate::utils::{ArrowDataTypeExt, LogicalTypeExt};

/// Schema metadata key holding the table CRS.
pub const CRS_METADATA_KEY: &str = "geobridge:crs";

const EXTENSION_NAME_KEY: &str = "ARROW:extension:name";
const WKB_EXTENSION_NAME: &str = "geoarrow.wkb";

fn build_array(values: &[FieldValue], logical_type: LogicalType) -> ArrayRef {
    match logical_type {
        LogicalType::Integer => Arc::new(
            values
                .iter()
                .map(FieldValue::as_integral)
                .collect::<Int64Array>(),
        ),
        LogicalType::Float => Arc::new(values.iter().map(FieldValue::as_f64).collect::<Float64Array>()),
        LogicalType::Boolean => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    FieldValue::Boolean(b) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        ),
        LogicalType::DateTime => Arc::new(
            values
                .iter()
                .map(|v| v.as_datetime().map(|dt| dt.and_utc().timestamp_millis()))
                .collect::<TimestampMillisecondArray>(),
        ),
        LogicalType::Text => Arc::new(
            values
                .iter()
                .map(|v| v.as_text().map(str::to_owned))
                .collect::<StringArray>(),
        ),
    }
}

fn read_column(name: &str, array: &dyn Array) -> Result<Vec<FieldValue>> {
    let unsupported = || ValidationError::UnsupportedColumnType {
        column: name.to_string(),
        data_type: array.data_type().format(),
    };
    let Some(logical_type) = LogicalType::from_arrow(array.data_type()) else {
        return Err(unsupported().into());
    };

    let values: Vec<FieldValue> = match (logical_type, array.data_type()) {
        (LogicalType::Integer, DataType::Int32) => array
            .as_primitive::<Int32Type>()
            .iter()
            .map(|v| FieldValue::from(v.map(i64::from)))
            .collect(),
        (LogicalType::Integer, _) => array
            .as_primitive::<Int64Type>()
            .iter()
            .map(FieldValue::from)
            .collect(),
        (LogicalType::Float, DataType::Float32) => array
            .as_primitive::<Float32Type>()
            .iter()
            .map(|v| FieldValue::from(v.map(f64::from)))
            .collect(),
        (LogicalType::Float, _) => array
            .as_primitive::<Float64Type>()
            .iter()
            .map(FieldValue::from)
            .collect(),
        (LogicalType::Boolean, _) => array.as_boolean().iter().map(FieldValue::from).collect(),
        (LogicalType::DateTime, _) => array
            .as_primitive::<TimestampMillisecondType>()
            .iter()
            .map(|v| {
                FieldValue::from(
                    v.and_then(DateTime::from_timestamp_millis)
                        .map(|dt| dt.naive_utc()),
                )
            })
            .collect(),
        (LogicalType::Text, DataType::LargeUtf8) => array
            .as_string::<i64>()
            .iter()
            .map(FieldValue::from)
            .collect(),
        (LogicalType::Text, _) => array
            .as_string::<i32>()
            .iter()
            .map(FieldValue::from)
            .collect(),
    };
    Ok(values)
}

fn is_wkb_field(field: &Field) -> bool {
    field
        .metadata()
        .get(EXTENSION_NAME_KEY)
        .is_some_and(|name| name == WKB_EXTENSION_NAME)
}

impl GeoTable {
    /// Convert the table into a single Arrow record batch.
    ///
    /// # Errors
    ///
    /// Returns a codec error when a geometry cannot be WKB-encoded, and an
    /// Arrow error when the batch cannot be assembled.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = self.schema();
        let mut fields = Vec::with_capacity(schema.len() + 1);
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.len() + 1);

        for (column, def) in self.columns().iter().zip(schema.iter()) {
            let values = coerce_column(&column.values, def.logical_type);
            fields.push(Field::new(&column.name, def.logical_type.arrow_type(), true));
            arrays.push(build_array(&values, def.logical_type));
        }

        if let Some(geometry) = self.geometry() {
            let encoded = geometry
                .values
                .iter()
                .map(|g| g.as_ref().map(encode_wkb).transpose())
                .collect::<std::result::Result<Vec<_>, _>>()?;
            fields.push(
                GeoArrowType::Wkb(WkbType::new(Arc::default())).to_field(&geometry.name, true),
            );
            arrays.push(Arc::new(encoded.into_iter().collect::<BinaryArray>()));
        }

        let mut metadata = HashMap::new();
        if let Some(crs) = self.crs() {
            metadata.insert(CRS_METADATA_KEY.to_string(), crs.to_string());
        }
        let schema = Arc::new(Schema::new(fields).with_metadata(metadata));
        let options = RecordBatchOptions::new().with_row_count(Some(self.num_rows()));
        Ok(RecordBatch::try_new_with_options(schema, arrays, &options)?)
    }

    /// Rebuild a table from an Arrow record batch.
    ///
    /// The geometry column is `geometry_column` when given, otherwise the
    /// first `Binary` field tagged `geoarrow.wkb`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for missing or unsupported columns and a
    /// codec error when a WKB value cannot be decoded.
    pub fn from_record_batch(batch: &RecordBatch, geometry_column: Option<&str>) -> Result<Self> {
        let schema = batch.schema();
        let geometry_index = match geometry_column {
            Some(name) => Some(schema.index_of(name).map_err(|_| {
                let available: Vec<&str> =
                    schema.fields().iter().map(|f| f.name().as_str()).collect();
                column_not_found(name, &available)
            })?),
            None => schema.fields().iter().position(|f| is_wkb_field(f)),
        };

        let mut table = GeoTable::new();
        if let Some(index) = geometry_index {
            let field = schema.field(index);
            let column = batch.column(index);
            if column.data_type() != &DataType::Binary {
                return Err(ValidationError::UnsupportedColumnType {
                    column: field.name().clone(),
                    data_type: column.data_type().format(),
                }
                .into());
            }
            let values = column
                .as_binary::<i32>()
                .iter()
                .map(|bytes| bytes.map(decode_wkb).transpose())
                .collect::<std::result::Result<Vec<_>, _>>()?;
            table.set_geometry(GeometryColumn {
                name: field.name().clone(),
                values,
            })?;
        }

        for (index, field) in schema.fields().iter().enumerate() {
            if Some(index) == geometry_index {
                continue;
            }
            let values = read_column(field.name(), batch.column(index).as_ref())?;
            table.push_column(field.name().clone(), values)?;
        }

        let crs = schema
            .metadata()
            .get(CRS_METADATA_KEY)
            .map(String::as_str)
            .and_then(Crs::parse);
        Ok(table.with_crs(crs))
    }
}
