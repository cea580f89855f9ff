//! Input preparation for downstream algorithms.

use std::collections::HashSet;

use geobridge_core_common::FieldValue;
use log::info;

use crate::error::{Result, ValidationError};
use crate::table::GeoTable;

/// Drop rows whose unit name is in `ignore`.
///
/// Unit names are compared after trimming, case-sensitively. Rows with a
/// null unit name are kept.
///
/// # Errors
///
/// Returns [`ValidationError::ColumnNotFound`] when `unit_field` does not
/// exist.
pub fn filter_ignored_units<S: AsRef<str>>(
    table: &GeoTable,
    unit_field: &str,
    ignore: &[S],
) -> Result<GeoTable> {
    let units = table.require_column(unit_field)?;
    let ignored: HashSet<&str> = ignore
        .iter()
        .map(|unit| unit.as_ref().trim())
        .filter(|unit| !unit.is_empty())
        .collect();
    if ignored.is_empty() {
        info!("no units to ignore specified");
        return Ok(table.clone());
    }

    let filtered = table.filter_rows(|row| match &units[row] {
        FieldValue::Null => true,
        value => !ignored.contains(value.to_string().trim()),
    });
    info!(
        "ignored {} of {} rows by '{unit_field}'",
        table.num_rows() - filtered.num_rows(),
        table.num_rows()
    );
    Ok(filtered)
}

/// Check that `table` has every field an algorithm needs.
///
/// # Errors
///
/// Returns [`ValidationError::MissingFields`] naming every missing field,
/// prefixed with `context`.
pub fn require_fields(table: &GeoTable, fields: &[&str], context: &str) -> Result<()> {
    let missing: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|field| !table.has_column(field))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(ValidationError::MissingFields {
        context: context.to_string(),
        fields: missing.join(", "),
    }
    .into())
}
