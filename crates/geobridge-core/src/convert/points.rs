//! Point layers from coordinate columns.

use geobridge_core_common::{
    Coord, Dimension, Feature, FeatureSinkProvider, FieldDef, FieldSchema, FieldValue,
    Feedback, Geometry, GeometryFamily, GeometryType,
};
use geobridge_shared::{RecordError, RecordPosition};
use log::{info, warn};

use super::reverse::{create_sink, encode_for_sink, finish_sink};
use super::{ConversionOutcome, ExportSummary, RowTracker};
use crate::config::PointColumns;
use crate::error::Result;
use crate::table::GeoTable;

/// An optional coordinate column; a configured name the table lacks is ignored.
fn optional_column<'t>(table: &'t GeoTable, axis: &str, name: Option<&str>) -> Option<&'t [FieldValue]> {
    let name = name?;
    let values = table.column(name);
    if values.is_none() {
        warn!("{axis} column '{name}' not found; writing points without {axis}");
    }
    values
}

fn coordinate(values: &[FieldValue], row: usize) -> Option<f64> {
    values[row].parse_f64().filter(|v| v.is_finite())
}

/// Write a point layer built from the numeric coordinate columns of a
/// non-geometric table.
///
/// The destination is `Point`, `PointZ`, `PointM` or `PointZM` depending on
/// which of the Z and M columns exist. Rows whose X or Y is missing or not
/// numeric are skipped with a diagnostic; a missing Z or M is written as NaN.
/// Any geometry column of `table` is ignored.
///
/// # Errors
///
/// Returns a validation error when the X or Y column does not exist, and a
/// resource error when the host cannot create or finalise the destination.
pub fn points_to_layer(
    table: &GeoTable,
    columns: &PointColumns,
    provider: &mut dyn FeatureSinkProvider,
    feedback: &dyn Feedback,
) -> Result<ConversionOutcome<ExportSummary>> {
    let xs = table.require_column(&columns.x)?;
    let ys = table.require_column(&columns.y)?;
    let zs = optional_column(table, "Z", columns.z.as_deref());
    let ms = optional_column(table, "M", columns.m.as_deref());

    let geometry_type = GeometryType::new(
        GeometryFamily::Point,
        false,
        Dimension::from_flags(zs.is_some(), ms.is_some()),
    );
    let coordinate_columns: Vec<&str> = columns.names().collect();
    let schema: FieldSchema = table
        .schema()
        .iter()
        .filter(|def| {
            columns.include_coords_in_attrs || !coordinate_columns.contains(&def.name.as_str())
        })
        .map(|def| (def.name.clone(), def.logical_type))
        .collect();
    let attributes: Vec<(&FieldDef, &[FieldValue])> = schema
        .iter()
        .map(|def| table.require_column(&def.name).map(|values| (def, values)))
        .collect::<Result<_>>()?;

    let total = table.num_rows();
    info!("writing {total} rows of '{}', '{}' as {geometry_type}", columns.x, columns.y);
    feedback.push_info(&format!("Writing {total} features"));

    let mut summary = ExportSummary {
        geometry_type: Some(geometry_type),
        ..ExportSummary::default()
    };
    let mut sink = create_sink(provider, &schema, Some(geometry_type), table)?;
    let mut tracker = RowTracker::new(feedback, Some(total), columns.progress_interval);

    for row in 0..total {
        if tracker.should_stop() {
            break;
        }
        let position = RecordPosition::row(row as u64 + 1);
        let (Some(x), Some(y)) = (coordinate(xs, row), coordinate(ys, row)) else {
            tracker.report(RecordError::attribute(
                format!("non-numeric coordinate ({}, {})", xs[row], ys[row]),
                position.with_column(format!("{}/{}", columns.x, columns.y)),
            ));
            summary.skipped += 1;
            tracker.row_done(row + 1);
            continue;
        };
        let z = zs.map(|values| coordinate(values, row).unwrap_or(f64::NAN));
        let m = ms.map(|values| coordinate(values, row).unwrap_or(f64::NAN));
        let point = Geometry::Point(Some(Coord { x, y, z, m }));

        let Some(encoded) = encode_for_sink(&point, &position, &mut summary, &mut tracker) else {
            summary.skipped += 1;
            tracker.row_done(row + 1);
            continue;
        };
        let mut feature = Feature::new().with_geometry(encoded);
        for (def, values) in &attributes {
            let value = values[row].coerce(def.logical_type).unwrap_or_default();
            feature.set_attribute(def.name.as_str(), value);
        }

        match sink.add_feature(feature) {
            Ok(()) => summary.written += 1,
            Err(err) => {
                tracker.report(RecordError::sink(format!("{err:#}"), position));
                summary.skipped += 1;
            },
        }
        tracker.row_done(row + 1);
    }

    finish_sink(sink.as_mut())?;
    feedback.push_info("Done");
    info!("wrote {} points ({} skipped)", summary.written, summary.skipped);
    Ok(tracker.finish(summary))
}
