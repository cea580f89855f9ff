//! Table → host layer.

use geobridge_core_common::{
    EncodedGeometry, Feature, FeatureSink, FeatureSinkProvider, FieldSchema, FieldValue,
    Feedback, Geometry, GeometryType,
};
use geobridge_shared::{RecordError, RecordPosition};
use geobridge_wkb::{infer_family, promote_to, to_wkb_or_wkt};
use log::{debug, info, warn};

use super::{ConversionOutcome, ExportSummary, RowTracker};
use crate::config::ConversionOptions;
use crate::error::{ResourceError, Result, column_not_found};
use crate::table::GeoTable;

/// Attribute schema written to the sink: the table schema, narrowed to the
/// requested subset and without the fid column.
fn export_schema(table: &GeoTable, options: &ConversionOptions) -> Result<FieldSchema> {
    let inferred = table.schema();
    let fid = options.fid_column.as_deref();
    let Some(subset) = &options.attributes else {
        return Ok(inferred
            .iter()
            .filter(|def| Some(def.name.as_str()) != fid)
            .map(|def| (def.name.clone(), def.logical_type))
            .collect());
    };

    let mut schema = FieldSchema::new();
    for name in subset {
        let logical_type = inferred
            .get(name)
            .ok_or_else(|| column_not_found(name, &table.column_names()))?;
        if Some(name.as_str()) != fid {
            schema.push(name.clone(), logical_type);
        }
    }
    Ok(schema)
}

pub(super) fn create_sink<'p>(
    provider: &'p mut dyn FeatureSinkProvider,
    schema: &FieldSchema,
    geometry_type: Option<GeometryType>,
    table: &GeoTable,
) -> Result<Box<dyn FeatureSink + 'p>> {
    provider
        .create_sink(schema, geometry_type, table.crs())
        .map_err(|err| {
            ResourceError::SinkCreation {
                message: format!("{err:#}"),
            }
            .into()
        })
}

pub(super) fn finish_sink(sink: &mut (dyn FeatureSink + '_)) -> Result<()> {
    sink.finish().map_err(|err| {
        ResourceError::SinkFinish {
            message: format!("{err:#}"),
        }
        .into()
    })
}

/// Encode a destination geometry, counting WKT fallbacks.
pub(super) fn encode_for_sink(
    geometry: &Geometry,
    position: &RecordPosition,
    summary: &mut ExportSummary,
    tracker: &mut RowTracker<'_>,
) -> Option<EncodedGeometry> {
    match to_wkb_or_wkt(geometry) {
        Ok(encoded) => {
            if !encoded.is_exact() {
                warn!("geometry at {position} written as WKT; Z/M may be lost");
                summary.wkt_fallbacks += 1;
            }
            Some(encoded)
        },
        Err(err) => {
            tracker.report(err.into_record_error(position.clone()));
            None
        },
    }
}

/// Write a table into a new host layer.
///
/// The destination geometry type is inferred from the geometry column, and
/// single geometries are promoted when the destination is multi-part. Rows
/// with a null or empty geometry, or with a geometry of another family, are
/// skipped. The table's geometry column is used whatever its name; the
/// destination gets the table CRS, or none.
///
/// # Errors
///
/// Returns [`ResourceError::SinkCreation`] or [`ResourceError::SinkFinish`]
/// when the host cannot create or finalise the destination, and a
/// validation error when a requested attribute does not exist.
pub fn table_to_layer(
    table: &GeoTable,
    provider: &mut dyn FeatureSinkProvider,
    options: &ConversionOptions,
    feedback: &dyn Feedback,
) -> Result<ConversionOutcome<ExportSummary>> {
    options.validate()?;
    let schema = export_schema(table, options)?;
    let fid_values = match &options.fid_column {
        Some(name) => Some(table.require_column(name)?),
        None => None,
    };

    let mut summary = ExportSummary::default();
    if let Some(geometry) = table.geometry() {
        let inference = infer_family(geometry.values.iter().map(Option::as_ref));
        summary.geometry_type = Some(inference.geometry_type);
        summary.defaulted_family = inference.defaulted;
    }

    if table.is_empty() {
        info!("input table is empty; creating empty output layer");
        feedback.push_info("input table is empty; creating empty output layer");
    }

    let mut sink = create_sink(provider, &schema, summary.geometry_type, table)?;
    let columns: Vec<&[FieldValue]> = schema
        .iter()
        .map(|def| table.require_column(&def.name))
        .collect::<Result<_>>()?;

    let mut tracker = RowTracker::new(feedback, Some(table.num_rows()), options.progress_interval);
    for row in 0..table.num_rows() {
        if tracker.should_stop() {
            break;
        }
        let fid = fid_values.and_then(|values| values[row].as_integral());
        let position = RecordPosition::feature(fid, row as u64 + 1);

        let mut feature = Feature::new();
        feature.fid = fid;
        for (def, values) in schema.iter().zip(&columns) {
            let value = values[row].coerce(def.logical_type).unwrap_or_default();
            feature.attributes.push((def.name.clone(), value));
        }

        if let (Some(column), Some(target)) = (table.geometry(), summary.geometry_type) {
            let geometry = match &column.values[row] {
                Some(geometry) if !geometry.is_empty() => geometry.clone(),
                _ => {
                    debug!("skipping row without geometry at {position}");
                    summary.skipped += 1;
                    tracker.row_done(row + 1);
                    continue;
                },
            };
            if geometry.family() != target.family {
                tracker.report(RecordError::geometry(
                    format!(
                        "{} does not match destination type {target}",
                        geometry.geometry_type()
                    ),
                    position.with_column(column.name.clone()),
                ));
                summary.skipped += 1;
                tracker.row_done(row + 1);
                continue;
            }
            let promoted = promote_to(geometry, &target);
            let Some(encoded) = encode_for_sink(&promoted, &position, &mut summary, &mut tracker)
            else {
                summary.skipped += 1;
                tracker.row_done(row + 1);
                continue;
            };
            feature.geometry = Some(encoded);
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

    match summary.geometry_type {
        Some(geometry_type) => info!(
            "wrote {} features as {geometry_type} ({} skipped, {} as WKT)",
            summary.written, summary.skipped, summary.wkt_fallbacks
        ),
        None => info!(
            "wrote {} attribute-only features ({} skipped)",
            summary.written, summary.skipped
        ),
    }
    Ok(tracker.finish(summary))
}
