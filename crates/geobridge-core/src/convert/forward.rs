//! Host layer → table.

use geobridge_core_common::{Feature, FeatureSource, FieldValue, Feedback, Geometry};
use geobridge_shared::{RecordError, RecordPosition};
use geobridge_wkb::decode;
use log::{debug, info};

use super::{ConversionOutcome, RowTracker};
use crate::config::ConversionOptions;
use crate::error::{Result, ValidationError, column_not_found};
use crate::raster::{DtmSampler, SampleOutcome};
use crate::table::{GeoTable, GeometryColumn, SampleTable, SampledPoint};

/// Attribute names to carry, in output order, with the fid column first.
fn output_fields(source: &dyn FeatureSource, options: &ConversionOptions) -> Result<Vec<String>> {
    let available = source.field_names();
    let mut fields = match &options.attributes {
        Some(subset) => {
            for name in subset {
                if !available.contains(name) {
                    return Err(column_not_found(name, &available).into());
                }
            }
            subset.clone()
        },
        None => available,
    };
    if let Some(fid) = &options.fid_column {
        if fields.contains(fid) {
            return Err(ValidationError::DuplicateColumn { column: fid.clone() }.into());
        }
        fields.insert(0, fid.clone());
    }
    Ok(fields)
}

fn attribute_values(feature: &Feature, fields: &[String], options: &ConversionOptions) -> Vec<FieldValue> {
    fields
        .iter()
        .map(|name| {
            if options.fid_column.as_ref() == Some(name) {
                FieldValue::from(feature.fid)
            } else {
                feature.attribute(name).cloned().unwrap_or_default()
            }
        })
        .collect()
}

/// Decode a feature's geometry, reporting failures.
///
/// Returns `None` for features that carry no usable geometry.
fn feature_geometry(
    feature: &Feature,
    position: &RecordPosition,
    tracker: &mut RowTracker<'_>,
) -> Option<Geometry> {
    let Some(encoded) = &feature.geometry else {
        debug!("skipping feature without geometry at {position}");
        return None;
    };
    match decode(encoded) {
        Ok(geometry) if geometry.is_empty() => {
            debug!("skipping feature with empty geometry at {position}");
            None
        },
        Ok(geometry) => Some(geometry),
        Err(err) => {
            tracker.report(err.into_record_error(position.clone()));
            None
        },
    }
}

/// Copy a host layer into a [`GeoTable`], one row per feature.
///
/// Features without a geometry, or with an empty one, are left out. Features
/// whose geometry cannot be decoded are left out with a diagnostic. The table
/// takes the layer's CRS.
///
/// # Errors
///
/// Returns a configuration error for invalid options and a
/// [`ValidationError`] when a requested attribute does not exist or a column
/// name is used twice.
pub fn layer_to_table(
    source: &dyn FeatureSource,
    options: &ConversionOptions,
    feedback: &dyn Feedback,
) -> Result<ConversionOutcome<GeoTable>> {
    options.validate()?;
    let fields = output_fields(source, options)?;
    let total = source.feature_count();
    info!(
        "converting layer to table ({} features, {} attributes)",
        total.map_or_else(|| "unknown".to_string(), |n| n.to_string()),
        fields.len()
    );

    let mut tracker = RowTracker::new(feedback, total, options.progress_interval);
    let mut columns: Vec<Vec<FieldValue>> = vec![Vec::new(); fields.len()];
    let mut geometries = Vec::new();

    for (index, feature) in source.features().enumerate() {
        if tracker.should_stop() {
            break;
        }
        let position = RecordPosition::feature(feature.fid, index as u64 + 1);
        if let Some(geometry) = feature_geometry(&feature, &position, &mut tracker) {
            for (column, value) in columns
                .iter_mut()
                .zip(attribute_values(&feature, &fields, options))
            {
                column.push(value);
            }
            geometries.push(Some(geometry));
        }
        tracker.row_done(index + 1);
    }

    let rows = geometries.len();
    let table = GeoTable::from_columns(
        fields.into_iter().zip(columns),
        Some(GeometryColumn {
            name: options.geometry_column.clone(),
            values: geometries,
        }),
    )?
    .with_crs(source.crs());

    info!("layer converted to table with {rows} rows");
    Ok(tracker.finish(table))
}

/// Decompose every feature into its vertices, one [`SampledPoint`] each.
///
/// X and Y stay in the layer CRS. Z comes from `dtm` when given, with the
/// no-data sentinel where the DTM has no value, and is `0.0` otherwise. A
/// coordinate that cannot be transformed into the DTM CRS keeps the sentinel
/// and is reported as a diagnostic.
///
/// # Errors
///
/// Same as [`layer_to_table`].
pub fn layer_to_samples(
    source: &dyn FeatureSource,
    dtm: Option<&DtmSampler<'_>>,
    options: &ConversionOptions,
    feedback: &dyn Feedback,
) -> Result<ConversionOutcome<SampleTable>> {
    options.validate()?;
    let fields = output_fields(source, options)?;
    let crs = source.crs();
    let total = source.feature_count();
    match dtm {
        Some(dtm) => info!(
            "sampling layer vertices against DTM '{}'",
            dtm.raster().source_id()
        ),
        None => info!("sampling layer vertices without DTM; Z set to 0"),
    }

    let mut tracker = RowTracker::new(feedback, total, options.progress_interval);
    let mut points = Vec::new();

    for (index, feature) in source.features().enumerate() {
        if tracker.should_stop() {
            break;
        }
        let position = RecordPosition::feature(feature.fid, index as u64 + 1);
        if let Some(geometry) = feature_geometry(&feature, &position, &mut tracker) {
            let attributes = attribute_values(&feature, &fields, options);
            for (vertex, coord) in geometry.vertices().into_iter().enumerate() {
                let z = match dtm {
                    Some(dtm) => {
                        let outcome = dtm.sample(coord.x, coord.y, crs.as_ref());
                        if let SampleOutcome::TransformFailed(message) = &outcome {
                            tracker.report(RecordError::sample(
                                message.clone(),
                                position.clone().with_vertex(vertex as u64 + 1),
                            ));
                        }
                        outcome.value()
                    },
                    None => 0.0,
                };
                points.push(SampledPoint {
                    x: coord.x,
                    y: coord.y,
                    z,
                    attributes: attributes.clone(),
                });
            }
        }
        tracker.row_done(index + 1);
    }

    info!("sampled {} vertices", points.len());
    Ok(tracker.finish(SampleTable {
        attribute_names: fields,
        points,
        crs,
    }))
}
