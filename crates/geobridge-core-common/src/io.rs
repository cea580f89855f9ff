//! Host collaborator traits.
//!
//! A GIS host hands its layers, rasters and progress reporting to the
//! converters through these traits. The core only ever reads from a
//! [`FeatureSource`] and writes into sinks obtained from a
//! [`FeatureSinkProvider`]; it never mutates the host's live layer.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};
use log::{debug, info, warn};

use crate::crs::Crs;
use crate::geometry::{EncodedGeometry, GeometryType};
use crate::value::{FieldSchema, FieldValue};

/// One attributed record crossing the host boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    /// Host feature identifier, if the host has one
    pub fid: Option<i64>,
    /// Attribute values in field order
    pub attributes: Vec<(String, FieldValue)>,
    /// Geometry in WKB (or fallback WKT) form
    pub geometry: Option<EncodedGeometry>,
}

impl Feature {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fid(mut self, fid: i64) -> Self {
        self.fid = Some(fid);
        self
    }

    /// Set an attribute, replacing any existing value with the same name.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set_attribute(name, value);
        self
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: EncodedGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    /// Attribute by (case-sensitive) field name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&FieldValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }
}

/// A readable feature collection.
pub trait FeatureSource {
    /// Field names in the layer's column order.
    fn field_names(&self) -> Vec<String>;

    /// The layer CRS, `None` when the layer has no (valid) CRS.
    fn crs(&self) -> Option<Crs>;

    /// Iterate over the layer's features.
    fn features(&self) -> Box<dyn Iterator<Item = Feature> + '_>;

    /// Number of features when cheaply known, used for progress reporting.
    fn feature_count(&self) -> Option<usize> {
        None
    }
}

/// A destination for features created by the host.
pub trait FeatureSink {
    /// Write one feature. Errors reject that feature only.
    ///
    /// # Errors
    ///
    /// Returns an error when the host could not store the feature.
    fn add_feature(&mut self, feature: Feature) -> Result<()>;

    /// Flush buffered features once the conversion has finished.
    ///
    /// # Errors
    ///
    /// Returns an error when the host could not finalise the destination.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Creates destination sinks on demand.
pub trait FeatureSinkProvider {
    /// Create a sink for the given attribute schema and geometry type.
    ///
    /// # Arguments
    ///
    /// * `schema` - Attribute fields in write order
    /// * `geometry_type` - Destination WKB type, `None` for attribute-only tables
    /// * `crs` - Destination CRS, `None` when the source carried no CRS
    ///
    /// # Errors
    ///
    /// Returns an error when the destination cannot be created. Conversions
    /// treat this as fatal.
    fn create_sink(
        &mut self,
        schema: &FieldSchema,
        geometry_type: Option<GeometryType>,
        crs: Option<&Crs>,
    ) -> Result<Box<dyn FeatureSink + '_>>;
}

/// Result of identifying a raster location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identify {
    /// False when the location holds no valid data (outside extent, masked)
    pub valid: bool,
    /// Band number (1-based) to band value; `None` for a no-data band
    pub bands: BTreeMap<u32, Option<f64>>,
}

impl Identify {
    /// A location without valid data.
    #[must_use]
    pub fn no_data() -> Self {
        Self::default()
    }

    /// A valid single-band value.
    #[must_use]
    pub fn value(value: f64) -> Self {
        Self::with_bands([(1, Some(value))])
    }

    /// A valid result with explicit band values.
    #[must_use]
    pub fn with_bands(bands: impl IntoIterator<Item = (u32, Option<f64>)>) -> Self {
        Self {
            valid: true,
            bands: bands.into_iter().collect(),
        }
    }

    /// Band 1 when it has a value, otherwise the first band that has one.
    #[must_use]
    pub fn first_value(&self) -> Option<f64> {
        if !self.valid {
            return None;
        }
        self.bands
            .get(&1)
            .copied()
            .flatten()
            .or_else(|| self.bands.values().find_map(|v| *v))
    }
}

/// Point-identification access to a raster, typically a DTM.
pub trait RasterSource {
    /// Stable identifier of the raster's source handle (path or URI).
    fn source_id(&self) -> &str;

    /// Raster CRS, `None` when unknown.
    fn crs(&self) -> Option<Crs>;

    /// Identify band values at a coordinate expressed in the raster CRS.
    fn identify(&self, x: f64, y: f64) -> Identify;

    fn band_count(&self) -> usize {
        1
    }

    /// False for remote or virtual rasters that must be copied locally
    /// before point sampling.
    fn is_random_access(&self) -> bool {
        true
    }

    /// Write a local ESRI ASCII grid copy of band 1 to `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error when the raster cannot be exported. The default
    /// implementation always fails.
    fn export_ascii_grid(&self, destination: &Path) -> Result<()> {
        bail!(
            "raster '{}' cannot be exported to {}",
            self.source_id(),
            destination.display()
        )
    }
}

/// Host-supplied planar coordinate transformation.
pub trait CoordinateTransform {
    /// Transform `(x, y)` from one CRS to another.
    ///
    /// # Errors
    ///
    /// Returns an error when the coordinate cannot be transformed.
    fn transform(&self, x: f64, y: f64, from: &Crs, to: &Crs) -> Result<(f64, f64)>;
}

impl<F> CoordinateTransform for F
where
    F: Fn(f64, f64, &Crs, &Crs) -> Result<(f64, f64)>,
{
    fn transform(&self, x: f64, y: f64, from: &Crs, to: &Crs) -> Result<(f64, f64)> {
        self(x, y, from, to)
    }
}

/// Progress, messages and cooperative cancellation.
pub trait Feedback {
    fn push_info(&self, _message: &str) {}

    fn report_error(&self, _message: &str) {}

    /// Progress in percent, 0 to 100.
    fn set_progress(&self, _percent: f64) {}

    /// Polled between records; returning true stops the conversion early.
    fn is_canceled(&self) -> bool {
        false
    }
}

/// Feedback that discards everything and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl Feedback for NoFeedback {}

/// Feedback that forwards messages to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFeedback;

impl Feedback for LogFeedback {
    fn push_info(&self, message: &str) {
        info!("{message}");
    }

    fn report_error(&self, message: &str) {
        warn!("{message}");
    }

    fn set_progress(&self, percent: f64) {
        debug!("progress {percent:.1}%");
    }
}
