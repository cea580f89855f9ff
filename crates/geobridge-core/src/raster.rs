//! DTM sampling.
//!
//! Every vertex exported by [`crate::convert::layer_to_samples`] gets its Z
//! from a raster through [`sample`]. A sample never fails: locations the
//! raster cannot answer for, including coordinates that could not be
//! transformed into the raster CRS, get [`NODATA_SENTINEL`].
//!
//! Remote or virtual rasters are not sampled directly. A
//! [`RasterMaterializer`] first copies them into a local ASCII grid, once per
//! source.

use std::cell::Cell;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use geobridge_ascii_grid::{GridRaster, read_ascii_grid_file};
use geobridge_core_common::{CoordinateTransform, Crs, RasterSource};
use log::{debug, info};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

use crate::error::{ResourceError, Result};

/// Z value written for vertices the DTM has no data for.
///
/// Downstream consumers must treat it as "no elevation", never as a height.
pub const NODATA_SENTINEL: f64 = -9999.0;

/// Result of sampling one location.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    /// The raster had a value
    Value(f64),
    /// The location is outside the raster or masked
    NoData,
    /// The coordinate could not be transformed into the raster CRS
    TransformFailed(String),
}

impl SampleOutcome {
    /// The sampled value, or [`NODATA_SENTINEL`].
    #[must_use]
    pub fn value(&self) -> f64 {
        match self {
            Self::Value(v) => *v,
            Self::NoData | Self::TransformFailed(_) => NODATA_SENTINEL,
        }
    }

    #[must_use]
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

/// Sample `raster` at `(x, y)` given in `source_crs`.
///
/// When both CRSs are known and differ, the coordinate is first transformed
/// into the raster CRS; a missing transformer or a failed transform yields
/// [`SampleOutcome::TransformFailed`]. Band 1 is used when it has a value,
/// otherwise the first band that has one.
pub fn sample(
    raster: &dyn RasterSource,
    x: f64,
    y: f64,
    source_crs: Option<&Crs>,
    transformer: Option<&dyn CoordinateTransform>,
) -> SampleOutcome {
    let (mut qx, mut qy) = (x, y);
    if let (Some(from), Some(to)) = (source_crs, raster.crs())
        && *from != to
    {
        let Some(transformer) = transformer else {
            return SampleOutcome::TransformFailed(format!(
                "no coordinate transform from {from} to {to}"
            ));
        };
        match transformer.transform(x, y, from, &to) {
            Ok((tx, ty)) => (qx, qy) = (tx, ty),
            Err(err) => return SampleOutcome::TransformFailed(format!("{err:#}")),
        }
    }

    let identify = raster.identify(qx, qy);
    if !identify.valid || identify.bands.is_empty() {
        return SampleOutcome::NoData;
    }
    match identify.first_value() {
        Some(value) if !value.is_nan() => SampleOutcome::Value(value),
        _ => SampleOutcome::NoData,
    }
}

/// Like [`sample`] but returns the plain value with the sentinel substituted.
#[must_use]
pub fn sample_value(
    raster: &dyn RasterSource,
    x: f64,
    y: f64,
    source_crs: Option<&Crs>,
    transformer: Option<&dyn CoordinateTransform>,
) -> f64 {
    sample(raster, x, y, source_crs, transformer).value()
}

/// Counters kept by a [`DtmSampler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleStats {
    pub sampled: usize,
    pub no_data: usize,
    pub transform_failures: usize,
}

/// A DTM bundled with what is needed to sample it from a layer's CRS.
pub struct DtmSampler<'a> {
    raster: &'a dyn RasterSource,
    transformer: Option<&'a dyn CoordinateTransform>,
    source_crs: Option<Crs>,
    stats: Cell<SampleStats>,
}

impl<'a> DtmSampler<'a> {
    #[must_use]
    pub fn new(raster: &'a dyn RasterSource) -> Self {
        Self {
            raster,
            transformer: None,
            source_crs: None,
            stats: Cell::new(SampleStats::default()),
        }
    }

    #[must_use]
    pub fn with_transformer(mut self, transformer: &'a dyn CoordinateTransform) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// CRS of the coordinates to sample, overriding the layer CRS.
    #[must_use]
    pub fn with_source_crs(mut self, crs: Crs) -> Self {
        self.source_crs = Some(crs);
        self
    }

    #[must_use]
    pub fn raster(&self) -> &dyn RasterSource {
        self.raster
    }

    /// Sample at `(x, y)`; `layer_crs` applies unless a source CRS was set.
    pub fn sample(&self, x: f64, y: f64, layer_crs: Option<&Crs>) -> SampleOutcome {
        let crs = self.source_crs.as_ref().or(layer_crs);
        let outcome = sample(self.raster, x, y, crs, self.transformer);

        let mut stats = self.stats.get();
        stats.sampled += 1;
        match &outcome {
            SampleOutcome::Value(_) => {},
            SampleOutcome::NoData => stats.no_data += 1,
            SampleOutcome::TransformFailed(_) => stats.transform_failures += 1,
        }
        self.stats.set(stats);

        debug!("sampled ({x}, {y}) -> {}", outcome.value());
        outcome
    }

    #[must_use]
    pub fn stats(&self) -> SampleStats {
        self.stats.get()
    }
}

impl std::fmt::Debug for DtmSampler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DtmSampler")
            .field("raster", &self.raster.source_id())
            .field("has_transformer", &self.transformer.is_some())
            .field("source_crs", &self.source_crs)
            .field("stats", &self.stats.get())
            .finish()
    }
}

/// Stable file stem for a raster source handle.
#[must_use]
pub fn materialization_key(source_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Local copies of non-random-access rasters.
///
/// Copies live in a temporary directory owned by the materializer and are
/// deleted when it is dropped. Each source id is exported at most once.
#[derive(Debug, Default)]
pub struct RasterMaterializer {
    dir: Option<TempDir>,
    grids: HashMap<String, GridRaster>,
    exports: usize,
}

impl RasterMaterializer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of exports performed so far.
    #[must_use]
    pub fn exports(&self) -> usize {
        self.exports
    }

    /// Directory holding the local copies, once one has been made.
    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    /// A raster that can be sampled directly.
    ///
    /// Random-access rasters are returned as is; others are materialized.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::RasterMaterialization`] when the local copy
    /// cannot be made.
    pub fn prepare<'a>(&'a mut self, raster: &'a dyn RasterSource) -> Result<&'a dyn RasterSource> {
        if raster.is_random_access() {
            return Ok(raster);
        }
        let grid: &'a dyn RasterSource = self.materialize(raster)?;
        Ok(grid)
    }

    /// The local copy of `raster`, exporting it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::RasterMaterialization`] when the temporary
    /// directory cannot be created, the host export fails or the exported
    /// grid cannot be read back.
    pub fn materialize(&mut self, raster: &dyn RasterSource) -> Result<&GridRaster> {
        let source_id = raster.source_id().to_string();
        let failure = |message: String| ResourceError::RasterMaterialization {
            source_id: source_id.clone(),
            message,
        };

        if self.dir.is_none() {
            let dir = tempfile::Builder::new()
                .prefix("geobridge-dtm-")
                .tempdir()
                .map_err(|e| failure(format!("cannot create temporary directory: {e}")))?;
            self.dir = Some(dir);
        }
        let dir: PathBuf = match &self.dir {
            Some(dir) => dir.path().to_path_buf(),
            None => return Err(failure("temporary directory unavailable".to_string()).into()),
        };

        match self.grids.entry(materialization_key(&source_id)) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = dir.join(format!("{}.asc", entry.key()));
                info!("materializing raster '{source_id}' to {}", path.display());
                raster
                    .export_ascii_grid(&path)
                    .map_err(|e| failure(format!("{e:#}")))?;
                let grid = read_ascii_grid_file(&path).map_err(|e| failure(e.to_string()))?;
                let crs = grid.crs().or_else(|| raster.crs());
                self.exports += 1;
                Ok(&*entry.insert(grid.with_crs(crs).with_source_id(source_id.clone())))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use geobridge_core_common::Identify;

    struct Bands(Identify);

    impl RasterSource for Bands {
        fn source_id(&self) -> &str {
            "bands"
        }

        fn crs(&self) -> Option<Crs> {
            None
        }

        fn identify(&self, _x: f64, _y: f64) -> Identify {
            self.0.clone()
        }
    }

    fn dtm() -> GridRaster {
        GridRaster::new(2, 1, 0.0, 0.0, 10.0, vec![100.0, 200.0])
            .unwrap()
            .with_crs(Some(Crs::Epsg(28350)))
    }

    #[test]
    fn samples_inside_and_sentinel_outside() {
        let dtm = dtm();
        assert_eq!(sample_value(&dtm, 5.0, 5.0, None, None), 100.0);
        assert_eq!(sample_value(&dtm, 15.0, 5.0, None, None), 200.0);
        assert_eq!(sample_value(&dtm, 25.0, 5.0, None, None), NODATA_SENTINEL);
        assert_eq!(sample(&dtm, -1.0, 5.0, None, None), SampleOutcome::NoData);
    }

    #[test]
    fn falls_back_to_first_available_band() {
        let raster = Bands(Identify::with_bands([(1, None), (2, Some(42.0))]));
        assert_eq!(sample_value(&raster, 0.0, 0.0, None, None), 42.0);

        let raster = Bands(Identify::with_bands([]));
        assert_eq!(sample_value(&raster, 0.0, 0.0, None, None), NODATA_SENTINEL);
    }

    #[test]
    fn transforms_between_crs() {
        let dtm = dtm();
        let shift = |x: f64, y: f64, _: &Crs, _: &Crs| -> anyhow::Result<(f64, f64)> {
            Ok((x + 10.0, y))
        };
        let value = sample_value(&dtm, 5.0, 5.0, Some(&Crs::Epsg(4326)), Some(&shift));
        assert_eq!(value, 200.0);
    }

    #[test]
    fn failed_transform_is_sentinel() {
        let dtm = dtm();
        let failing = |_: f64, _: f64, _: &Crs, _: &Crs| -> anyhow::Result<(f64, f64)> {
            bail!("outside projection domain")
        };
        let outcome = sample(&dtm, 5.0, 5.0, Some(&Crs::Epsg(4326)), Some(&failing));
        assert!(matches!(outcome, SampleOutcome::TransformFailed(ref m) if m.contains("domain")));
        assert_eq!(outcome.value(), NODATA_SENTINEL);

        // Without a transformer a CRS mismatch cannot be resolved either.
        let outcome = sample(&dtm, 5.0, 5.0, Some(&Crs::Epsg(4326)), None);
        assert!(matches!(outcome, SampleOutcome::TransformFailed(_)));
    }

    #[test]
    fn same_crs_needs_no_transformer() {
        let dtm = dtm();
        let value = sample_value(&dtm, 5.0, 5.0, Some(&Crs::Epsg(28350)), None);
        assert_eq!(value, 100.0);
    }

    #[test]
    fn sampler_counts_outcomes() {
        let dtm = dtm();
        let sampler = DtmSampler::new(&dtm);
        sampler.sample(5.0, 5.0, None);
        sampler.sample(50.0, 5.0, None);
        sampler.sample(5.0, 5.0, Some(&Crs::Epsg(4326)));
        assert_eq!(
            sampler.stats(),
            SampleStats {
                sampled: 3,
                no_data: 1,
                transform_failures: 1,
            }
        );
    }

    #[test]
    fn key_is_stable_hex() {
        let key = materialization_key("/vsicurl/https://example.org/dtm.tif");
        assert_eq!(key.len(), 64);
        assert_eq!(key, materialization_key("/vsicurl/https://example.org/dtm.tif"));
        assert_ne!(key, materialization_key("other"));
    }
}
