//! `geobridge-core` moves attributed geometric features between a GIS host and
//! tabular algorithms.
//!
//! This crate includes:
//! - **Schema inference**: Logical column types derived from cell values (`schema`).
//! - **Tables**: The geometric table handed to algorithms and its Arrow form (`table`, `arrow`).
//! - **Conversion**: Layer ↔ table conversion with per-record diagnostics,
//!   progress and cooperative cancellation (`convert`).
//! - **Raster sampling**: DTM elevation lookup with a no-data sentinel and
//!   one-time local materialization of remote rasters (`raster`).
//! - **Parameters**: Decoding of loosely shaped bounding boxes and ordered
//!   lists (`params`, `config`).
//!
//! Host layers, sinks, rasters and transforms are reached through the traits
//! of `geobridge-core-common`; geometry encoding lives in `geobridge-wkb`.

pub mod arrow;
pub mod config;
pub mod convert;
pub mod error;
pub mod params;
pub mod raster;
pub mod schema;
pub mod table;
pub mod utils;

pub use config::{ConversionOptions, ModelParameters, PointColumns};
pub use convert::{
    ConversionOutcome, ExportSummary, filter_ignored_units, layer_to_samples, layer_to_table,
    points_to_layer, require_fields, table_to_layer,
};
pub use error::{GeoBridgeError, Result};
pub use params::{BoundingBox, decode_bbox, decode_ordered_list, stratigraphic_column_table};
pub use raster::{DtmSampler, NODATA_SENTINEL, RasterMaterializer, SampleOutcome};
pub use schema::{infer_column_type, infer_schema};
pub use table::{GeoTable, GeometryColumn, SampleTable, SampledPoint};
