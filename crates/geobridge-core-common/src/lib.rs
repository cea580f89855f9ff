//! Common types and traits shared across `GeoBridge` crates.
//!
//! This crate provides the data model (tagged field values, field schemas,
//! the geometry union and coordinate reference systems) together with the
//! traits a GIS host implements to hand layers and rasters to the converters.
//! It sits below `geobridge-core` and the format crates, preventing circular
//! dependencies.

pub mod crs;
pub mod geometry;
pub mod io;
pub mod memory;
pub mod value;

// Re-export commonly used types
pub use crs::Crs;
pub use geometry::{
    Coord, Dimension, EncodedGeometry, Geometry, GeometryFamily, GeometryType, Ring,
};
pub use io::{
    CoordinateTransform, Feature, FeatureSink, FeatureSinkProvider, FeatureSource, Feedback,
    Identify, LogFeedback, NoFeedback, RasterSource,
};
pub use memory::{MemoryLayer, MemorySinkProvider, RecordingFeedback};
pub use value::{FieldDef, FieldSchema, FieldValue, LogicalType, parse_timestamp};
