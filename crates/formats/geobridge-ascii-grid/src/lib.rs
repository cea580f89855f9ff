//! ESRI ASCII grid support.
//!
//! The ASCII grid is the local, random-access copy a non-random-access
//! raster is materialized into before point sampling. [`GridRaster`] holds
//! the decoded cells and answers point identification through
//! [`geobridge_core_common::RasterSource`].

pub mod error;
pub mod grid;
pub mod reader;
pub mod writer;

pub use error::{GridError, GridResult};
pub use grid::GridRaster;
pub use reader::{read_ascii_grid, read_ascii_grid_file};
pub use writer::{write_ascii_grid, write_ascii_grid_file};
