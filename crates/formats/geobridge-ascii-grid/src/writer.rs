//! ESRI ASCII grid serialization.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use geobridge_core_common::{Crs, RasterSource};
use log::info;

use crate::error::{GridError, GridResult};
use crate::grid::GridRaster;

/// Render a grid as ESRI ASCII grid text.
#[must_use]
pub fn write_ascii_grid(grid: &GridRaster) -> String {
    let (xll, yll) = grid.lower_left();
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "ncols {}", grid.ncols());
    let _ = writeln!(out, "nrows {}", grid.nrows());
    let _ = writeln!(out, "xllcorner {xll}");
    let _ = writeln!(out, "yllcorner {yll}");
    let _ = writeln!(out, "cellsize {}", grid.cellsize());
    if let Some(nodata) = grid.nodata() {
        let _ = writeln!(out, "nodata_value {nodata}");
    }
    for row in grid.values().chunks(grid.ncols()) {
        let line = row
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn prj_text(crs: &Crs) -> String {
    match crs {
        Crs::Wkt(wkt) => wkt.clone(),
        other => other.to_string(),
    }
}

/// Write a grid to `path`, plus a `.prj` sidecar when the grid has a CRS.
///
/// # Errors
///
/// Returns [`GridError::Io`] when either file cannot be written.
pub fn write_ascii_grid_file(grid: &GridRaster, path: impl AsRef<Path>) -> GridResult<()> {
    let path = path.as_ref();
    fs::write(path, write_ascii_grid(grid)).map_err(|e| GridError::io(path, e))?;

    if let Some(crs) = grid.crs() {
        let prj = path.with_extension("prj");
        fs::write(&prj, prj_text(&crs)).map_err(|e| GridError::io(&prj, e))?;
    }

    info!(
        "wrote {}x{} ASCII grid to {}",
        grid.ncols(),
        grid.nrows(),
        path.display()
    );
    Ok(())
}
