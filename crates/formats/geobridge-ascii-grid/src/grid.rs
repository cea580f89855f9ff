//! In-memory raster grid.

use geobridge_core_common::{Crs, Identify, RasterSource};

use crate::error::{GridError, GridResult};

/// A single-band north-up raster.
///
/// Cells are stored row-major starting with the northernmost row, the same
/// order an ASCII grid lists them in.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRaster {
    ncols: usize,
    nrows: usize,
    xllcorner: f64,
    yllcorner: f64,
    cellsize: f64,
    nodata: Option<f64>,
    values: Vec<f64>,
    crs: Option<Crs>,
    source_id: String,
}

impl GridRaster {
    /// Create a grid from its lower-left corner, cell size and cell values.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Invalid`] when the dimensions are zero, the cell
    /// size is not positive or `values` does not hold `ncols * nrows` cells.
    pub fn new(
        ncols: usize,
        nrows: usize,
        xllcorner: f64,
        yllcorner: f64,
        cellsize: f64,
        values: Vec<f64>,
    ) -> GridResult<Self> {
        if ncols == 0 || nrows == 0 {
            return Err(GridError::Invalid {
                message: format!("grid must have at least one cell, got {ncols}x{nrows}"),
            });
        }
        if !(cellsize.is_finite() && cellsize > 0.0) {
            return Err(GridError::Invalid {
                message: format!("cell size must be positive, got {cellsize}"),
            });
        }
        let cells = ncols.checked_mul(nrows).ok_or_else(|| GridError::Invalid {
            message: format!("grid of {ncols}x{nrows} cells is too large"),
        })?;
        if values.len() != cells {
            return Err(GridError::Invalid {
                message: format!(
                    "expected {cells} cell values for a {ncols}x{nrows} grid, got {}",
                    values.len()
                ),
            });
        }
        Ok(Self {
            ncols,
            nrows,
            xllcorner,
            yllcorner,
            cellsize,
            nodata: None,
            values,
            crs: None,
            source_id: String::new(),
        })
    }

    #[must_use]
    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    #[must_use]
    pub fn with_crs(mut self, crs: Option<Crs>) -> Self {
        self.crs = crs;
        self
    }

    #[must_use]
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    #[must_use]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[must_use]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[must_use]
    pub fn cellsize(&self) -> f64 {
        self.cellsize
    }

    #[must_use]
    pub fn lower_left(&self) -> (f64, f64) {
        (self.xllcorner, self.yllcorner)
    }

    #[must_use]
    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Extent as `(minx, miny, maxx, maxy)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        (
            self.xllcorner,
            self.yllcorner,
            self.xllcorner + self.ncols as f64 * self.cellsize,
            self.yllcorner + self.nrows as f64 * self.cellsize,
        )
    }

    /// Row and column of the cell containing `(x, y)`.
    ///
    /// Cells include their west and south edges; points on the grid's east
    /// or north boundary fall outside.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn cell_index(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (minx, miny, maxx, maxy) = self.extent();
        if !(x >= minx && x < maxx && y >= miny && y < maxy) {
            return None;
        }
        let col = (((x - minx) / self.cellsize).floor() as usize).min(self.ncols - 1);
        let row_from_south = (((y - miny) / self.cellsize).floor() as usize).min(self.nrows - 1);
        Some((self.nrows - 1 - row_from_south, col))
    }

    /// Cell value at `(x, y)`; `None` outside the grid or on no-data cells.
    #[must_use]
    pub fn value_at(&self, x: f64, y: f64) -> Option<f64> {
        let (row, col) = self.cell_index(x, y)?;
        let value = self.values[row * self.ncols + col];
        if value.is_nan() || self.nodata.is_some_and(|nodata| value == nodata) {
            None
        } else {
            Some(value)
        }
    }
}

impl RasterSource for GridRaster {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn crs(&self) -> Option<Crs> {
        self.crs.clone()
    }

    fn identify(&self, x: f64, y: f64) -> Identify {
        self.value_at(x, y)
            .map_or_else(Identify::no_data, Identify::value)
    }
}
