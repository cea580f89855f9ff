//! ESRI ASCII grid parsing.

use std::fs;
use std::path::Path;

use geobridge_core_common::Crs;
use log::debug;

use crate::error::{GridError, GridResult};
use crate::grid::GridRaster;

#[derive(Debug, Default)]
struct Header {
    ncols: Option<usize>,
    nrows: Option<usize>,
    xll: Option<(f64, bool)>,
    yll: Option<(f64, bool)>,
    cellsize: Option<f64>,
    nodata: Option<f64>,
}

fn parse_number<T: std::str::FromStr>(line: usize, key: &str, value: &str) -> GridResult<T> {
    value
        .parse::<T>()
        .map_err(|_| GridError::parse(line, format!("invalid {key} value '{value}'")))
}

/// Parse an ESRI ASCII grid from text.
///
/// Header keys are case-insensitive. `xllcenter`/`yllcenter` are accepted and
/// converted to corner coordinates; `nodata_value` is optional.
///
/// # Errors
///
/// Returns [`GridError::Parse`] when a header entry or cell value is
/// malformed, and [`GridError::Invalid`] when the number of cells does not
/// match the header dimensions.
pub fn read_ascii_grid(text: &str) -> GridResult<GridRaster> {
    let mut header = Header::default();
    let mut values = Vec::new();
    let mut in_body = false;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let first = trimmed.split_whitespace().next().unwrap_or_default();
        let is_header = !in_body && first.chars().next().is_some_and(char::is_alphabetic);
        if is_header {
            let mut parts = trimmed.split_whitespace();
            let key = parts.next().unwrap_or_default().to_ascii_lowercase();
            let value = parts
                .next()
                .ok_or_else(|| GridError::parse(line, format!("missing value for {key}")))?;
            match key.as_str() {
                "ncols" => header.ncols = Some(parse_number(line, &key, value)?),
                "nrows" => header.nrows = Some(parse_number(line, &key, value)?),
                "xllcorner" => header.xll = Some((parse_number(line, &key, value)?, false)),
                "xllcenter" => header.xll = Some((parse_number(line, &key, value)?, true)),
                "yllcorner" => header.yll = Some((parse_number(line, &key, value)?, false)),
                "yllcenter" => header.yll = Some((parse_number(line, &key, value)?, true)),
                "cellsize" => header.cellsize = Some(parse_number(line, &key, value)?),
                "nodata_value" => header.nodata = Some(parse_number(line, &key, value)?),
                other => {
                    return Err(GridError::parse(line, format!("unknown header key '{other}'")));
                },
            }
            continue;
        }

        in_body = true;
        for token in trimmed.split_whitespace() {
            values.push(parse_number::<f64>(line, "cell", token)?);
        }
    }

    let missing = |key: &str| GridError::parse(1, format!("missing header entry {key}"));
    let ncols = header.ncols.ok_or_else(|| missing("ncols"))?;
    let nrows = header.nrows.ok_or_else(|| missing("nrows"))?;
    let cellsize = header.cellsize.ok_or_else(|| missing("cellsize"))?;
    let (xll, x_center) = header.xll.ok_or_else(|| missing("xllcorner"))?;
    let (yll, y_center) = header.yll.ok_or_else(|| missing("yllcorner"))?;
    let half = cellsize / 2.0;
    let xllcorner = if x_center { xll - half } else { xll };
    let yllcorner = if y_center { yll - half } else { yll };

    debug!("parsed ASCII grid {ncols}x{nrows} with cell size {cellsize}");

    let grid = GridRaster::new(ncols, nrows, xllcorner, yllcorner, cellsize, values)?;
    Ok(match header.nodata {
        Some(nodata) => grid.with_nodata(nodata),
        None => grid,
    })
}

/// Read an ESRI ASCII grid file and its optional `.prj` sidecar.
///
/// The grid's source id is the file path.
///
/// # Errors
///
/// Returns [`GridError::Io`] when the grid cannot be read, plus any error
/// from [`read_ascii_grid`].
pub fn read_ascii_grid_file(path: impl AsRef<Path>) -> GridResult<GridRaster> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| GridError::io(path, e))?;

    let prj = path.with_extension("prj");
    let crs = if prj.exists() {
        let definition = fs::read_to_string(&prj).map_err(|e| GridError::io(&prj, e))?;
        Crs::parse(&definition)
    } else {
        None
    };

    Ok(read_ascii_grid(&text)?
        .with_crs(crs)
        .with_source_id(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
NCOLS 2
NROWS 2
XLLCORNER 10
YLLCORNER 20
CELLSIZE 5
NODATA_VALUE -9999
1.5 2.5
-9999 4
";

    #[test]
    fn parses_header_and_cells() {
        let grid = read_ascii_grid(SAMPLE).unwrap();
        assert_eq!((grid.ncols(), grid.nrows()), (2, 2));
        assert_eq!(grid.lower_left(), (10.0, 20.0));
        assert_eq!(grid.nodata(), Some(-9999.0));
        assert_eq!(grid.value_at(11.0, 29.0), Some(1.5));
        assert_eq!(grid.value_at(11.0, 21.0), None);
        assert_eq!(grid.value_at(16.0, 21.0), Some(4.0));
    }

    #[test]
    fn center_registration_is_shifted_to_corner() {
        let text = "ncols 1\nnrows 1\nxllcenter 5\nyllcenter 5\ncellsize 10\n7\n";
        let grid = read_ascii_grid(text).unwrap();
        assert_eq!(grid.lower_left(), (0.0, 0.0));
        assert_eq!(grid.nodata(), None);
    }

    #[test]
    fn reports_line_of_bad_cell() {
        let text = "ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 x\n";
        match read_ascii_grid(text) {
            Err(GridError::Parse { line, .. }) => assert_eq!(line, 6),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn short_body_is_invalid() {
        let text = "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3\n";
        assert!(matches!(
            read_ascii_grid(text),
            Err(GridError::Invalid { .. })
        ));
    }

    #[test]
    fn oversized_header_is_invalid() {
        let text = "ncols 4294967296\nnrows 4294967296\nxllcorner 0\nyllcorner 0\ncellsize 1\n";
        let err = read_ascii_grid(text).unwrap_err();
        assert!(matches!(err, GridError::Invalid { .. }));
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn missing_header_is_reported() {
        let err = read_ascii_grid("ncols 1\nnrows 1\n1\n").unwrap_err();
        assert!(err.to_string().contains("cellsize"));
    }
}
