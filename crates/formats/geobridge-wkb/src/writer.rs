//! Encoding to WKB and WKT.
//!
//! The WKB stage is strict: line strings need at least two vertices and
//! polygon rings must be closed with at least four vertices. Geometries it
//! refuses may still be carried as WKT, which only requires finite
//! coordinates. [`to_wkb_or_wkt`] returns which stage produced the output so
//! callers know whether Z/M survived.

use geobridge_core_common::{Coord, Dimension, EncodedGeometry, Geometry};
use geozero::error::Result as GeozeroResult;
use geozero::{CoordDimensions, GeomProcessor, GeozeroGeometry, ToWkb, ToWkt};
use log::debug;

use crate::error::{CodecError, CodecResult};

/// Adapter exposing a [`Geometry`] to `geozero` processors.
#[derive(Debug, Clone, Copy)]
pub struct GeozeroGeom<'a>(pub &'a Geometry);

pub(crate) fn coord_dimensions(dimension: Dimension) -> CoordDimensions {
    CoordDimensions {
        z: dimension.has_z(),
        m: dimension.has_m(),
        t: false,
        tm: false,
    }
}

impl GeozeroGeometry for GeozeroGeom<'_> {
    fn process_geom<P: GeomProcessor>(&self, processor: &mut P) -> GeozeroResult<()> {
        process_geometry(self.0, 0, processor)
    }

    fn dims(&self) -> CoordDimensions {
        coord_dimensions(self.0.dimension())
    }
}

fn process_coord<P: GeomProcessor>(coord: &Coord, idx: usize, processor: &mut P) -> GeozeroResult<()> {
    if processor.multi_dim() {
        processor.coordinate(coord.x, coord.y, coord.z, coord.m, None, None, idx)
    } else {
        processor.xy(coord.x, coord.y, idx)
    }
}

fn process_line<P: GeomProcessor>(
    coords: &[Coord],
    tagged: bool,
    idx: usize,
    processor: &mut P,
) -> GeozeroResult<()> {
    processor.linestring_begin(tagged, coords.len(), idx)?;
    for (i, coord) in coords.iter().enumerate() {
        process_coord(coord, i, processor)?;
    }
    processor.linestring_end(tagged, idx)
}

fn process_polygon<P: GeomProcessor>(
    rings: &[Vec<Coord>],
    tagged: bool,
    idx: usize,
    processor: &mut P,
) -> GeozeroResult<()> {
    processor.polygon_begin(tagged, rings.len(), idx)?;
    for (i, ring) in rings.iter().enumerate() {
        process_line(ring, false, i, processor)?;
    }
    processor.polygon_end(tagged, idx)
}

fn process_geometry<P: GeomProcessor>(
    geometry: &Geometry,
    idx: usize,
    processor: &mut P,
) -> GeozeroResult<()> {
    match geometry {
        Geometry::Point(None) => processor.empty_point(idx),
        Geometry::Point(Some(coord)) => {
            processor.point_begin(idx)?;
            process_coord(coord, 0, processor)?;
            processor.point_end(idx)
        },
        Geometry::LineString(coords) => process_line(coords, true, idx, processor),
        Geometry::Polygon(rings) => process_polygon(rings, true, idx, processor),
        Geometry::MultiPoint(coords) => {
            processor.multipoint_begin(coords.len(), idx)?;
            for (i, coord) in coords.iter().enumerate() {
                process_coord(coord, i, processor)?;
            }
            processor.multipoint_end(idx)
        },
        Geometry::MultiLineString(lines) => {
            processor.multilinestring_begin(lines.len(), idx)?;
            for (i, line) in lines.iter().enumerate() {
                process_line(line, false, i, processor)?;
            }
            processor.multilinestring_end(idx)
        },
        Geometry::MultiPolygon(polygons) => {
            processor.multipolygon_begin(polygons.len(), idx)?;
            for (i, rings) in polygons.iter().enumerate() {
                process_polygon(rings, false, i, processor)?;
            }
            processor.multipolygon_end(idx)
        },
    }
}

fn check_line(coords: &[Coord]) -> CodecResult<()> {
    if coords.len() == 1 {
        return Err(CodecError::malformed("line string with a single vertex"));
    }
    Ok(())
}

fn check_ring(ring: &[Coord]) -> CodecResult<()> {
    if ring.is_empty() {
        return Ok(());
    }
    if ring.len() < 4 {
        return Err(CodecError::malformed(format!(
            "polygon ring with {} vertices (at least 4 required)",
            ring.len()
        )));
    }
    let (first, last) = (ring[0], ring[ring.len() - 1]);
    if first.x != last.x || first.y != last.y {
        return Err(CodecError::malformed("polygon ring is not closed"));
    }
    Ok(())
}

fn check_wkb_structure(geometry: &Geometry) -> CodecResult<()> {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => Ok(()),
        Geometry::LineString(coords) => check_line(coords),
        Geometry::MultiLineString(lines) => lines.iter().try_for_each(|line| check_line(line)),
        Geometry::Polygon(rings) => rings.iter().try_for_each(|ring| check_ring(ring)),
        Geometry::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .try_for_each(|ring| check_ring(ring)),
    }
}

/// Encode a geometry as WKB, keeping Z and M ordinates.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] for structurally invalid geometries and
/// [`CodecError::WkbEncode`] when the writer fails.
pub fn encode_wkb(geometry: &Geometry) -> CodecResult<Vec<u8>> {
    check_wkb_structure(geometry)?;
    let adapter = GeozeroGeom(geometry);
    adapter
        .to_wkb(adapter.dims())
        .map_err(|e| CodecError::WkbEncode {
            message: e.to_string(),
        })
}

/// Encode a geometry as 2D WKT.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] when a coordinate is not finite and
/// [`CodecError::WktEncode`] when the writer fails.
pub fn encode_wkt(geometry: &Geometry) -> CodecResult<String> {
    if geometry.vertices().iter().any(|c| !c.is_finite()) {
        return Err(CodecError::malformed("non-finite coordinate"));
    }
    GeozeroGeom(geometry)
        .to_wkt()
        .map_err(|e| CodecError::WktEncode {
            message: e.to_string(),
        })
}

/// Encode through WKB, falling back to WKT when WKB refuses the geometry.
///
/// # Errors
///
/// Returns [`CodecError::Unencodable`] carrying both failures when neither
/// stage succeeds.
pub fn to_wkb_or_wkt(geometry: &Geometry) -> CodecResult<EncodedGeometry> {
    match encode_wkb(geometry) {
        Ok(bytes) => Ok(EncodedGeometry::Wkb(bytes)),
        Err(wkb_err) => {
            debug!("WKB encoding failed, trying WKT: {wkb_err}");
            match encode_wkt(geometry) {
                Ok(text) => Ok(EncodedGeometry::Wkt(text)),
                Err(wkt_err) => Err(CodecError::Unencodable {
                    wkb: Box::new(wkb_err),
                    wkt: Box::new(wkt_err),
                }),
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(points: &[(f64, f64)]) -> Vec<Coord> {
        points.iter().map(|&(x, y)| Coord::xy(x, y)).collect()
    }

    #[test]
    fn point_wkb_layout() {
        let wkb = encode_wkb(&Geometry::Point(Some(Coord::xy(1.0, 2.0)))).unwrap();
        // byte order + type + two doubles
        assert_eq!(wkb.len(), 21);
        assert_eq!(wkb[0], 1);
        assert_eq!(u32::from_le_bytes([wkb[1], wkb[2], wkb[3], wkb[4]]), 1);
    }

    #[test]
    fn wkt_for_line() {
        let line = Geometry::LineString(coords(&[(0.0, 0.0), (1.0, 1.0)]));
        let text = encode_wkt(&line).unwrap();
        assert!(text.starts_with("LINESTRING"), "unexpected WKT: {text}");
        assert_eq!(crate::decode_wkt(&text).unwrap(), line);
    }

    #[test]
    fn unclosed_ring_falls_back_to_wkt() {
        let polygon = Geometry::Polygon(vec![coords(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ])]);

        assert!(matches!(
            encode_wkb(&polygon),
            Err(CodecError::Malformed { .. })
        ));
        let encoded = to_wkb_or_wkt(&polygon).unwrap();
        assert!(!encoded.is_exact());
        assert_eq!(encoded.stage_name(), "WKT");
    }

    #[test]
    fn both_stages_failing_is_unencodable() {
        let line = Geometry::LineString(vec![Coord::xy(f64::NAN, 0.0)]);
        assert!(matches!(
            to_wkb_or_wkt(&line),
            Err(CodecError::Unencodable { .. })
        ));
    }

    #[test]
    fn valid_geometry_uses_wkb() {
        let line = Geometry::LineString(vec![Coord::xyz(0.0, 0.0, 5.0), Coord::xyz(1.0, 0.0, 6.0)]);
        let encoded = to_wkb_or_wkt(&line).unwrap();
        assert!(encoded.is_exact());
    }
}
