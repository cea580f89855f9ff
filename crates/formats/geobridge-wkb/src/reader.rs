//! Decoding WKB and WKT into [`Geometry`].

use geobridge_core_common::{Coord, EncodedGeometry, Geometry, Ring};
use geozero::error::{GeozeroError, Result as GeozeroResult};
use geozero::wkb::Wkb;
use geozero::wkt::Wkt;
use geozero::{CoordDimensions, GeomProcessor, GeozeroGeometry};

use crate::error::{CodecError, CodecResult};

/// `geozero` processor assembling a [`Geometry`].
///
/// Requests all dimensions from the reader so Z and M ordinates are kept
/// when the input carries them.
#[derive(Debug, Default)]
pub struct GeometryBuilder {
    geometry: Option<Geometry>,
    coords: Vec<Coord>,
    rings: Vec<Ring>,
    lines: Vec<Vec<Coord>>,
    polygons: Vec<Vec<Ring>>,
    in_multipoint: bool,
    in_polygon: bool,
}

impl GeometryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The assembled geometry.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] when the reader produced no geometry.
    pub fn finish(self, format: &'static str) -> CodecResult<Geometry> {
        self.geometry.ok_or(CodecError::Decode {
            format,
            message: "input contained no geometry".to_string(),
        })
    }

    fn push(&mut self, coord: Coord) {
        self.coords.push(coord);
    }
}

fn unsupported(kind: &str) -> GeozeroError {
    GeozeroError::Geometry(format!("{kind} is not supported"))
}

impl GeomProcessor for GeometryBuilder {
    fn dimensions(&self) -> CoordDimensions {
        CoordDimensions::xyzm()
    }

    fn xy(&mut self, x: f64, y: f64, _idx: usize) -> GeozeroResult<()> {
        self.push(Coord::xy(x, y));
        Ok(())
    }

    fn coordinate(
        &mut self,
        x: f64,
        y: f64,
        z: Option<f64>,
        m: Option<f64>,
        _t: Option<f64>,
        _tm: Option<u64>,
        _idx: usize,
    ) -> GeozeroResult<()> {
        self.push(Coord { x, y, z, m });
        Ok(())
    }

    fn empty_point(&mut self, _idx: usize) -> GeozeroResult<()> {
        if !self.in_multipoint {
            self.geometry = Some(Geometry::Point(None));
        }
        Ok(())
    }

    fn point_begin(&mut self, _idx: usize) -> GeozeroResult<()> {
        if !self.in_multipoint {
            self.coords.clear();
        }
        Ok(())
    }

    fn point_end(&mut self, _idx: usize) -> GeozeroResult<()> {
        if !self.in_multipoint {
            // WKB encodes POINT EMPTY as NaN coordinates
            let coord = self
                .coords
                .drain(..)
                .next()
                .filter(|c| !(c.x.is_nan() && c.y.is_nan()));
            self.geometry = Some(Geometry::Point(coord));
        }
        Ok(())
    }

    fn multipoint_begin(&mut self, size: usize, _idx: usize) -> GeozeroResult<()> {
        self.in_multipoint = true;
        self.coords = Vec::with_capacity(size);
        Ok(())
    }

    fn multipoint_end(&mut self, _idx: usize) -> GeozeroResult<()> {
        self.in_multipoint = false;
        let points = std::mem::take(&mut self.coords);
        self.geometry = Some(Geometry::MultiPoint(points));
        Ok(())
    }

    fn linestring_begin(&mut self, _tagged: bool, size: usize, _idx: usize) -> GeozeroResult<()> {
        self.coords = Vec::with_capacity(size);
        Ok(())
    }

    fn linestring_end(&mut self, tagged: bool, _idx: usize) -> GeozeroResult<()> {
        let coords = std::mem::take(&mut self.coords);
        if tagged {
            self.geometry = Some(Geometry::LineString(coords));
        } else if self.in_polygon {
            self.rings.push(coords);
        } else {
            self.lines.push(coords);
        }
        Ok(())
    }

    fn multilinestring_begin(&mut self, size: usize, _idx: usize) -> GeozeroResult<()> {
        self.lines = Vec::with_capacity(size);
        Ok(())
    }

    fn multilinestring_end(&mut self, _idx: usize) -> GeozeroResult<()> {
        let lines = std::mem::take(&mut self.lines);
        self.geometry = Some(Geometry::MultiLineString(lines));
        Ok(())
    }

    fn polygon_begin(&mut self, _tagged: bool, size: usize, _idx: usize) -> GeozeroResult<()> {
        self.in_polygon = true;
        self.rings = Vec::with_capacity(size);
        Ok(())
    }

    fn polygon_end(&mut self, tagged: bool, _idx: usize) -> GeozeroResult<()> {
        self.in_polygon = false;
        let rings = std::mem::take(&mut self.rings);
        if tagged {
            self.geometry = Some(Geometry::Polygon(rings));
        } else {
            self.polygons.push(rings);
        }
        Ok(())
    }

    fn multipolygon_begin(&mut self, size: usize, _idx: usize) -> GeozeroResult<()> {
        self.polygons = Vec::with_capacity(size);
        Ok(())
    }

    fn multipolygon_end(&mut self, _idx: usize) -> GeozeroResult<()> {
        let polygons = std::mem::take(&mut self.polygons);
        self.geometry = Some(Geometry::MultiPolygon(polygons));
        Ok(())
    }

    fn geometrycollection_begin(&mut self, _size: usize, _idx: usize) -> GeozeroResult<()> {
        Err(unsupported("GeometryCollection"))
    }
}

fn decode_error(format: &'static str, err: &GeozeroError) -> CodecError {
    match err {
        GeozeroError::Geometry(message) if message.ends_with("is not supported") => {
            CodecError::Unsupported {
                geometry_type: message.trim_end_matches(" is not supported").to_string(),
            }
        },
        other => CodecError::Decode {
            format,
            message: other.to_string(),
        },
    }
}

/// Decode ISO WKB or EWKB bytes.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed input and
/// [`CodecError::Unsupported`] for geometry collections.
pub fn decode_wkb(bytes: &[u8]) -> CodecResult<Geometry> {
    let mut builder = GeometryBuilder::new();
    Wkb(bytes.to_vec())
        .process_geom(&mut builder)
        .map_err(|e| decode_error("WKB", &e))?;
    builder.finish("WKB")
}

/// Decode WKT text.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed input and
/// [`CodecError::Unsupported`] for geometry collections.
pub fn decode_wkt(text: &str) -> CodecResult<Geometry> {
    let mut builder = GeometryBuilder::new();
    Wkt(text.to_string())
        .process_geom(&mut builder)
        .map_err(|e| decode_error("WKT", &e))?;
    builder.finish("WKT")
}

/// Decode whichever encoding the host supplied.
///
/// # Errors
///
/// See [`decode_wkb`] and [`decode_wkt`].
pub fn decode(encoded: &EncodedGeometry) -> CodecResult<Geometry> {
    match encoded {
        EncodedGeometry::Wkb(bytes) => decode_wkb(bytes),
        EncodedGeometry::Wkt(text) => decode_wkt(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::encode_wkb;

    #[test]
    fn decodes_wkt_polygon_with_hole() {
        let geometry = decode_wkt(
            "POLYGON((0 0,10 0,10 10,0 10,0 0),(2 2,3 2,3 3,2 2))",
        )
        .unwrap();

        let Geometry::Polygon(rings) = &geometry else {
            panic!("expected polygon, got {geometry:?}");
        };
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].len(), 5);
        assert_eq!(rings[1][1], Coord::xy(3.0, 2.0));
    }

    #[test]
    fn decodes_wkt_multilinestring() {
        let geometry = decode_wkt("MULTILINESTRING((0 0,1 1,2 2),(5 5,6 6,7 7,8 8))").unwrap();
        assert!(geometry.is_multi());
        assert_eq!(geometry.num_parts(), 2);
        assert_eq!(geometry.num_vertices(), 7);
    }

    #[test]
    fn keeps_z_through_wkb() {
        let line = Geometry::LineString(vec![Coord::xyz(0.0, 0.0, 100.0), Coord::xyz(1.0, 1.0, 110.0)]);
        let decoded = decode_wkb(&encode_wkb(&line).unwrap()).unwrap();
        assert_eq!(decoded, line);
    }

    #[test]
    fn rejects_geometry_collection() {
        let err = decode_wkt("GEOMETRYCOLLECTION(POINT(1 2))").unwrap_err();
        assert!(
            matches!(err, CodecError::Unsupported { ref geometry_type } if geometry_type == "GeometryCollection"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn rejects_truncated_wkb() {
        let wkb = encode_wkb(&Geometry::Point(Some(Coord::xy(1.0, 2.0)))).unwrap();
        assert!(decode_wkb(&wkb[..10]).is_err());
    }

    #[test]
    fn rejects_garbage_wkt() {
        assert!(decode_wkt("not a geometry").is_err());
    }
}
