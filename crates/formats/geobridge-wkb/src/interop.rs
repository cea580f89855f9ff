//! Conversions to and from `geo-types`.
//!
//! Geological algorithms written against the georust ecosystem work on 2D
//! `geo_types::Geometry<f64>`. Converting to it drops Z and M; converting
//! back yields XY coordinates.

use geo_types::{
    Coord as GeoCoord, Geometry as GeoGeometry, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};
use geobridge_core_common::{Coord, Geometry, Ring};

use crate::error::{CodecError, CodecResult};

fn to_geo_coord(coord: &Coord) -> GeoCoord<f64> {
    GeoCoord {
        x: coord.x,
        y: coord.y,
    }
}

fn to_line_string(coords: &[Coord]) -> LineString<f64> {
    LineString::new(coords.iter().map(to_geo_coord).collect())
}

fn to_polygon(rings: &[Ring]) -> Polygon<f64> {
    let mut rings = rings.iter().map(|ring| to_line_string(ring));
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.collect())
}

/// Project a geometry onto a 2D `geo-types` geometry.
///
/// Returns `None` for the empty point, which `geo-types` cannot represent.
#[must_use]
pub fn to_geo_types(geometry: &Geometry) -> Option<GeoGeometry<f64>> {
    let converted = match geometry {
        Geometry::Point(coord) => GeoGeometry::Point(Point::from(to_geo_coord(coord.as_ref()?))),
        Geometry::LineString(coords) => GeoGeometry::LineString(to_line_string(coords)),
        Geometry::Polygon(rings) => GeoGeometry::Polygon(to_polygon(rings)),
        Geometry::MultiPoint(coords) => GeoGeometry::MultiPoint(MultiPoint(
            coords.iter().map(|c| Point::from(to_geo_coord(c))).collect(),
        )),
        Geometry::MultiLineString(lines) => GeoGeometry::MultiLineString(MultiLineString(
            lines.iter().map(|line| to_line_string(line)).collect(),
        )),
        Geometry::MultiPolygon(polygons) => GeoGeometry::MultiPolygon(MultiPolygon(
            polygons.iter().map(|rings| to_polygon(rings)).collect(),
        )),
    };
    Some(converted)
}

fn from_line_string(line: &LineString<f64>) -> Vec<Coord> {
    line.coords().map(|c| Coord::xy(c.x, c.y)).collect()
}

fn from_polygon(polygon: &Polygon<f64>) -> Vec<Ring> {
    let mut rings = Vec::with_capacity(polygon.interiors().len() + 1);
    if !polygon.exterior().0.is_empty() {
        rings.push(from_line_string(polygon.exterior()));
    }
    rings.extend(polygon.interiors().iter().map(from_line_string));
    rings
}

/// Convert a `geo-types` geometry into the portable representation.
///
/// Lines become two-vertex line strings; rectangles and triangles become
/// polygons.
///
/// # Errors
///
/// Returns [`CodecError::Unsupported`] for geometry collections.
pub fn from_geo_types(geometry: &GeoGeometry<f64>) -> CodecResult<Geometry> {
    let converted = match geometry {
        GeoGeometry::Point(point) => Geometry::Point(Some(Coord::xy(point.x(), point.y()))),
        GeoGeometry::Line(line) => Geometry::LineString(vec![
            Coord::xy(line.start.x, line.start.y),
            Coord::xy(line.end.x, line.end.y),
        ]),
        GeoGeometry::LineString(line) => Geometry::LineString(from_line_string(line)),
        GeoGeometry::Polygon(polygon) => Geometry::Polygon(from_polygon(polygon)),
        GeoGeometry::MultiPoint(points) => Geometry::MultiPoint(
            points.0.iter().map(|p| Coord::xy(p.x(), p.y())).collect(),
        ),
        GeoGeometry::MultiLineString(lines) => {
            Geometry::MultiLineString(lines.0.iter().map(from_line_string).collect())
        },
        GeoGeometry::MultiPolygon(polygons) => {
            Geometry::MultiPolygon(polygons.0.iter().map(from_polygon).collect())
        },
        GeoGeometry::Rect(rect) => Geometry::Polygon(from_polygon(&rect.to_polygon())),
        GeoGeometry::Triangle(triangle) => Geometry::Polygon(from_polygon(&triangle.to_polygon())),
        GeoGeometry::GeometryCollection(_) => {
            return Err(CodecError::Unsupported {
                geometry_type: "GeometryCollection".to_string(),
            });
        },
    };
    Ok(converted)
}
