//! Portable geometry representation.
//!
//! [`Geometry`] is a closed tagged union over the point, line and polygon
//! families in single and multi-part form. Every coordinate optionally carries
//! Z and M ordinates, so the dimensionality (XY, XYZ, XYM, XYZM) travels with
//! the data rather than with a separate type tag.

use std::fmt;

/// A vertex with optional elevation (Z) and measure (M).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl Coord {
    #[must_use]
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: None,
        }
    }

    #[must_use]
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            m: None,
        }
    }

    #[must_use]
    pub fn xym(x: f64, y: f64, m: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: Some(m),
        }
    }

    #[must_use]
    pub fn xyzm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            m: Some(m),
        }
    }

    #[must_use]
    pub fn dimension(&self) -> Dimension {
        Dimension::from_flags(self.z.is_some(), self.m.is_some())
    }

    /// True when every present ordinate is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_none_or(f64::is_finite)
            && self.m.is_none_or(f64::is_finite)
    }
}

/// Base shape of a geometry, ignoring multiplicity and dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryFamily {
    Point,
    LineString,
    Polygon,
}

impl GeometryFamily {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
        }
    }
}

/// Coordinate dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    #[default]
    Xy,
    Xyz,
    Xym,
    Xyzm,
}

impl Dimension {
    #[must_use]
    pub fn from_flags(has_z: bool, has_m: bool) -> Self {
        match (has_z, has_m) {
            (false, false) => Self::Xy,
            (true, false) => Self::Xyz,
            (false, true) => Self::Xym,
            (true, true) => Self::Xyzm,
        }
    }

    #[must_use]
    pub fn has_z(self) -> bool {
        matches!(self, Self::Xyz | Self::Xyzm)
    }

    #[must_use]
    pub fn has_m(self) -> bool {
        matches!(self, Self::Xym | Self::Xyzm)
    }

    fn iso_offset(self) -> u32 {
        match self {
            Self::Xy => 0,
            Self::Xyz => 1000,
            Self::Xym => 2000,
            Self::Xyzm => 3000,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Xy => "",
            Self::Xyz => "Z",
            Self::Xym => "M",
            Self::Xyzm => "ZM",
        }
    }
}

/// The WKB type of a whole collection: family, multiplicity and dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryType {
    pub family: GeometryFamily,
    pub multi: bool,
    pub dimension: Dimension,
}

impl GeometryType {
    #[must_use]
    pub fn new(family: GeometryFamily, multi: bool, dimension: Dimension) -> Self {
        Self {
            family,
            multi,
            dimension,
        }
    }

    #[must_use]
    pub fn with_multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    /// ISO WKB geometry type code, e.g. 1005 for `MultiLineStringZ`.
    #[must_use]
    pub fn wkb_code(&self) -> u32 {
        let base = match (self.family, self.multi) {
            (GeometryFamily::Point, false) => 1,
            (GeometryFamily::LineString, false) => 2,
            (GeometryFamily::Polygon, false) => 3,
            (GeometryFamily::Point, true) => 4,
            (GeometryFamily::LineString, true) => 5,
            (GeometryFamily::Polygon, true) => 6,
        };
        base + self.dimension.iso_offset()
    }

    /// Whether a geometry can be written to a collection of this type,
    /// possibly after promotion to multi-part.
    #[must_use]
    pub fn accepts(&self, geometry: &Geometry) -> bool {
        geometry.family() == self.family && (self.multi || !geometry.is_multi())
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let multi = if self.multi { "Multi" } else { "" };
        write!(
            f,
            "{multi}{}{}",
            self.family.name(),
            self.dimension.suffix()
        )
    }
}

/// A closed ring of a polygon.
pub type Ring = Vec<Coord>;

/// Geometry value.
///
/// Polygons store their exterior ring first followed by interior rings.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A point; `None` is the empty point.
    Point(Option<Coord>),
    LineString(Vec<Coord>),
    Polygon(Vec<Ring>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    #[must_use]
    pub fn family(&self) -> GeometryFamily {
        match self {
            Self::Point(_) | Self::MultiPoint(_) => GeometryFamily::Point,
            Self::LineString(_) | Self::MultiLineString(_) => GeometryFamily::LineString,
            Self::Polygon(_) | Self::MultiPolygon(_) => GeometryFamily::Polygon,
        }
    }

    #[must_use]
    pub fn is_multi(&self) -> bool {
        matches!(
            self,
            Self::MultiPoint(_) | Self::MultiLineString(_) | Self::MultiPolygon(_)
        )
    }

    /// True when the geometry has no vertices at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_coord().is_none()
    }

    fn first_coord(&self) -> Option<&Coord> {
        match self {
            Self::Point(coord) => coord.as_ref(),
            Self::LineString(coords) | Self::MultiPoint(coords) => coords.first(),
            Self::Polygon(rings) | Self::MultiLineString(rings) => rings.iter().flatten().next(),
            Self::MultiPolygon(polygons) => polygons.iter().flatten().flatten().next(),
        }
    }

    /// Dimensionality of the geometry, taken from its first vertex.
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.first_coord()
            .map(Coord::dimension)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn geometry_type(&self) -> GeometryType {
        GeometryType::new(self.family(), self.is_multi(), self.dimension())
    }

    /// Number of single-part members (1 for single geometries).
    #[must_use]
    pub fn num_parts(&self) -> usize {
        match self {
            Self::Point(_) | Self::LineString(_) | Self::Polygon(_) => 1,
            Self::MultiPoint(points) => points.len(),
            Self::MultiLineString(lines) => lines.len(),
            Self::MultiPolygon(polygons) => polygons.len(),
        }
    }

    /// Every vertex in traversal order.
    ///
    /// Lines yield their vertices with parts concatenated; polygons yield the
    /// vertices of every ring, exterior first, with parts concatenated.
    #[must_use]
    pub fn vertices(&self) -> Vec<Coord> {
        match self {
            Self::Point(coord) => coord.iter().copied().collect(),
            Self::LineString(coords) | Self::MultiPoint(coords) => coords.clone(),
            Self::Polygon(rings) | Self::MultiLineString(rings) => {
                rings.iter().flatten().copied().collect()
            },
            Self::MultiPolygon(polygons) => polygons.iter().flatten().flatten().copied().collect(),
        }
    }

    #[must_use]
    pub fn num_vertices(&self) -> usize {
        match self {
            Self::Point(coord) => usize::from(coord.is_some()),
            Self::LineString(coords) | Self::MultiPoint(coords) => coords.len(),
            Self::Polygon(rings) | Self::MultiLineString(rings) => rings.iter().map(Vec::len).sum(),
            Self::MultiPolygon(polygons) => polygons.iter().flatten().map(Vec::len).sum(),
        }
    }

    /// Wrap a single-part geometry in its multi-part container.
    ///
    /// Multi-part geometries are returned unchanged. The empty point becomes
    /// an empty multi-point.
    #[must_use]
    pub fn into_multi(self) -> Self {
        match self {
            Self::Point(coord) => Self::MultiPoint(coord.into_iter().collect()),
            Self::LineString(coords) => Self::MultiLineString(vec![coords]),
            Self::Polygon(rings) => Self::MultiPolygon(vec![rings]),
            multi => multi,
        }
    }
}

/// Geometry serialized for the host boundary.
///
/// WKB is exact and keeps Z/M. WKT is the fallback encoding and may have
/// dropped Z/M, which is why the variant is kept visible to callers.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedGeometry {
    Wkb(Vec<u8>),
    Wkt(String),
}

impl EncodedGeometry {
    /// True for the exact (WKB) encoding.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Wkb(_))
    }

    #[must_use]
    pub fn stage_name(&self) -> &'static str {
        match self {
            Self::Wkb(_) => "WKB",
            Self::Wkt(_) => "WKT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(coords: &[(f64, f64)]) -> Vec<Coord> {
        coords.iter().map(|&(x, y)| Coord::xy(x, y)).collect()
    }

    #[test]
    fn geometry_type_names_and_codes() {
        let ty = GeometryType::new(GeometryFamily::LineString, true, Dimension::Xyz);
        assert_eq!(ty.to_string(), "MultiLineStringZ");
        assert_eq!(ty.wkb_code(), 1005);

        let ty = GeometryType::new(GeometryFamily::Point, false, Dimension::Xym);
        assert_eq!(ty.to_string(), "PointM");
        assert_eq!(ty.wkb_code(), 2001);

        let ty = GeometryType::new(GeometryFamily::Polygon, false, Dimension::Xy);
        assert_eq!(ty.wkb_code(), 3);
    }

    #[test]
    fn polygon_vertices_walk_exterior_then_interiors() {
        let exterior = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)]);
        let hole = line(&[(2.0, 2.0), (3.0, 2.0), (3.0, 3.0), (2.0, 2.0)]);
        let polygon = Geometry::Polygon(vec![exterior.clone(), hole.clone()]);

        let vertices = polygon.vertices();
        assert_eq!(vertices.len(), 8);
        assert_eq!(vertices[..4], exterior[..]);
        assert_eq!(vertices[4..], hole[..]);
        assert_eq!(polygon.num_vertices(), 8);
    }

    #[test]
    fn multi_line_vertices_concatenate_parts() {
        let geometry = Geometry::MultiLineString(vec![
            line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]),
            line(&[(5.0, 5.0), (6.0, 6.0), (7.0, 7.0), (8.0, 8.0)]),
        ]);
        assert_eq!(geometry.vertices().len(), 7);
        assert_eq!(geometry.num_parts(), 2);
    }

    #[test]
    fn empty_detection() {
        assert!(Geometry::Point(None).is_empty());
        assert!(Geometry::MultiPolygon(vec![vec![]]).is_empty());
        assert!(!Geometry::Point(Some(Coord::xy(1.0, 2.0))).is_empty());
        assert_eq!(Geometry::LineString(vec![]).dimension(), Dimension::Xy);
    }

    #[test]
    fn dimension_follows_first_vertex() {
        let geometry = Geometry::LineString(vec![
            Coord::xyzm(0.0, 0.0, 1.0, 2.0),
            Coord::xyzm(1.0, 0.0, 1.0, 3.0),
        ]);
        assert_eq!(geometry.dimension(), Dimension::Xyzm);
        assert_eq!(geometry.geometry_type().to_string(), "LineStringZM");
    }

    #[test]
    fn into_multi_wraps_single_parts_only() {
        let point = Geometry::Point(Some(Coord::xy(1.0, 2.0)));
        assert_eq!(
            point.into_multi(),
            Geometry::MultiPoint(vec![Coord::xy(1.0, 2.0)])
        );

        let multi = Geometry::MultiLineString(vec![line(&[(0.0, 0.0), (1.0, 1.0)])]);
        assert_eq!(multi.clone().into_multi(), multi);
    }

    #[test]
    fn collection_type_accepts_promotable_members() {
        let ty = GeometryType::new(GeometryFamily::LineString, true, Dimension::Xy);
        assert!(ty.accepts(&Geometry::LineString(line(&[(0.0, 0.0), (1.0, 1.0)]))));
        assert!(!ty.accepts(&Geometry::Point(Some(Coord::xy(0.0, 0.0)))));

        let single = ty.with_multi(false);
        assert!(!single.accepts(&Geometry::MultiLineString(vec![])));
    }

    #[test]
    fn non_finite_coords() {
        assert!(Coord::xyz(1.0, 2.0, 3.0).is_finite());
        assert!(!Coord::xy(f64::NAN, 2.0).is_finite());
        assert!(!Coord::xym(1.0, 2.0, f64::INFINITY).is_finite());
    }
}
