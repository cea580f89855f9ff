//! WKB/WKT round trips across families and dimensions.

use geobridge_core_common::{Coord, EncodedGeometry, Geometry, GeometryFamily};
use geobridge_wkb::{
    CodecError, decode, decode_wkb, encode_wkb, infer_family, promote, to_wkb_or_wkt,
};

fn square(offset: f64, z: Option<f64>) -> Vec<Coord> {
    [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]
        .iter()
        .map(|&(x, y)| Coord {
            x: x + offset,
            y: y + offset,
            z,
            m: None,
        })
        .collect()
}

fn samples() -> Vec<Geometry> {
    vec![
        Geometry::Point(Some(Coord::xy(1.5, -2.5))),
        Geometry::Point(Some(Coord::xyz(1.5, -2.5, 310.0))),
        Geometry::LineString(vec![Coord::xy(0.0, 0.0), Coord::xy(3.0, 4.0)]),
        Geometry::Polygon(vec![square(0.0, None), square(0.25, None)]),
        Geometry::MultiPoint(vec![Coord::xyz(0.0, 0.0, 1.0), Coord::xyz(1.0, 1.0, 2.0)]),
        Geometry::MultiLineString(vec![
            vec![Coord::xy(0.0, 0.0), Coord::xy(1.0, 1.0), Coord::xy(2.0, 2.0)],
            vec![
                Coord::xy(5.0, 5.0),
                Coord::xy(6.0, 6.0),
                Coord::xy(7.0, 7.0),
                Coord::xy(8.0, 8.0),
            ],
        ]),
        Geometry::MultiPolygon(vec![vec![square(0.0, Some(10.0))], vec![square(5.0, Some(20.0))]]),
    ]
}

#[test]
fn wkb_round_trip_is_exact() {
    for geometry in samples() {
        let bytes = encode_wkb(&geometry).expect("encodable");
        let decoded = decode_wkb(&bytes).expect("decodable");
        assert_eq!(decoded, geometry, "round trip changed {geometry:?}");
        assert_eq!(decoded.dimension(), geometry.dimension());
    }
}

#[test]
fn fallback_stage_is_reported() {
    let open_ring = Geometry::Polygon(vec![vec![
        Coord::xy(0.0, 0.0),
        Coord::xy(4.0, 0.0),
        Coord::xy(4.0, 4.0),
        Coord::xy(0.0, 4.0),
    ]]);

    let encoded = to_wkb_or_wkt(&open_ring).expect("WKT fallback");
    let EncodedGeometry::Wkt(text) = &encoded else {
        panic!("expected WKT fallback, got {encoded:?}");
    };
    assert!(text.starts_with("POLYGON"));

    // The host receives the text and can still decode it.
    let decoded = decode(&encoded).expect("decodable WKT");
    assert_eq!(decoded.num_vertices(), 4);
}

#[test]
fn wkt_fallback_keeps_planar_coordinates() {
    let line_with_z = Geometry::LineString(vec![Coord::xyz(3.0, 4.0, 5.0)]);
    let encoded = to_wkb_or_wkt(&line_with_z).expect("WKT fallback");
    assert!(!encoded.is_exact());

    let decoded = decode(&encoded).expect("decodable WKT");
    let vertex = decoded.vertices()[0];
    assert_eq!((vertex.x, vertex.y), (3.0, 4.0));
}

#[test]
fn promoted_collection_encodes_with_one_type() {
    let geometries = samples()
        .into_iter()
        .filter(|g| g.family() == GeometryFamily::LineString)
        .collect::<Vec<_>>();
    let inference = infer_family(geometries.iter().map(Some));
    assert!(inference.geometry_type.multi);

    for geometry in geometries {
        let promoted = promote(geometry, inference.geometry_type.multi);
        let decoded = decode_wkb(&encode_wkb(&promoted).unwrap()).unwrap();
        assert!(decoded.is_multi());
    }
}

#[test]
fn decode_reports_format() {
    let err = decode(&EncodedGeometry::Wkb(vec![1, 2, 3])).unwrap_err();
    assert!(
        matches!(err, CodecError::Decode { format: "WKB", .. }),
        "unexpected error: {err}"
    );
}
