//! End-to-end layer ↔ table conversions against the in-memory host.

use geobridge_core::error::ResourceError;
use geobridge_core::{
    ConversionOptions, GeoBridgeError, GeoTable, GeometryColumn, layer_to_samples, layer_to_table,
    table_to_layer,
};
use geobridge_core_common::{
    Coord, Crs, EncodedGeometry, Feature, FieldValue, Geometry, MemoryLayer, MemorySinkProvider,
    NoFeedback, RecordingFeedback,
};
use geobridge_wkb::{decode, encode_wkb};

fn wkb(geometry: &Geometry) -> EncodedGeometry {
    EncodedGeometry::Wkb(encode_wkb(geometry).unwrap())
}

fn contact(fid: i64, unit: &str, dip: i64, vertices: &[(f64, f64, f64)]) -> Feature {
    Feature::new()
        .with_fid(fid)
        .with_attribute("unitname", unit)
        .with_attribute("dip", dip)
        .with_attribute("observed", "2023-05-17 09:30:00")
        .with_geometry(wkb(&Geometry::LineString(
            vertices.iter().map(|&(x, y, z)| Coord::xyz(x, y, z)).collect(),
        )))
}

fn contacts() -> MemoryLayer {
    MemoryLayer::new(["unitname", "dip", "observed"], Some(Crs::Epsg(28350)))
        .with_feature(contact(1, "Hamersley", 30, &[(0.0, 0.0, 1.0), (1.0, 1.0, 2.0)]))
        .with_feature(contact(2, "Fortescue", 45, &[(2.0, 2.0, 3.0), (3.0, 3.0, 4.0)]))
        .with_feature(contact(3, "Wyloo", 60, &[(4.0, 4.0, 5.0), (5.0, 5.0, 6.0), (6.0, 4.0, 7.0)]))
        .with_feature(contact(4, "Turee Creek", 75, &[(7.0, 7.0, 8.0), (8.0, 8.0, 9.0)]))
        .with_feature(contact(5, "Ashburton", 80, &[(9.0, 9.0, 0.0), (9.5, 9.5, 0.5)]))
}

#[test]
fn layer_table_layer_round_trip() -> geobridge_core::Result<()> {
    let source = contacts();
    let options = ConversionOptions::new().with_fid_column("fid");

    let forward = layer_to_table(&source, &options, &NoFeedback)?;
    assert!(forward.is_clean());
    let table = forward.output;
    assert_eq!(table.num_rows(), 5);

    let mut provider = MemorySinkProvider::new();
    let reverse = table_to_layer(&table, &mut provider, &options, &NoFeedback)?;
    assert!(reverse.is_clean());
    assert_eq!(reverse.output.written, 5);
    assert_eq!(reverse.output.wkt_fallbacks, 0);

    let layer = provider.last_layer().unwrap();
    assert_eq!(layer.crs, source.crs);
    assert_eq!(layer.fields, source.fields);
    assert_eq!(layer.geometry_type.unwrap().to_string(), "LineStringZ");

    for (written, original) in layer.features.iter().zip(&source.features) {
        assert_eq!(written.fid, original.fid);
        assert_eq!(written.attribute("unitname"), original.attribute("unitname"));
        assert_eq!(written.attribute("dip"), original.attribute("dip"));
        // timestamp-like text comes back as a date-time
        assert!(matches!(written.attribute("observed"), Some(FieldValue::DateTime(_))));
        assert_eq!(
            decode(written.geometry.as_ref().unwrap()).unwrap(),
            decode(original.geometry.as_ref().unwrap()).unwrap()
        );
    }
    Ok(())
}

#[test]
fn two_part_line_yields_seven_samples() -> geobridge_core::Result<()> {
    let parts = vec![
        vec![Coord::xy(0.0, 0.0), Coord::xy(1.0, 0.0), Coord::xy(2.0, 0.0)],
        vec![
            Coord::xy(10.0, 0.0),
            Coord::xy(11.0, 0.0),
            Coord::xy(12.0, 0.0),
            Coord::xy(13.0, 0.0),
        ],
    ];
    let layer = MemoryLayer::new(["unitname", "dip"], None).with_feature(
        Feature::new()
            .with_attribute("unitname", "Hamersley")
            .with_attribute("dip", 12.5)
            .with_geometry(wkb(&Geometry::MultiLineString(parts))),
    );

    let samples = layer_to_samples(&layer, None, &ConversionOptions::new(), &NoFeedback)?.output;
    assert_eq!(samples.len(), 7);
    for point in &samples.points {
        assert_eq!(
            point.attributes,
            vec![FieldValue::from("Hamersley"), FieldValue::Float(12.5)]
        );
        assert_eq!(point.z, 0.0);
    }
    let xs: Vec<f64> = samples.points.iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0, 13.0]);

    let batch = samples.to_geo_table()?.to_record_batch()?;
    assert_eq!(batch.num_rows(), 7);
    let schema = batch.schema();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(names, vec!["X", "Y", "Z", "unitname", "dip"]);
    Ok(())
}

#[test]
fn cancellation_returns_partial_table() -> geobridge_core::Result<()> {
    let feedback = RecordingFeedback::new().cancel_after(2);
    let outcome = layer_to_table(&contacts(), &ConversionOptions::new(), &feedback)?;

    assert!(outcome.cancelled);
    assert_eq!(outcome.output.num_rows(), 2);
    assert_eq!(
        outcome.output.column("unitname").unwrap(),
        &[FieldValue::from("Hamersley"), FieldValue::from("Fortescue")]
    );
    assert_ne!(feedback.last_progress(), Some(100.0));
    Ok(())
}

#[test]
fn cancelled_export_keeps_written_features() -> geobridge_core::Result<()> {
    let table = layer_to_table(&contacts(), &ConversionOptions::new(), &NoFeedback)?.output;
    let feedback = RecordingFeedback::new().cancel_after(3);
    let mut provider = MemorySinkProvider::new();
    let outcome = table_to_layer(&table, &mut provider, &ConversionOptions::new(), &feedback)?;

    assert!(outcome.cancelled);
    assert_eq!(outcome.output.written, 3);
    assert_eq!(provider.last_layer().unwrap().len(), 3);
    Ok(())
}

#[test]
fn empty_table_still_creates_layer() -> geobridge_core::Result<()> {
    let table = GeoTable::from_columns(
        [("unitname", Vec::new())],
        Some(GeometryColumn {
            name: "geometry".to_string(),
            values: Vec::new(),
        }),
    )?;
    let feedback = RecordingFeedback::new();
    let mut provider = MemorySinkProvider::new();
    let outcome = table_to_layer(&table, &mut provider, &ConversionOptions::new(), &feedback)?;

    assert_eq!(provider.layers.len(), 1);
    assert!(provider.layers[0].is_empty());
    assert!(outcome.output.defaulted_family);
    assert_eq!(outcome.output.geometry_type.unwrap().to_string(), "LineString");
    assert!(
        feedback
            .infos
            .borrow()
            .iter()
            .any(|m| m == "input table is empty; creating empty output layer")
    );
    assert_eq!(feedback.last_progress(), Some(100.0));
    Ok(())
}

#[test]
fn unclosed_ring_falls_back_to_wkt() -> geobridge_core::Result<()> {
    let open_ring = vec![
        Coord::xy(0.0, 0.0),
        Coord::xy(1.0, 0.0),
        Coord::xy(1.0, 1.0),
        Coord::xy(0.0, 1.0),
    ];
    let table = GeoTable::from_columns(
        [("unitname", vec![FieldValue::from("Hamersley")])],
        Some(GeometryColumn {
            name: "geometry".to_string(),
            values: vec![Some(Geometry::Polygon(vec![open_ring]))],
        }),
    )?;
    let mut provider = MemorySinkProvider::new();
    let outcome = table_to_layer(&table, &mut provider, &ConversionOptions::new(), &NoFeedback)?;

    assert_eq!(outcome.output.written, 1);
    assert_eq!(outcome.output.wkt_fallbacks, 1);
    let feature = &provider.last_layer().unwrap().features[0];
    assert!(matches!(feature.geometry, Some(EncodedGeometry::Wkt(_))));
    Ok(())
}

#[test]
fn unencodable_geometry_is_skipped_with_diagnostic() -> geobridge_core::Result<()> {
    let table = GeoTable::from_columns(
        [("unitname", vec![FieldValue::from("bad"), FieldValue::from("good")])],
        Some(GeometryColumn {
            name: "geometry".to_string(),
            values: vec![
                Some(Geometry::LineString(vec![Coord::xy(f64::NAN, 0.0)])),
                Some(Geometry::LineString(vec![Coord::xy(0.0, 0.0), Coord::xy(1.0, 1.0)])),
            ],
        }),
    )?;
    let feedback = RecordingFeedback::new();
    let mut provider = MemorySinkProvider::new();
    let outcome = table_to_layer(&table, &mut provider, &ConversionOptions::new(), &feedback)?;

    assert_eq!(outcome.output.written, 1);
    assert_eq!(outcome.output.skipped, 1);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].position().unwrap().row, Some(1));
    assert_eq!(feedback.errors.borrow().len(), 1);
    Ok(())
}

#[test]
fn sink_creation_failure_is_fatal() {
    let table = GeoTable::from_columns([("unitname", vec![FieldValue::from("x")])], None).unwrap();
    let mut provider = MemorySinkProvider::failing("destination is read-only");
    let err = table_to_layer(&table, &mut provider, &ConversionOptions::new(), &NoFeedback)
        .unwrap_err();

    assert!(matches!(
        err,
        GeoBridgeError::Resource(ResourceError::SinkCreation { .. })
    ));
    assert!(!err.is_recoverable());
    assert!(err.user_message().contains("destination is read-only"));
}
