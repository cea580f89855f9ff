//! Host parameter decoding and algorithm input preparation.

use geobridge_core::error::ValidationError;
use geobridge_core::{
    BoundingBox, GeoBridgeError, GeoTable, ModelParameters, decode_bbox, decode_ordered_list,
    filter_ignored_units, require_fields, stratigraphic_column_table,
};
use geobridge_core_common::FieldValue;
use serde_json::json;

#[test]
fn bounding_box_shapes() {
    let expected = BoundingBox::new(500_000.0, 7_400_000.0, 520_000.0, 7_420_000.0).unwrap();
    assert_eq!(
        decode_bbox(&json!([[500_000, 7_400_000, 520_000, 7_420_000]])).unwrap(),
        expected
    );
    assert_eq!(
        decode_bbox(&json!("500000,7400000,520000,7420000")).unwrap(),
        expected
    );
    assert_eq!(expected.width(), 20_000.0);
    assert!(expected.contains(510_000.0, 7_410_000.0));
    assert_eq!(expected.to_string(), "[500000, 7400000, 520000, 7420000]");
}

#[test]
fn bounding_box_failures_are_validation_errors() {
    let cases = [
        (json!(3), "enum passed as matrix"),
        (json!([0, 0, 10]), "need 4 numbers"),
        (json!([10, 0, 0, 10]), "minx must be < maxx"),
        (json!([[0, 0], [1, 1]]), "2-row matrix"),
    ];
    for (value, needle) in cases {
        let err = decode_bbox(&value).unwrap_err();
        assert!(matches!(err, GeoBridgeError::Validation(_)), "{value}");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains(needle), "{value}: {err}");
    }
}

#[test]
fn stratigraphic_order_dedups_and_numbers() -> geobridge_core::Result<()> {
    let units = decode_ordered_list(&json!([["Wyloo"], ["Turee Creek"], [" Wyloo "], ["Hamersley"], [""]]))?;
    assert_eq!(units, vec!["Wyloo", "Turee Creek", "Hamersley"]);

    let column = stratigraphic_column_table(&units)?;
    assert_eq!(column.num_rows(), 3);
    assert_eq!(
        column.column("order").unwrap(),
        &[FieldValue::Integer(1), FieldValue::Integer(2), FieldValue::Integer(3)]
    );
    Ok(())
}

#[test]
fn persisted_settings_arrive_as_parameters() -> geobridge_core::Result<()> {
    let params = ModelParameters::from_values(&json!({
        "bounding_box": [0, 0, 1000, 1000],
        "stratigraphic_order": "Hamersley, Fortescue",
        "ignore_units": ["Fortescue"],
    }))?;

    let geology = GeoTable::from_columns(
        [
            (
                "unitname",
                vec![FieldValue::from("Hamersley"), FieldValue::from("Fortescue")],
            ),
            ("dip", vec![FieldValue::Integer(10), FieldValue::Integer(20)]),
        ],
        None,
    )?;
    require_fields(&geology, &["unitname", "dip"], "Geology")?;

    let mut kept = filter_ignored_units(&geology, "unitname", &params.ignore_units)?;
    assert_eq!(kept.num_rows(), 1);
    kept.rename_column("unitname", "UNITNAME")?;
    assert_eq!(kept.column_names(), vec!["UNITNAME", "dip"]);
    assert_eq!(params.require_bounding_box()?.height(), 1000.0);
    Ok(())
}

#[test]
fn missing_fields_are_listed_together() {
    let table = GeoTable::from_columns([("dip", vec![FieldValue::Integer(10)])], None).unwrap();
    let err = require_fields(&table, &["unitname", "dip", "dipdir"], "Orientation data")
        .unwrap_err();
    match err {
        GeoBridgeError::Validation(ValidationError::MissingFields { fields, .. }) => {
            assert_eq!(fields, "unitname, dipdir");
        },
        other => panic!("unexpected error: {other}"),
    }
}
