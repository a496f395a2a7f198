//! Checks against the shipped catalog fixture (raw JSON source form).

use std::fs;
use std::path::Path;

use strata_catalog::{Catalog, CoordinateRef, DataType};

fn sensors() -> Catalog {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("sensors.json");
    let src = fs::read_to_string(path).expect("fixture should be readable");
    Catalog::from_json_str(&src).expect("fixture should compile")
}

#[test]
fn fixture_compiles_with_expected_shape() {
    let catalog = sensors();
    assert_eq!(catalog.len(), 16);
    assert_eq!(catalog.children(""), vec!["time", "comment", "system", "profile", "slice"]);
    assert_eq!(
        catalog.children("slice[:]"),
        vec!["time", "value", "trace"]
    );
}

#[test]
fn metadata_survives_the_source_form() {
    let catalog = sensors();
    let time = catalog.entry("time").unwrap();
    assert_eq!(time.data_type, DataType::FloatArray);
    assert_eq!(time.units.as_deref(), Some("s"));
    assert_eq!(time.lifecycle_status.as_deref(), Some("active"));
    assert!(time.documentation.is_some());

    let gain = catalog.entry("system[:].gain").unwrap();
    assert_eq!(
        gain.coordinates,
        vec![CoordinateRef::Path("system[:].frequency".to_string())]
    );

    let slices = catalog.entry("slice").unwrap();
    assert_eq!(slices.data_type, DataType::StructArray);
    assert_eq!(
        slices.coordinates,
        vec![CoordinateRef::Path("slice[:].time".to_string())]
    );
}

#[test]
fn open_markers_parse_as_open() {
    let catalog = sensors();
    for path in ["time", "system[:].frequency", "profile.position", "slice[:].trace"] {
        assert_eq!(
            catalog.entry(path).unwrap().coordinates,
            vec![CoordinateRef::Open],
            "expected open coordinate on {path}"
        );
    }
}
