//! Shared helpers for the unit tests.

use std::sync::Arc;

use strata_catalog::Catalog;

use crate::tree::Tree;

const DEMO_SCHEMA: &str = r#"{
    "time": {"data_type": "FLT_1D", "coordinates": ["1...N"], "units": "s"},
    "comment": {"data_type": "STR_0D"},
    "system": {"data_type": "STRUCT_ARRAY", "coordinates": ["1...N"]},
    "system[:].identifier": {"data_type": "STR_0D"},
    "system[:].cost": {"data_type": "FLT_0D", "units": "USD"},
    "system[:].frequency": {"data_type": "FLT_1D", "coordinates": ["1...N"], "units": "Hz"},
    "system[:].gain": {"data_type": "FLT_1D", "coordinates": ["system[:].frequency"]},
    "system[:].sample_count": {"data_type": "INT_0D"},
    "profile": {"data_type": "STRUCTURE"},
    "profile.position": {"data_type": "FLT_1D", "coordinates": ["1...N"], "units": "m"},
    "profile.density": {"data_type": "FLT_1D", "coordinates": ["profile.position"], "units": "m^-3"},
    "profile.label": {"data_type": "STR_0D"},
    "slice": {"data_type": "STRUCT_ARRAY", "coordinates": ["slice[:].time"]},
    "slice[:].time": {"data_type": "FLT_0D", "units": "s"},
    "slice[:].value": {"data_type": "FLT_0D"},
    "slice[:].trace": {"data_type": "FLT_1D", "coordinates": ["1...N"]}
}"#;

pub(crate) fn demo_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_json_str(DEMO_SCHEMA).expect("demo schema is valid"))
}

pub(crate) fn demo_tree() -> Tree {
    Tree::with_catalog(demo_catalog())
}
