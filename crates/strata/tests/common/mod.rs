use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata::Tree;
use strata_catalog::Catalog;

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("strata-catalog")
        .join("fixtures")
}

pub fn sensors_catalog() -> Arc<Catalog> {
    let src = fs::read_to_string(fixtures_dir().join("sensors.json"))
        .expect("sensors fixture should be readable");
    Arc::new(Catalog::from_json_str(&src).expect("sensors fixture should compile"))
}

pub fn sensors_tree() -> Tree {
    Tree::with_catalog(sensors_catalog())
}
