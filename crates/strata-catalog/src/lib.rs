//! Schema catalog contract.
//!
//! The catalog is the compiled, read-only table of per-path metadata the
//! core engine consumes: declared data type, coordinate dependency list,
//! units, documentation, and lifecycle status, keyed by template path
//! (`system[:].cost`). Loading and compiling the raw schema source is a
//! separate concern; this crate only materializes the lookup table from
//! already-compiled JSON entries and answers lookups.
//!
//! # Example
//!
//! ```
//! use strata_catalog::{Catalog, DataType};
//!
//! let catalog = Catalog::from_json_str(r#"{
//!     "time": {"data_type": "FLT_1D", "coordinates": ["1...N"], "units": "s"},
//!     "system": {"data_type": "STRUCT_ARRAY", "coordinates": ["1...N"]},
//!     "system[:].cost": {"data_type": "FLT_0D", "units": "USD"}
//! }"#).unwrap();
//!
//! assert_eq!(catalog.entry("system[:].cost").unwrap().data_type, DataType::Float);
//! assert_eq!(catalog.children("system[:]"), vec!["cost"]);
//! assert_eq!(catalog.children(""), vec!["time", "system"]);
//! ```

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use strata_path::{parse, Step};
use thiserror::Error;

/// The `"1...N"` marker in the raw JSON source form.
const OPEN_COORDINATE: &str = "1...N";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("INVALID_SOURCE: {0}")]
    Source(String),
    #[error("INVALID_PATH: {0}")]
    Path(String),
}

/// Declared type of a catalog path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DataType {
    #[serde(rename = "INT_0D")]
    Int,
    #[serde(rename = "FLT_0D")]
    Float,
    #[serde(rename = "STR_0D")]
    Str,
    #[serde(rename = "INT_1D")]
    IntArray,
    #[serde(rename = "FLT_1D")]
    FloatArray,
    #[serde(rename = "STR_1D")]
    StrArray,
    #[serde(rename = "STRUCTURE")]
    Structure,
    #[serde(rename = "STRUCT_ARRAY")]
    StructArray,
}

impl DataType {
    /// True for leaf array types (the ones carrying coordinate dependencies).
    pub fn is_array(&self) -> bool {
        matches!(self, DataType::IntArray | DataType::FloatArray | DataType::StrArray)
    }

    /// True for nested containers.
    pub fn is_container(&self) -> bool {
        matches!(self, DataType::Structure | DataType::StructArray)
    }
}

/// One declared coordinate dependency of an array field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum CoordinateRef {
    /// A literal sibling/ancestor template path that must hold data first.
    Path(String),
    /// The open marker (`"1...N"`): the dimension is the field's own length.
    Open,
}

impl From<String> for CoordinateRef {
    fn from(s: String) -> Self {
        if s == OPEN_COORDINATE {
            CoordinateRef::Open
        } else {
            CoordinateRef::Path(s)
        }
    }
}

/// Compiled metadata for one template path.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub data_type: DataType,
    #[serde(default)]
    pub coordinates: Vec<CoordinateRef>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub lifecycle_status: Option<String>,
}

/// The read-only lookup table of a schema instance.
///
/// Keys are template paths. A precomputed children index answers "direct
/// fields of this record prefix" without scanning the whole table.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: IndexMap<String, CatalogEntry>,
    children: HashMap<String, Vec<String>>,
}

impl Catalog {
    /// Build a catalog from compiled entries.
    ///
    /// # Errors
    ///
    /// Fails when an entry key is not a valid template path or does not end
    /// in a field name.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, CatalogEntry)>,
    ) -> Result<Self, CatalogError> {
        let entries: IndexMap<String, CatalogEntry> = entries.into_iter().collect();
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for key in entries.keys() {
            let steps = parse(key).map_err(|e| CatalogError::Path(format!("{key}: {e}")))?;
            let name = match steps.last() {
                Some(Step::Name(name)) => name.clone(),
                _ => return Err(CatalogError::Path(key.clone())),
            };
            let prefix = strata_path::format(&steps[..steps.len() - 1]);
            children.entry(prefix).or_default().push(name);
        }
        Ok(Catalog { entries, children })
    }

    /// Build a catalog from the raw JSON source form: an object mapping
    /// template paths to entry metadata.
    pub fn from_json_str(src: &str) -> Result<Self, CatalogError> {
        let raw: IndexMap<String, CatalogEntry> =
            serde_json::from_str(src).map_err(|e| CatalogError::Source(e.to_string()))?;
        Self::from_entries(raw)
    }

    /// Metadata for a template path, or `None` if the schema does not
    /// declare it.
    pub fn entry(&self, template: &str) -> Option<&CatalogEntry> {
        self.entries.get(template)
    }

    pub fn contains(&self, template: &str) -> bool {
        self.entries.contains_key(template)
    }

    /// Direct child field names of a record prefix, in declaration order.
    ///
    /// The root record's prefix is the empty string; a record array
    /// element's prefix carries the placeholder (`system[:]`).
    pub fn children(&self, prefix: &str) -> Vec<&str> {
        self.children
            .get(prefix)
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The template path of `name` under `prefix`.
    pub fn child_template(prefix: &str, name: &str) -> String {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        }
    }

    /// Number of declared paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All declared template paths, in declaration order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
