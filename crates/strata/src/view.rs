//! Read-only JSON view of a tree's stored data.

use serde_json::{json, Map, Value as Json};

use crate::tree::{Field, NodeId, Tree};
use crate::value::Value;

fn leaf_to_json(value: &Value) -> Json {
    match value {
        Value::Int(i) => json!(i),
        Value::Float(f) => json!(f),
        Value::Str(s) => json!(s),
        Value::Ints(is) => json!(is),
        Value::Floats(fs) => json!(fs),
        Value::Strs(ss) => json!(ss),
    }
}

impl Tree {
    /// JSON export of the filled data under `id`: records become objects
    /// (filled fields only), record arrays become arrays of objects, leaves
    /// become JSON scalars/arrays. In-memory only — persistence is not this
    /// crate's concern.
    pub fn to_value(&self, id: NodeId) -> Json {
        let mut out = Map::new();
        let rec = self.record(id);
        for (name, field) in &rec.fields {
            if !rec.filled.contains(name) {
                continue;
            }
            let rendered = match field {
                Field::Data(Some(value)) => leaf_to_json(value),
                Field::Data(None) => continue,
                Field::Node(child) => self.to_value(*child),
                Field::Nodes(arr) => Json::Array(
                    self.elements(*arr)
                        .into_iter()
                        .map(|elem| self.to_value(elem))
                        .collect(),
                ),
            };
            out.insert(name.clone(), rendered);
        }
        Json::Object(out)
    }

    /// Sorted concrete canonical paths of every filled leaf under `id`.
    pub fn paths(&self, id: NodeId) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths(id, &mut out);
        out.sort();
        out
    }

    fn collect_paths(&self, id: NodeId, out: &mut Vec<String>) {
        let names: Vec<String> = self.record(id).fields.keys().cloned().collect();
        for name in names {
            if !self.is_filled(id, &name) {
                continue;
            }
            match self.record(id).fields.get(&name) {
                Some(Field::Data(Some(_))) => out.push(self.location_of(id, &name)),
                Some(Field::Node(child)) => self.collect_paths(*child, out),
                Some(Field::Nodes(arr)) => {
                    for elem in self.elements(*arr) {
                        self.collect_paths(elem, out);
                    }
                }
                _ => {}
            }
        }
    }
}
