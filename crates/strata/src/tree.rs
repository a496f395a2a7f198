//! The node arena.
//!
//! A [`Tree`] owns every node of one record hierarchy in a flat slot vector;
//! a [`NodeId`] is an index into it. Parent references are indices too, so
//! upward links are non-owning by construction: detaching a subtree resets
//! its parent to `None` and can never keep it alive. Slots of removed
//! subtrees stay in the arena, unreachable, until the tree drops.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use strata_catalog::{Catalog, DataType};

use crate::expr::ExprRegistry;
use crate::log::AccessLog;
use crate::value::Value;

/// Index of a node (record or record array) in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

/// The slot an upward link points out of: a named field on a record, or an
/// element position in a record array.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Link {
    Field(String),
    Elem(usize),
}

/// Non-owning upward reference: the container's arena index plus the slot
/// within it that leads back down to this node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Parent {
    pub id: NodeId,
    pub link: Link,
}

/// One declared field of a record.
#[derive(Debug, Clone)]
pub(crate) enum Field {
    /// Scalar or leaf-array slot; `None` until data is stored.
    Data(Option<Value>),
    /// Nested record, constructed empty at record construction time.
    Node(NodeId),
    /// Nested record array, constructed empty.
    Nodes(NodeId),
}

#[derive(Debug, Clone)]
pub(crate) struct Record {
    /// Template path of this record kind (`""` for the root, `system[:]`
    /// for an element of the `system` array).
    pub template: String,
    pub fields: IndexMap<String, Field>,
    /// Field names currently holding explicit or downstream data.
    pub filled: IndexSet<String>,
    /// Fields materialized by a one-time expression; cleared on deep copy
    /// and on explicit overwrite.
    pub evaluated: IndexSet<String>,
    pub parent: Option<Parent>,
    pub frozen: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ArrayNode {
    /// Element template path (`system[:]`).
    pub template: String,
    pub elems: Vec<NodeId>,
    pub parent: Option<Parent>,
    pub frozen: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Record(Record),
    Array(ArrayNode),
}

/// A schema-typed record hierarchy.
pub struct Tree {
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) registry: Arc<ExprRegistry>,
    pub(crate) slots: Vec<Slot>,
    pub(crate) root: NodeId,
    pub(crate) log: AccessLog,
}

impl Tree {
    /// Build a tree for a schema instance: the root record and, recursively,
    /// every nested record, all fields empty.
    pub fn new(catalog: Arc<Catalog>, registry: Arc<ExprRegistry>) -> Self {
        let mut tree = Tree {
            catalog,
            registry,
            slots: Vec::new(),
            root: NodeId(0),
            log: AccessLog::new(),
        };
        tree.root = tree.build_record("", None);
        tree
    }

    /// Convenience constructor for trees without computed fields.
    pub fn with_catalog(catalog: Arc<Catalog>) -> Self {
        Self::new(catalog, Arc::new(ExprRegistry::new()))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn log(&self) -> &AccessLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut AccessLog {
        &mut self.log
    }

    /// Field names of `id` currently holding data, in declaration order.
    pub fn filled(&self, id: NodeId) -> Vec<&str> {
        self.record(id).filled.iter().map(String::as_str).collect()
    }

    pub fn is_filled(&self, id: NodeId, field: &str) -> bool {
        self.record(id).filled.contains(field)
    }

    /// True when the subtree at `id` holds any data at all.
    pub fn has_data(&self, id: NodeId) -> bool {
        match self.slot(id) {
            Slot::Record(rec) => !rec.filled.is_empty(),
            Slot::Array(arr) => !arr.elems.is_empty(),
        }
    }

    // ── Construction ─────────────────────────────────────────────────────

    pub(crate) fn alloc(&mut self, slot: Slot) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(slot);
        id
    }

    /// Construct an empty record of kind `template`, recursing into nested
    /// structures so no container field is ever null.
    pub(crate) fn build_record(&mut self, template: &str, parent: Option<Parent>) -> NodeId {
        let id = self.alloc(Slot::Record(Record {
            template: template.to_string(),
            fields: IndexMap::new(),
            filled: IndexSet::new(),
            evaluated: IndexSet::new(),
            parent,
            frozen: false,
        }));
        let catalog = Arc::clone(&self.catalog);
        for name in catalog.children(template) {
            let tpl = Catalog::child_template(template, name);
            let Some(entry) = catalog.entry(&tpl) else {
                continue;
            };
            let field = match entry.data_type {
                DataType::Structure => {
                    let child = self.build_record(
                        &tpl,
                        Some(Parent {
                            id,
                            link: Link::Field(name.to_string()),
                        }),
                    );
                    Field::Node(child)
                }
                DataType::StructArray => {
                    let arr = self.alloc(Slot::Array(ArrayNode {
                        template: format!("{tpl}[:]"),
                        elems: Vec::new(),
                        parent: Some(Parent {
                            id,
                            link: Link::Field(name.to_string()),
                        }),
                        frozen: false,
                    }));
                    Field::Nodes(arr)
                }
                _ => Field::Data(None),
            };
            self.record_mut(id).fields.insert(name.to_string(), field);
        }
        id
    }

    // ── Slot access ──────────────────────────────────────────────────────

    pub(crate) fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id.0 as usize]
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        &mut self.slots[id.0 as usize]
    }

    /// The record at `id`. Addressing a record array as a record is a
    /// programmer error.
    pub(crate) fn record(&self, id: NodeId) -> &Record {
        match self.slot(id) {
            Slot::Record(rec) => rec,
            Slot::Array(_) => panic!("node {id:?} is a record array, not a record"),
        }
    }

    pub(crate) fn record_mut(&mut self, id: NodeId) -> &mut Record {
        match self.slot_mut(id) {
            Slot::Record(rec) => rec,
            Slot::Array(_) => panic!("node {id:?} is a record array, not a record"),
        }
    }

    pub(crate) fn array(&self, id: NodeId) -> &ArrayNode {
        match self.slot(id) {
            Slot::Array(arr) => arr,
            Slot::Record(_) => panic!("node {id:?} is a record, not a record array"),
        }
    }

    pub(crate) fn array_mut(&mut self, id: NodeId) -> &mut ArrayNode {
        match self.slot_mut(id) {
            Slot::Array(arr) => arr,
            Slot::Record(_) => panic!("node {id:?} is a record, not a record array"),
        }
    }

    pub(crate) fn parent_of(&self, id: NodeId) -> Option<&Parent> {
        match self.slot(id) {
            Slot::Record(rec) => rec.parent.as_ref(),
            Slot::Array(arr) => arr.parent.as_ref(),
        }
    }

    /// Nested record under `field`, if the field is record-typed.
    pub fn child_record(&self, id: NodeId, field: &str) -> Option<NodeId> {
        match self.record(id).fields.get(field) {
            Some(Field::Node(c)) => Some(*c),
            _ => None,
        }
    }

    /// Nested record array under `field`, if the field is array-typed.
    pub fn child_array(&self, id: NodeId, field: &str) -> Option<NodeId> {
        match self.record(id).fields.get(field) {
            Some(Field::Nodes(a)) => Some(*a),
            _ => None,
        }
    }

    /// Stored value of a leaf field, ignoring expressions entirely.
    ///
    /// This is the access primitive under diff and merge: it can never
    /// trigger evaluation side effects.
    pub(crate) fn stored(&self, id: NodeId, field: &str) -> Option<&Value> {
        let rec = self.record(id);
        if !rec.filled.contains(field) {
            return None;
        }
        match rec.fields.get(field) {
            Some(Field::Data(v)) => v.as_ref(),
            _ => None,
        }
    }

    /// Store a value into a leaf slot and mark it filled, with no
    /// validation and no logging. Unknown or container fields are ignored.
    pub(crate) fn store_raw(&mut self, id: NodeId, field: &str, value: Value) {
        match self.record_mut(id).fields.get_mut(field) {
            Some(Field::Data(slot)) => *slot = Some(value),
            _ => return,
        }
        self.record_mut(id).evaluated.shift_remove(field);
        self.mark_filled(id, field);
    }

    // ── Fill tracking ────────────────────────────────────────────────────

    /// Idempotently mark `field` filled on `id`, then inform the parent
    /// chain that the field leading here is filled, stopping at the first
    /// ancestor already marked.
    pub fn mark_filled(&mut self, id: NodeId, field: &str) {
        if !self.record_mut(id).filled.insert(field.to_string()) {
            return;
        }
        if let Some(parent) = self.record(id).parent.clone() {
            self.mark_parent_filled(parent);
        }
    }

    pub(crate) fn mark_parent_filled(&mut self, parent: Parent) {
        match parent.link {
            Link::Field(field) => self.mark_filled(parent.id, &field),
            // An array is filled iff non-empty; its own owner carries the
            // fill bit, so keep walking.
            Link::Elem(_) => {
                if let Some(grand) = self.array(parent.id).parent.clone() {
                    self.mark_parent_filled(grand);
                }
            }
        }
    }

    /// Remove `field` from the filled set without recursing upward:
    /// clearing one field never retroactively unmarks ancestors, since other
    /// descendants of the same ancestor may still hold data.
    pub fn clear_filled(&mut self, id: NodeId, field: &str) {
        self.record_mut(id).filled.shift_remove(field);
    }

    // ── Freeze ───────────────────────────────────────────────────────────

    /// Recursively mark the subtree at `id` read-only. Frozen nodes refuse
    /// mutation (with a panic, as a programmer error) and never evaluate
    /// expressions.
    pub fn freeze(&mut self, id: NodeId) {
        match self.slot_mut(id) {
            Slot::Record(rec) => rec.frozen = true,
            Slot::Array(arr) => arr.frozen = true,
        }
        let children = self.children_of(id);
        for child in children {
            self.freeze(child);
        }
    }

    pub fn is_frozen(&self, id: NodeId) -> bool {
        match self.slot(id) {
            Slot::Record(rec) => rec.frozen,
            Slot::Array(arr) => arr.frozen,
        }
    }

    pub(crate) fn assert_mutable(&self, id: NodeId) {
        if self.is_frozen(id) {
            panic!("mutation of frozen node at `{}`", self.location(id));
        }
    }

    fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        match self.slot(id) {
            Slot::Record(rec) => rec
                .fields
                .values()
                .filter_map(|f| match f {
                    Field::Node(c) | Field::Nodes(c) => Some(*c),
                    Field::Data(_) => None,
                })
                .collect(),
            Slot::Array(arr) => arr.elems.clone(),
        }
    }

    // ── Wipe / detach ────────────────────────────────────────────────────

    /// Re-empty the record at `id`: clear every leaf, recurse into nested
    /// records, empty nested arrays, and reset the fill and evaluation sets.
    /// The parent link and frozen flag are untouched.
    pub(crate) fn wipe(&mut self, id: NodeId) {
        let names: Vec<String> = self.record(id).fields.keys().cloned().collect();
        for name in names {
            enum Kind {
                Leaf,
                Rec(NodeId),
                Arr(NodeId),
            }
            let kind = match self.record(id).fields.get(&name) {
                Some(Field::Node(c)) => Kind::Rec(*c),
                Some(Field::Nodes(a)) => Kind::Arr(*a),
                _ => Kind::Leaf,
            };
            match kind {
                Kind::Leaf => {
                    if let Some(Field::Data(slot)) = self.record_mut(id).fields.get_mut(&name) {
                        *slot = None;
                    }
                }
                Kind::Rec(c) => self.wipe(c),
                Kind::Arr(a) => self.clear_array(a),
            }
        }
        let rec = self.record_mut(id);
        rec.filled.clear();
        rec.evaluated.clear();
    }

    /// Drop every element of a record array, detaching each.
    pub(crate) fn clear_array(&mut self, arr: NodeId) {
        let elems = std::mem::take(&mut self.array_mut(arr).elems);
        for elem in elems {
            self.detach(elem);
        }
    }

    /// Reset a node's upward link. The slot stays in the arena, unreachable.
    pub(crate) fn detach(&mut self, id: NodeId) {
        match self.slot_mut(id) {
            Slot::Record(rec) => rec.parent = None,
            Slot::Array(arr) => arr.parent = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::demo_tree;
    use crate::tree::{Field, Slot};
    use crate::Value;

    #[test]
    fn construction_builds_nested_records_empty() {
        let tree = demo_tree();
        let root = tree.root();
        let rec = tree.record(root);
        assert!(rec.filled.is_empty());
        assert!(rec.parent.is_none());
        // Nested structure exists, not null.
        let profile = tree.child_record(root, "profile").unwrap();
        assert!(tree.record(profile).filled.is_empty());
        // Nested record array exists and is empty.
        let system = tree.child_array(root, "system").unwrap();
        assert_eq!(tree.array(system).elems.len(), 0);
        // Leaves are empty slots.
        assert!(matches!(
            tree.record(root).fields.get("comment"),
            Some(Field::Data(None))
        ));
    }

    #[test]
    fn fill_propagates_to_ancestors_and_stops_when_marked() {
        let mut tree = demo_tree();
        let root = tree.root();
        let profile = tree.child_record(root, "profile").unwrap();
        tree.store_raw(profile, "label", Value::Str("core".into()));
        assert!(tree.is_filled(profile, "label"));
        assert!(tree.is_filled(root, "profile"));
        // Second mark on the same field is a no-op.
        tree.mark_filled(profile, "label");
        assert_eq!(tree.filled(profile), vec!["label"]);
    }

    #[test]
    fn clear_does_not_recurse_upward() {
        let mut tree = demo_tree();
        let root = tree.root();
        let profile = tree.child_record(root, "profile").unwrap();
        tree.store_raw(profile, "label", Value::Str("core".into()));
        tree.clear_filled(profile, "label");
        assert!(!tree.is_filled(profile, "label"));
        // The ancestor keeps its mark.
        assert!(tree.is_filled(root, "profile"));
    }

    #[test]
    fn wipe_clears_subtree_recursively() {
        let mut tree = demo_tree();
        let root = tree.root();
        let profile = tree.child_record(root, "profile").unwrap();
        tree.store_raw(profile, "label", Value::Str("core".into()));
        tree.store_raw(root, "comment", Value::Str("x".into()));
        tree.wipe(root);
        assert!(tree.record(root).filled.is_empty());
        assert!(tree.record(profile).filled.is_empty());
        assert!(matches!(
            tree.record(profile).fields.get("label"),
            Some(Field::Data(None))
        ));
    }

    #[test]
    fn freeze_is_recursive() {
        let mut tree = demo_tree();
        let root = tree.root();
        tree.freeze(root);
        let profile = tree.child_record(root, "profile").unwrap();
        assert!(tree.is_frozen(profile));
        let system = tree.child_array(root, "system").unwrap();
        assert!(tree.is_frozen(system));
    }

    #[test]
    #[should_panic(expected = "frozen")]
    fn frozen_mutation_panics() {
        let mut tree = demo_tree();
        let root = tree.root();
        tree.freeze(root);
        tree.set(root, "comment", "nope").unwrap();
    }

    #[test]
    fn detach_resets_parent() {
        let mut tree = demo_tree();
        let root = tree.root();
        let system = tree.child_array(root, "system").unwrap();
        tree.resize(system, 1).unwrap();
        let elem = tree.array(system).elems[0];
        tree.clear_array(system);
        assert!(matches!(tree.slot(elem), Slot::Record(rec) if rec.parent.is_none()));
    }
}
