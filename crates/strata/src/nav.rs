//! Hierarchical navigation: canonical locations, parent/top walks, and
//! path-based relocation across the tree.

use strata_path::{common_prefix, format, parse, Path, Step};

use crate::error::TreeError;
use crate::tree::{Link, NodeId, Slot, Tree};

/// Result of resolving a path against a tree.
///
/// `Detached` is a sentinel, not an error: the path could not be resolved at
/// all (the coordinate resolver reads it as "not present").
#[derive(Debug, Clone, PartialEq)]
pub enum Located {
    Record(NodeId),
    Array(NodeId),
    Leaf { node: NodeId, field: String },
    Detached,
}

impl Tree {
    /// Immediate container of `id`, or `None` at the root. The container of
    /// an array element is the array itself.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent_of(id).map(|p| p.id)
    }

    /// Walk the parent chain to the outermost node. With `stop_below_root`,
    /// stop one level below the tree root (the top-level section the node
    /// belongs to); the root itself is returned only when `id` is the root.
    pub fn top(&self, id: NodeId, stop_below_root: bool) -> NodeId {
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            if stop_below_root && self.parent(parent).is_none() {
                return cur;
            }
            cur = parent;
        }
        cur
    }

    pub(crate) fn location_steps(&self, id: NodeId) -> Path {
        let mut steps = Vec::new();
        let mut cur = id;
        while let Some(parent) = self.parent_of(cur) {
            match &parent.link {
                Link::Field(field) => steps.push(Step::Name(field.clone())),
                Link::Elem(idx) => steps.push(Step::Index(*idx)),
            }
            cur = parent.id;
        }
        steps.reverse();
        steps
    }

    /// Concrete canonical location of a node (`system[2]`, `profile`).
    /// The root's location is the empty string.
    pub fn location(&self, id: NodeId) -> String {
        format(&self.location_steps(id))
    }

    /// Concrete canonical location of a field on a node (`system[2].cost`).
    pub fn location_of(&self, id: NodeId, field: &str) -> String {
        let mut steps = self.location_steps(id);
        steps.push(Step::Name(field.to_string()));
        format(&steps)
    }

    /// Template path of a field on a node (`system[:].cost`) — the schema
    /// catalog and expression registry key form.
    pub(crate) fn template_of(&self, id: NodeId, field: &str) -> String {
        let template = &self.record(id).template;
        strata_catalog::Catalog::child_template(template, field)
    }

    /// Relocate from `from` to `target`: walk up to the node at the longest
    /// common prefix of the two locations, then descend through the
    /// remaining segments.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange` — a numeric segment indexes past an array's length
    /// - `UnknownField`/`UnknownPath` — a name segment references no field
    pub fn goto(&self, from: NodeId, target: &str) -> Result<Located, TreeError> {
        let target_steps =
            parse(target).map_err(|e| TreeError::UnknownPath(format!("{target}: {e}")))?;
        let here = self.location_steps(from);
        let shared = common_prefix(&here, &target_steps);
        let mut cur = from;
        for _ in shared..here.len() {
            match self.parent(cur) {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        self.walk(cur, &target_steps[shared..], target)
    }

    /// Non-raising variant of [`Tree::goto`]: any resolution failure
    /// collapses to [`Located::Detached`].
    pub fn probe(&self, from: NodeId, target: &str) -> Located {
        self.goto(from, target).unwrap_or(Located::Detached)
    }

    /// Descend through `path` relative to `from` (no upward walk).
    pub fn descend(&self, from: NodeId, path: &str) -> Result<Located, TreeError> {
        let steps = parse(path).map_err(|e| TreeError::UnknownPath(format!("{path}: {e}")))?;
        self.walk(from, &steps, path)
    }

    fn walk(&self, start: NodeId, steps: &[Step], target: &str) -> Result<Located, TreeError> {
        let mut cur = start;
        for (i, step) in steps.iter().enumerate() {
            let last = i + 1 == steps.len();
            match (self.slot(cur), step) {
                (Slot::Record(rec), Step::Name(name)) => match rec.fields.get(name) {
                    Some(crate::tree::Field::Node(child)) => cur = *child,
                    Some(crate::tree::Field::Nodes(arr)) => cur = *arr,
                    Some(crate::tree::Field::Data(_)) => {
                        if last {
                            return Ok(Located::Leaf {
                                node: cur,
                                field: name.clone(),
                            });
                        }
                        return Err(TreeError::UnknownPath(target.to_string()));
                    }
                    None => return Err(TreeError::UnknownField(format!("{target}: {name}"))),
                },
                (Slot::Array(arr), Step::Index(idx)) => {
                    let len = arr.elems.len();
                    if *idx >= len {
                        return Err(TreeError::IndexOutOfRange { index: *idx, len });
                    }
                    cur = arr.elems[*idx];
                }
                _ => return Err(TreeError::UnknownPath(target.to_string())),
            }
        }
        Ok(match self.slot(cur) {
            Slot::Record(_) => Located::Record(cur),
            Slot::Array(_) => Located::Array(cur),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::demo_tree;

    #[test]
    fn locations() {
        let mut tree = demo_tree();
        let root = tree.root();
        assert_eq!(tree.location(root), "");
        let profile = tree.child_record(root, "profile").unwrap();
        assert_eq!(tree.location(profile), "profile");
        let system = tree.child_array(root, "system").unwrap();
        tree.resize(system, 2).unwrap();
        let second = tree.array(system).elems[1];
        assert_eq!(tree.location(second), "system[1]");
        assert_eq!(tree.location_of(second, "cost"), "system[1].cost");
        assert_eq!(tree.template_of(second, "cost"), "system[:].cost");
    }

    #[test]
    fn parent_and_top() {
        let mut tree = demo_tree();
        let root = tree.root();
        let system = tree.child_array(root, "system").unwrap();
        tree.resize(system, 1).unwrap();
        let elem = tree.array(system).elems[0];
        assert_eq!(tree.parent(elem), Some(system));
        assert_eq!(tree.parent(system), Some(root));
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.top(elem, false), root);
        // Stopping below the root lands on the top-level section.
        assert_eq!(tree.top(elem, true), system);
        assert_eq!(tree.top(root, true), root);
    }

    #[test]
    fn goto_descends_from_root() {
        let mut tree = demo_tree();
        let root = tree.root();
        let system = tree.child_array(root, "system").unwrap();
        tree.resize(system, 2).unwrap();
        match tree.goto(root, "system[1].cost").unwrap() {
            Located::Leaf { node, field } => {
                assert_eq!(tree.location(node), "system[1]");
                assert_eq!(field, "cost");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            tree.goto(root, "profile").unwrap(),
            Located::Record(_)
        ));
        assert!(matches!(
            tree.goto(root, "system").unwrap(),
            Located::Array(_)
        ));
    }

    #[test]
    fn goto_crosses_between_siblings() {
        let mut tree = demo_tree();
        let root = tree.root();
        let system = tree.child_array(root, "system").unwrap();
        tree.resize(system, 3).unwrap();
        let first = tree.array(system).elems[0];
        // Hop from one element to a field of another.
        match tree.goto(first, "system[2].identifier").unwrap() {
            Located::Leaf { node, field } => {
                assert_eq!(tree.location(node), "system[2]");
                assert_eq!(field, "identifier");
            }
            other => panic!("unexpected {other:?}"),
        }
        // Template targets resolve against the element's own indices.
        match tree.goto(first, "system[:].frequency").unwrap() {
            Located::Leaf { node, .. } => assert_eq!(tree.location(node), "system[0]"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn goto_errors() {
        let mut tree = demo_tree();
        let root = tree.root();
        let system = tree.child_array(root, "system").unwrap();
        tree.resize(system, 1).unwrap();
        assert_eq!(
            tree.goto(root, "system[4].cost"),
            Err(TreeError::IndexOutOfRange { index: 4, len: 1 })
        );
        assert!(matches!(
            tree.goto(root, "nonsense"),
            Err(TreeError::UnknownField(_))
        ));
        // Descending through a leaf is a path error.
        assert!(matches!(
            tree.goto(root, "comment.deeper"),
            Err(TreeError::UnknownPath(_))
        ));
    }

    #[test]
    fn probe_collapses_to_detached() {
        let tree = demo_tree();
        let root = tree.root();
        assert_eq!(tree.probe(root, "system[0].cost"), Located::Detached);
        assert_eq!(tree.probe(root, "nonsense"), Located::Detached);
    }

    #[test]
    fn descend_is_relative() {
        let mut tree = demo_tree();
        let root = tree.root();
        let system = tree.child_array(root, "system").unwrap();
        tree.resize(system, 1).unwrap();
        let elem = tree.array(system).elems[0];
        assert!(matches!(
            tree.descend(elem, "identifier").unwrap(),
            Located::Leaf { .. }
        ));
    }
}
