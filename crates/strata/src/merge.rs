//! Merge, deep copy, and fine-grained extraction/deletion of subtrees.
//!
//! All of these move stored data only — unevaluated expressions are never
//! materialized by a structural operation. Arena ids are tree-local, so
//! cross-tree data movement is always a copy, re-parented on arrival.

use strata_path::{parse, Step};

use crate::error::TreeError;
use crate::nav::Located;
use crate::tree::{ArrayNode, Field, Link, NodeId, Parent, Record, Slot, Tree};
use crate::value::Value;
use crate::TIME_FIELD;

impl Tree {
    /// Copy every stored field of `src` into this tree, overwriting,
    /// bypassing coordinate validation (the source is assumed internally
    /// consistent). Record arrays merge element-by-index, extending the
    /// target when the source is longer. Idempotent.
    pub fn merge(&mut self, src: &Tree) {
        self.merge_at(self.root, src, src.root);
    }

    /// Merge the subtree at `src_id` into the record at `dst_id`.
    pub fn merge_at(&mut self, dst_id: NodeId, src: &Tree, src_id: NodeId) {
        self.assert_mutable(dst_id);
        let names: Vec<String> = src.record(src_id).fields.keys().cloned().collect();
        for name in names {
            match src.record(src_id).fields.get(&name) {
                Some(Field::Data(Some(value))) if src.is_filled(src_id, &name) => {
                    let value = value.clone();
                    self.store_raw(dst_id, &name, value);
                }
                Some(Field::Node(src_child)) => {
                    if let Some(dst_child) = self.child_record(dst_id, &name) {
                        self.merge_at(dst_child, src, *src_child);
                    }
                }
                Some(Field::Nodes(src_arr)) => {
                    let Some(dst_arr) = self.child_array(dst_id, &name) else {
                        continue;
                    };
                    let src_elems = src.elements(*src_arr);
                    for (idx, src_elem) in src_elems.into_iter().enumerate() {
                        let dst_elem = if idx < self.len(dst_arr) {
                            self.array(dst_arr).elems[idx]
                        } else {
                            self.append_element(dst_arr)
                        };
                        self.merge_at(dst_elem, src, src_elem);
                    }
                }
                _ => {}
            }
        }
    }

    /// Deep copy of the subtree at `id` into an entirely independent tree:
    /// the copy's root parent is `None`, its memoization marks are cleared
    /// (materialized expression results travel as plain stored data), and
    /// mutating either side never affects the other.
    pub fn deep_copy(&self, id: NodeId) -> Tree {
        let mut out = Tree {
            catalog: std::sync::Arc::clone(&self.catalog),
            registry: std::sync::Arc::clone(&self.registry),
            slots: Vec::new(),
            root: NodeId(0),
            log: crate::log::AccessLog::new(),
        };
        out.root = self.copy_record_into(id, &mut out, None);
        out
    }

    fn copy_record_into(&self, id: NodeId, out: &mut Tree, parent: Option<Parent>) -> NodeId {
        let new_id = {
            let src = self.record(id);
            out.alloc(Slot::Record(Record {
                template: src.template.clone(),
                fields: indexmap::IndexMap::new(),
                filled: src.filled.clone(),
                evaluated: indexmap::IndexSet::new(),
                parent,
                frozen: false,
            }))
        };
        let names: Vec<String> = self.record(id).fields.keys().cloned().collect();
        for name in names {
            let copied = match self.record(id).fields.get(&name) {
                Some(Field::Data(value)) => Field::Data(value.clone()),
                Some(Field::Node(child)) => Field::Node(self.copy_record_into(
                    *child,
                    out,
                    Some(Parent {
                        id: new_id,
                        link: Link::Field(name.clone()),
                    }),
                )),
                Some(Field::Nodes(arr)) => Field::Nodes(self.copy_array_into(
                    *arr,
                    out,
                    Some(Parent {
                        id: new_id,
                        link: Link::Field(name.clone()),
                    }),
                )),
                None => continue,
            };
            out.record_mut(new_id).fields.insert(name, copied);
        }
        new_id
    }

    fn copy_array_into(&self, arr: NodeId, out: &mut Tree, parent: Option<Parent>) -> NodeId {
        let new_arr = out.alloc(Slot::Array(ArrayNode {
            template: self.array(arr).template.clone(),
            elems: Vec::new(),
            parent,
            frozen: false,
        }));
        let elems = self.elements(arr);
        for (idx, elem) in elems.into_iter().enumerate() {
            let copied = self.copy_record_into(
                elem,
                out,
                Some(Parent {
                    id: new_arr,
                    link: Link::Elem(idx),
                }),
            );
            out.array_mut(new_arr).elems.push(copied);
        }
        new_arr
    }

    /// Copy exactly the data reachable via one dotted/indexed path from
    /// `src` into `dst`, recursing through intermediate containers.
    ///
    /// With `instant`, time-indexed arrays along the path are sliced to the
    /// single element whose stored `time` equals the instant, and matching
    /// destination elements are created on demand via time-indexed resize;
    /// without it, all instants are copied. Returns whether anything was
    /// copied.
    pub fn selective_copy(
        src: &Tree,
        dst: &mut Tree,
        path: &str,
        instant: Option<f64>,
    ) -> Result<bool, TreeError> {
        let steps = parse(path).map_err(|e| TreeError::UnknownPath(format!("{path}: {e}")))?;
        Self::copy_steps(src, src.root, dst, dst.root, &steps, instant, path)
    }

    fn copy_steps(
        src: &Tree,
        s_id: NodeId,
        dst: &mut Tree,
        d_id: NodeId,
        steps: &[Step],
        instant: Option<f64>,
        full: &str,
    ) -> Result<bool, TreeError> {
        let Some(first) = steps.first() else {
            // Path exhausted: graft the whole remaining subtree.
            let had = src.has_data(s_id);
            dst.merge_at(d_id, src, s_id);
            return Ok(had);
        };
        let name = match first {
            Step::Name(name) => name,
            _ => return Err(TreeError::UnknownPath(full.to_string())),
        };
        let rest = &steps[1..];
        match src.record(s_id).fields.get(name.as_str()) {
            None => Err(TreeError::UnknownField(format!("{full}: {name}"))),
            Some(Field::Data(stored)) => {
                if !rest.is_empty() {
                    return Err(TreeError::UnknownPath(full.to_string()));
                }
                match (src.is_filled(s_id, name), stored.clone()) {
                    (true, Some(value)) => {
                        dst.store_raw(d_id, name, value);
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            }
            Some(Field::Node(src_child)) => {
                let Some(dst_child) = dst.child_record(d_id, name) else {
                    return Ok(false);
                };
                Self::copy_steps(src, *src_child, dst, dst_child, rest, instant, full)
            }
            Some(Field::Nodes(src_arr)) => {
                let Some(dst_arr) = dst.child_array(d_id, name) else {
                    return Ok(false);
                };
                let src_arr = *src_arr;
                if let Some(Step::Index(idx)) = rest.first() {
                    let src_elem = src.element(src_arr, *idx)?;
                    while dst.len(dst_arr) <= *idx {
                        dst.append_element(dst_arr);
                    }
                    let dst_elem = dst.array(dst_arr).elems[*idx];
                    return Self::copy_steps(src, src_elem, dst, dst_elem, &rest[1..], instant, full);
                }
                // Whole-array traversal: every element, or one instant of a
                // time-indexed array.
                let time_indexed = src.is_time_indexed(src_arr);
                let src_elems = src.elements(src_arr);
                let mut copied = false;
                for (idx, src_elem) in src_elems.into_iter().enumerate() {
                    if let (Some(t), true) = (instant, time_indexed) {
                        let elem_time =
                            src.stored(src_elem, TIME_FIELD).and_then(Value::as_float);
                        if elem_time != Some(t) {
                            continue;
                        }
                        let dst_elem = dst.resize_time(dst_arr, t)?;
                        copied |=
                            Self::copy_steps(src, src_elem, dst, dst_elem, rest, instant, full)?;
                    } else {
                        while dst.len(dst_arr) <= idx {
                            dst.append_element(dst_arr);
                        }
                        let dst_elem = dst.array(dst_arr).elems[idx];
                        copied |=
                            Self::copy_steps(src, src_elem, dst, dst_elem, rest, instant, full)?;
                    }
                }
                Ok(copied)
            }
        }
    }

    /// Clear exactly the field or subtree at `path`, returning whether
    /// anything was deleted. Indexing past an array's current length deletes
    /// nothing; referencing an undeclared field is still an error.
    pub fn selective_delete(&mut self, path: &str) -> Result<bool, TreeError> {
        let located = match self.goto(self.root, path) {
            Ok(located) => located,
            Err(TreeError::IndexOutOfRange { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        match located {
            Located::Detached => Ok(false),
            Located::Leaf { node, field } => {
                if !self.is_filled(node, &field) {
                    return Ok(false);
                }
                self.assert_mutable(node);
                if let Some(Field::Data(slot)) = self.record_mut(node).fields.get_mut(&field) {
                    *slot = None;
                }
                self.record_mut(node).evaluated.shift_remove(&field);
                self.clear_filled(node, &field);
                Ok(true)
            }
            Located::Record(id) => {
                if !self.has_data(id) {
                    return Ok(false);
                }
                self.assert_mutable(id);
                self.wipe(id);
                if let Some(Parent {
                    id: owner,
                    link: Link::Field(field),
                }) = self.record(id).parent.clone()
                {
                    self.clear_filled(owner, &field);
                }
                Ok(true)
            }
            Located::Array(id) => {
                if !self.has_data(id) {
                    return Ok(false);
                }
                self.assert_mutable(id);
                self.clear_array(id);
                if let Some(Parent {
                    id: owner,
                    link: Link::Field(field),
                }) = self.array(id).parent.clone()
                {
                    self.clear_filled(owner, &field);
                }
                Ok(true)
            }
        }
    }

    /// True when the elements of `arr` carry a declared `time` leaf.
    pub(crate) fn is_time_indexed(&self, arr: NodeId) -> bool {
        let template = &self.array(arr).template;
        self.catalog.children(template).contains(&TIME_FIELD)
    }
}
