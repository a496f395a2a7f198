//! Record array growth, shrinkage, condition-driven resize, time-indexed
//! resize, and element deletion.

use crate::error::TreeError;
use crate::nav::Located;
use crate::tree::{Link, NodeId, Parent, Tree};
use crate::value::Value;
use crate::TIME_FIELD;

impl Tree {
    pub fn len(&self, arr: NodeId) -> usize {
        self.array(arr).elems.len()
    }

    pub fn is_empty(&self, arr: NodeId) -> bool {
        self.array(arr).elems.is_empty()
    }

    /// Element at `index`.
    pub fn element(&self, arr: NodeId, index: usize) -> Result<NodeId, TreeError> {
        let elems = &self.array(arr).elems;
        elems.get(index).copied().ok_or(TreeError::IndexOutOfRange {
            index,
            len: elems.len(),
        })
    }

    pub fn elements(&self, arr: NodeId) -> Vec<NodeId> {
        self.array(arr).elems.clone()
    }

    /// Grow or shrink to exactly `n` elements.
    ///
    /// Growth appends freshly constructed, re-parented empty elements; the
    /// default policy first wipes the previously-last element, so a matched
    /// slot cannot leak content into what should be a fresh tail. Shrinking
    /// removes from the tail and detaches the removed elements; an array
    /// left empty clears its fill bit on the owner.
    pub fn resize(&mut self, arr: NodeId, n: usize) -> Result<(), TreeError> {
        self.resize_impl(arr, n, true)
    }

    /// Like [`Tree::resize`], but growth leaves the previously-last element
    /// untouched.
    pub fn resize_preserving(&mut self, arr: NodeId, n: usize) -> Result<(), TreeError> {
        self.resize_impl(arr, n, false)
    }

    fn resize_impl(&mut self, arr: NodeId, n: usize, wipe_last: bool) -> Result<(), TreeError> {
        self.assert_mutable(arr);
        let len = self.len(arr);
        if n > len {
            if wipe_last && len > 0 {
                let last = self.array(arr).elems[len - 1];
                self.wipe(last);
            }
            for _ in len..n {
                self.append_element(arr);
            }
        } else if n < len {
            let tail: Vec<NodeId> = self.array_mut(arr).elems.split_off(n);
            for elem in tail {
                self.detach(elem);
            }
            if n == 0 {
                self.clear_owner_fill(arr);
            }
        }
        Ok(())
    }

    /// Resize by condition list: key/value paths relative to an element.
    ///
    /// With no matching element, one is appended (existing elements
    /// untouched) and the condition values are applied to it. With exactly
    /// one match, the element is optionally wiped, the condition values are
    /// re-applied, and it is returned. Multiple matches fail
    /// `AmbiguousMatch` unless `collapse` keeps the most recent match and
    /// drops the others.
    pub fn resize_where(
        &mut self,
        arr: NodeId,
        conditions: &[(&str, Value)],
        wipe: bool,
        collapse: bool,
    ) -> Result<NodeId, TreeError> {
        self.assert_mutable(arr);
        let matches = self.matching_elements(arr, conditions)?;
        let elem = match matches.len() {
            0 => self.append_element(arr),
            1 => {
                let elem = self.array(arr).elems[matches[0]];
                if wipe {
                    self.wipe(elem);
                }
                elem
            }
            n if !collapse => return Err(TreeError::AmbiguousMatch(n)),
            _ => {
                // Keep the most recent match, drop the rest.
                let keep = *matches.last().unwrap_or(&0);
                let elem = self.array(arr).elems[keep];
                for idx in matches.iter().rev().filter(|&&idx| idx != keep) {
                    self.delete_at(arr, *idx)?;
                }
                if wipe {
                    self.wipe(elem);
                }
                elem
            }
        };
        for (path, value) in conditions {
            self.apply_condition(elem, path, value.clone())?;
        }
        Ok(elem)
    }

    /// Time-indexed resize: append when `t` is newer than the last stored
    /// time, reuse the last element (unwiped) when exactly equal, fail when
    /// older. Pre-existing elements are never touched by the append.
    pub fn resize_time(&mut self, arr: NodeId, t: f64) -> Result<NodeId, TreeError> {
        self.assert_mutable(arr);
        if let Some(&last) = self.array(arr).elems.last() {
            if let Some(last_t) = self.stored(last, TIME_FIELD).and_then(Value::as_float) {
                if t == last_t {
                    return Ok(last);
                }
                if t < last_t {
                    return Err(TreeError::TimeOrderingViolation { last: last_t, given: t });
                }
            }
        }
        let elem = self.append_element(arr);
        self.set_unchecked(elem, TIME_FIELD, Value::Float(t))?;
        Ok(elem)
    }

    /// Remove the element at `index`, detaching it and renumbering the
    /// survivors' parent links. An array left empty clears its fill bit on
    /// the owner.
    pub fn delete_at(&mut self, arr: NodeId, index: usize) -> Result<(), TreeError> {
        self.assert_mutable(arr);
        let len = self.len(arr);
        if index >= len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }
        let removed = self.array_mut(arr).elems.remove(index);
        self.detach(removed);
        self.renumber_from(arr, index);
        if self.is_empty(arr) {
            self.clear_owner_fill(arr);
        }
        Ok(())
    }

    /// Remove every element matching the condition list; returns how many
    /// were removed.
    pub fn delete_where(
        &mut self,
        arr: NodeId,
        conditions: &[(&str, Value)],
    ) -> Result<usize, TreeError> {
        self.assert_mutable(arr);
        let matches = self.matching_elements(arr, conditions)?;
        for idx in matches.iter().rev() {
            let removed = self.array_mut(arr).elems.remove(*idx);
            self.detach(removed);
        }
        if let Some(&first) = matches.first() {
            self.renumber_from(arr, first);
        }
        if self.is_empty(arr) {
            self.clear_owner_fill(arr);
        }
        Ok(matches.len())
    }

    // ── Internals ────────────────────────────────────────────────────────

    /// Construct and append one fresh element, marking the owner filled.
    pub(crate) fn append_element(&mut self, arr: NodeId) -> NodeId {
        let (template, index) = {
            let a = self.array(arr);
            (a.template.clone(), a.elems.len())
        };
        let elem = self.build_record(
            &template,
            Some(Parent {
                id: arr,
                link: Link::Elem(index),
            }),
        );
        self.array_mut(arr).elems.push(elem);
        if let Some(parent) = self.array(arr).parent.clone() {
            self.mark_parent_filled(parent);
        }
        elem
    }

    /// Indices of elements satisfying every key/value condition.
    fn matching_elements(
        &self,
        arr: NodeId,
        conditions: &[(&str, Value)],
    ) -> Result<Vec<usize>, TreeError> {
        let mut out = Vec::new();
        for (idx, &elem) in self.array(arr).elems.iter().enumerate() {
            let mut all = true;
            for (path, value) in conditions {
                let hit = match self.descend(elem, path) {
                    Ok(Located::Leaf { node, field }) => self.stored(node, &field) == Some(value),
                    Ok(_) => false,
                    Err(TreeError::IndexOutOfRange { .. }) => false,
                    Err(e) => return Err(e),
                };
                if !hit {
                    all = false;
                    break;
                }
            }
            if all {
                out.push(idx);
            }
        }
        Ok(out)
    }

    /// Store a condition value at a path relative to `elem`.
    fn apply_condition(&mut self, elem: NodeId, path: &str, value: Value) -> Result<(), TreeError> {
        match self.descend(elem, path)? {
            Located::Leaf { node, field } => {
                self.store_raw(node, &field, value);
                Ok(())
            }
            _ => Err(TreeError::UnknownPath(path.to_string())),
        }
    }

    /// Rewrite the `Elem` parent links of elements at `from..`.
    fn renumber_from(&mut self, arr: NodeId, from: usize) {
        let elems: Vec<NodeId> = self.array(arr).elems[from..].to_vec();
        for (offset, elem) in elems.into_iter().enumerate() {
            self.record_mut(elem).parent = Some(Parent {
                id: arr,
                link: Link::Elem(from + offset),
            });
        }
    }

    /// Clear the owner's fill bit for an array that became empty.
    fn clear_owner_fill(&mut self, arr: NodeId) {
        if let Some(Parent {
            id,
            link: Link::Field(field),
        }) = self.array(arr).parent.clone()
        {
            self.clear_filled(id, &field);
        }
    }
}
