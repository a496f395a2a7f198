//! Field access and expression evaluation.
//!
//! `get` resolves a field in a fixed order: nested containers are always
//! present; the time sentinel is returned raw; stored data wins; otherwise
//! a one-time expression is evaluated and memoized (stored as if written),
//! then a dynamic expression is evaluated without memoizing; otherwise the
//! read fails with `MissingData`. `get_raw` is the side-effect-free variant
//! used where comparison algorithms must not trigger memoization.

use crate::error::TreeError;
use crate::expr::ExprKind;
use crate::tree::{Field, NodeId, Tree};
use crate::value::Value;
use crate::TIME_FIELD;

/// A successfully resolved field.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Value(Value),
    Record(NodeId),
    Array(NodeId),
}

impl Item {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Item::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Result of a raw (side-effect-free) read. `Absent` is an explicit marker,
/// distinct from failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Raw {
    Value(Value),
    Record(NodeId),
    Array(NodeId),
    Absent,
}

impl Raw {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Raw::Value(v) => Some(v),
            _ => None,
        }
    }
}

enum FieldState {
    Node(NodeId),
    Nodes(NodeId),
    Data {
        stored: Option<Value>,
        filled: bool,
        frozen: bool,
    },
}

impl Tree {
    fn field_state(&self, id: NodeId, field: &str) -> Option<FieldState> {
        let rec = self.record(id);
        match rec.fields.get(field) {
            None => None,
            Some(Field::Node(child)) => Some(FieldState::Node(*child)),
            Some(Field::Nodes(arr)) => Some(FieldState::Nodes(*arr)),
            Some(Field::Data(stored)) => Some(FieldState::Data {
                stored: stored.clone(),
                filled: rec.filled.contains(field),
                frozen: rec.frozen,
            }),
        }
    }

    /// Read a field, falling back to registered expressions.
    ///
    /// # Errors
    ///
    /// `UnknownField` when the schema declares no such field here;
    /// `MissingData` when the field is unset and no usable expression
    /// exists; expression failures propagate as-is.
    pub fn get(&mut self, id: NodeId, field: &str) -> Result<Item, TreeError> {
        let state = self
            .field_state(id, field)
            .ok_or_else(|| TreeError::UnknownField(self.location_of(id, field)))?;
        let (stored, filled, frozen) = match state {
            FieldState::Node(child) => return Ok(Item::Record(child)),
            FieldState::Nodes(arr) => return Ok(Item::Array(arr)),
            FieldState::Data {
                stored,
                filled,
                frozen,
            } => (stored, filled, frozen),
        };

        let location = self.location_of(id, field);

        // The time sentinel bypasses the expression machinery entirely.
        if field == TIME_FIELD {
            return match stored {
                Some(v) if filled => {
                    self.log.note_read(&location);
                    Ok(Item::Value(v))
                }
                _ => Err(TreeError::MissingData(location)),
            };
        }

        if filled {
            if let Some(v) = stored {
                self.log.note_read(&location);
                return Ok(Item::Value(v));
            }
        }

        if !frozen {
            let template = self.template_of(id, field);
            if let Some(f) = self.registry.lookup(&template, ExprKind::OneTime).cloned() {
                let value = (&*f)(&*self, id)?;
                self.store_raw(id, field, value.clone());
                self.record_mut(id).evaluated.insert(field.to_string());
                self.log.note_expr(&location);
                return Ok(Item::Value(value));
            }
            if let Some(f) = self.registry.lookup(&template, ExprKind::Dynamic).cloned() {
                let value = (&*f)(&*self, id)?;
                self.log.note_expr(&location);
                return Ok(Item::Value(value));
            }
        }

        Err(TreeError::MissingData(location))
    }

    /// Like [`Tree::get`], but `MissingData` resolves to `default`.
    pub fn get_or(&mut self, id: NodeId, field: &str, default: Value) -> Result<Item, TreeError> {
        match self.get(id, field) {
            Err(TreeError::MissingData(_)) => Ok(Item::Value(default)),
            other => other,
        }
    }

    /// Side-effect-free read: the stored value if filled, a dynamic
    /// expression result if one applies (not memoized, not logged), or
    /// [`Raw::Absent`]. One-time expressions are never consulted.
    pub fn get_raw(&self, id: NodeId, field: &str) -> Result<Raw, TreeError> {
        let state = self
            .field_state(id, field)
            .ok_or_else(|| TreeError::UnknownField(self.location_of(id, field)))?;
        let (stored, filled, frozen) = match state {
            FieldState::Node(child) => return Ok(Raw::Record(child)),
            FieldState::Nodes(arr) => return Ok(Raw::Array(arr)),
            FieldState::Data {
                stored,
                filled,
                frozen,
            } => (stored, filled, frozen),
        };
        if filled {
            if let Some(v) = stored {
                return Ok(Raw::Value(v));
            }
        }
        if !frozen && field != TIME_FIELD {
            let template = self.template_of(id, field);
            if let Some(f) = self.registry.lookup(&template, ExprKind::Dynamic) {
                return Ok(Raw::Value((&**f)(self, id)?));
            }
        }
        Ok(Raw::Absent)
    }
}
