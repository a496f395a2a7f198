//! Expression registry — maps template paths to compute functions.
//!
//! A compute function receives the tree and the owning node and reaches any
//! ancestor state it needs through navigation. One-time expressions are
//! memoized into the tree on first read; dynamic expressions are recomputed
//! on every access. The registry is built once, treated as immutable
//! thereafter, and shared into tree roots via `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::TreeError;
use crate::tree::{NodeId, Tree};
use crate::value::Value;

/// A registered compute function.
pub type ExprFn = Arc<dyn Fn(&Tree, NodeId) -> Result<Value, TreeError>>;

/// Evaluation discipline of a registered expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    /// Memoized: evaluated once, then stored as if written.
    OneTime,
    /// Recomputed on every read, never stored.
    Dynamic,
}

#[derive(Default)]
pub struct ExprRegistry {
    one_time: HashMap<String, ExprFn>,
    dynamic: HashMap<String, ExprFn>,
}

impl ExprRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compute function for a template path
    /// (e.g. `system[:].cost`).
    pub fn register<F>(&mut self, template: &str, kind: ExprKind, f: F)
    where
        F: Fn(&Tree, NodeId) -> Result<Value, TreeError> + 'static,
    {
        let table = match kind {
            ExprKind::OneTime => &mut self.one_time,
            ExprKind::Dynamic => &mut self.dynamic,
        };
        table.insert(template.to_string(), Arc::new(f));
    }

    pub fn lookup(&self, template: &str, kind: ExprKind) -> Option<&ExprFn> {
        match kind {
            ExprKind::OneTime => self.one_time.get(template),
            ExprKind::Dynamic => self.dynamic.get(template),
        }
    }

    pub fn len(&self) -> usize {
        self.one_time.len() + self.dynamic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.one_time.is_empty() && self.dynamic.is_empty()
    }
}

impl std::fmt::Debug for ExprRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExprRegistry")
            .field("one_time", &self.one_time.keys().collect::<Vec<_>>())
            .field("dynamic", &self.dynamic.keys().collect::<Vec<_>>())
            .finish()
    }
}
