//! Access log — an optional diagnostic sink recording engine activity by
//! canonical location.
//!
//! Three path sets are kept: stored-data reads, expression evaluations, and
//! explicit writes. The log is owned by its tree (an explicit object, not an
//! ambient global) and is inert until enabled.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct AccessLog {
    enabled: bool,
    read: BTreeSet<String>,
    expr: BTreeSet<String>,
    write: BTreeSet<String>,
}

impl AccessLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Clears all three path sets; the enable flag is untouched.
    pub fn reset(&mut self) {
        self.read.clear();
        self.expr.clear();
        self.write.clear();
    }

    pub fn reads(&self) -> &BTreeSet<String> {
        &self.read
    }

    pub fn exprs(&self) -> &BTreeSet<String> {
        &self.expr
    }

    pub fn writes(&self) -> &BTreeSet<String> {
        &self.write
    }

    /// Sorted enumeration of all three sets, one location per line.
    pub fn show(&self) -> String {
        let mut out = String::new();
        for (tag, set) in [("read", &self.read), ("expr", &self.expr), ("write", &self.write)] {
            for loc in set {
                out.push_str(tag);
                out.push_str("  ");
                out.push_str(loc);
                out.push('\n');
            }
        }
        out
    }

    pub(crate) fn note_read(&mut self, location: &str) {
        if self.enabled {
            self.read.insert(location.to_string());
        }
    }

    pub(crate) fn note_expr(&mut self, location: &str) {
        if self.enabled {
            self.expr.insert(location.to_string());
        }
    }

    pub(crate) fn note_write(&mut self, location: &str) {
        if self.enabled {
            self.write.insert(location.to_string());
        }
    }
}
