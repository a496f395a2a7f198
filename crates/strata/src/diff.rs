//! Structural diff of two same-schema trees.
//!
//! Only explicitly stored data is compared — expressions are never
//! evaluated here, so comparison can never depend on incidental
//! memoization order. Discrepancies accumulate into a report keyed by
//! concrete canonical path; nothing raises per-leaf.

use indexmap::IndexMap;

use crate::tree::{Field, NodeId, Tree};
use crate::value::Value;

/// One recorded discrepancy.
#[derive(Debug, Clone, PartialEq)]
pub enum Discrepancy {
    /// Presence or kind mismatch.
    Type {
        left: &'static str,
        right: &'static str,
    },
    /// Container or leaf-array length mismatch; elements are not diffed.
    Length { left: usize, right: usize },
    /// Numeric difference beyond tolerance, as a normalized relative value.
    Numeric { relative: f64 },
    /// String inequality.
    Text { left: String, right: String },
}

/// Report type: concrete canonical path → discrepancy.
pub type DiffReport = IndexMap<String, Discrepancy>;

/// Normalized relative difference of two floats.
///
/// Identical values (including equal infinities and NaN on both sides)
/// differ by zero; any other non-finite pairing differs infinitely.
fn relative(a: f64, b: f64) -> f64 {
    if a == b || (a.is_nan() && b.is_nan()) {
        return 0.0;
    }
    if !a.is_finite() || !b.is_finite() {
        return f64::INFINITY;
    }
    let denom = a.abs().max(b.abs());
    if denom == 0.0 {
        0.0
    } else {
        (a - b).abs() / denom
    }
}

fn compare_values(a: &Value, b: &Value, tolerance: f64) -> Option<Discrepancy> {
    match (a, b) {
        _ if a.is_numeric() && b.is_numeric() => match (a.as_floats(), b.as_floats()) {
            (Some(xs), Some(ys)) => {
                if xs.len() != ys.len() {
                    return Some(Discrepancy::Length {
                        left: xs.len(),
                        right: ys.len(),
                    });
                }
                let worst = xs
                    .iter()
                    .zip(&ys)
                    .map(|(&x, &y)| relative(x, y))
                    .fold(0.0_f64, f64::max);
                (worst > tolerance).then_some(Discrepancy::Numeric { relative: worst })
            }
            // Scalar numerics.
            _ => {
                let (x, y) = (a.as_float(), b.as_float());
                match (x, y) {
                    (Some(x), Some(y)) => {
                        let rel = relative(x, y);
                        (rel > tolerance).then_some(Discrepancy::Numeric { relative: rel })
                    }
                    _ => Some(Discrepancy::Type {
                        left: a.kind(),
                        right: b.kind(),
                    }),
                }
            }
        },
        (Value::Str(x), Value::Str(y)) => (x != y).then(|| Discrepancy::Text {
            left: x.clone(),
            right: y.clone(),
        }),
        (Value::Strs(xs), Value::Strs(ys)) => {
            if xs.len() != ys.len() {
                return Some(Discrepancy::Length {
                    left: xs.len(),
                    right: ys.len(),
                });
            }
            xs.iter().zip(ys).find(|(x, y)| x != y).map(|(x, y)| Discrepancy::Text {
                left: x.clone(),
                right: y.clone(),
            })
        }
        _ => Some(Discrepancy::Type {
            left: a.kind(),
            right: b.kind(),
        }),
    }
}

impl Tree {
    /// Pairwise comparison against another tree of the same schema.
    ///
    /// Numeric leaves compare by normalized relative difference against
    /// `tolerance`; strings by exact equality; presence/kind mismatches are
    /// recorded as type discrepancies. Nested containers recurse only when
    /// `recursive`; record arrays of unequal length are reported without
    /// per-element diffing.
    pub fn diff(&self, other: &Tree, tolerance: f64, recursive: bool) -> DiffReport {
        let mut report = DiffReport::new();
        self.diff_records(other, self.root, other.root, tolerance, recursive, &mut report);
        report
    }

    fn diff_records(
        &self,
        other: &Tree,
        a: NodeId,
        b: NodeId,
        tolerance: f64,
        recursive: bool,
        report: &mut DiffReport,
    ) {
        let names: Vec<String> = self.record(a).fields.keys().cloned().collect();
        for name in names {
            let path = self.location_of(a, &name);
            match (self.record(a).fields.get(&name), other.record(b).fields.get(&name)) {
                (Some(Field::Data(_)), Some(Field::Data(_))) => {
                    let left = self.stored(a, &name);
                    let right = other.stored(b, &name);
                    match (left, right) {
                        (None, None) => {}
                        (Some(_), None) => {
                            report.insert(path, Discrepancy::Type { left: "data", right: "empty" });
                        }
                        (None, Some(_)) => {
                            report.insert(path, Discrepancy::Type { left: "empty", right: "data" });
                        }
                        (Some(x), Some(y)) => {
                            if let Some(d) = compare_values(x, y, tolerance) {
                                report.insert(path, d);
                            }
                        }
                    }
                }
                (Some(Field::Node(ca)), Some(Field::Node(cb))) => {
                    if recursive {
                        self.diff_records(other, *ca, *cb, tolerance, recursive, report);
                    }
                }
                (Some(Field::Nodes(aa)), Some(Field::Nodes(ab))) => {
                    if !recursive {
                        continue;
                    }
                    let (la, lb) = (self.len(*aa), other.len(*ab));
                    if la != lb {
                        report.insert(path, Discrepancy::Length { left: la, right: lb });
                        continue;
                    }
                    let elems_a = self.elements(*aa);
                    let elems_b = other.elements(*ab);
                    for (ea, eb) in elems_a.into_iter().zip(elems_b) {
                        self.diff_records(other, ea, eb, tolerance, recursive, report);
                    }
                }
                // Schema divergence between the two trees.
                _ => {
                    report.insert(path, Discrepancy::Type { left: "field", right: "missing" });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::demo_tree;

    #[test]
    fn identical_trees_diff_empty() {
        let mut a = demo_tree();
        let root = a.root();
        a.set(root, "comment", "same").unwrap();
        let system = a.child_array(root, "system").unwrap();
        a.resize(system, 2).unwrap();
        for elem in a.elements(system) {
            a.set(elem, "cost", 4.25).unwrap();
        }
        let b = a.deep_copy(root);
        assert!(a.diff(&b, 0.0, true).is_empty());
    }

    #[test]
    fn single_numeric_leaf_beyond_tolerance() {
        let mut a = demo_tree();
        let root = a.root();
        let system = a.child_array(root, "system").unwrap();
        a.resize(system, 2).unwrap();
        for elem in a.elements(system) {
            a.set(elem, "cost", 10.0).unwrap();
        }
        let mut b = a.deep_copy(root);
        let b_system = b.child_array(b.root(), "system").unwrap();
        let target = b.elements(b_system)[1];
        b.set(target, "cost", 10.5).unwrap();

        // Within tolerance: clean.
        assert!(a.diff(&b, 0.1, true).is_empty());
        // Beyond tolerance: exactly one path.
        let report = a.diff(&b, 0.01, true);
        assert_eq!(report.len(), 1);
        assert!(matches!(
            report.get("system[1].cost"),
            Some(Discrepancy::Numeric { .. })
        ));
    }

    #[test]
    fn presence_mismatch_is_a_type_discrepancy() {
        let mut a = demo_tree();
        let root = a.root();
        a.set(root, "comment", "present").unwrap();
        let b = demo_tree();
        let report = a.diff(&b, 0.0, true);
        assert_eq!(
            report.get("comment"),
            Some(&Discrepancy::Type { left: "data", right: "empty" })
        );
    }

    #[test]
    fn array_length_mismatch_reported_without_recursion() {
        let mut a = demo_tree();
        let mut b = demo_tree();
        let sa = a.child_array(a.root(), "system").unwrap();
        let sb = b.child_array(b.root(), "system").unwrap();
        a.resize(sa, 3).unwrap();
        b.resize(sb, 1).unwrap();
        let elem = b.elements(sb)[0];
        b.set(elem, "cost", 1.0).unwrap();

        let report = a.diff(&b, 0.0, true);
        assert_eq!(
            report.get("system"),
            Some(&Discrepancy::Length { left: 3, right: 1 })
        );
        // No per-element paths.
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn non_identical_nan_and_inf_always_exceed() {
        let mut a = demo_tree();
        let mut b = demo_tree();
        let pa = a.child_record(a.root(), "profile").unwrap();
        let pb = b.child_record(b.root(), "profile").unwrap();
        a.set(pa, "position", vec![0.0, f64::NAN]).unwrap();
        b.set(pb, "position", vec![0.0, 1.0]).unwrap();
        let report = a.diff(&b, 1e9, true);
        assert!(matches!(
            report.get("profile.position"),
            Some(Discrepancy::Numeric { .. })
        ));

        // Identical NaN / identical infinities are clean.
        let mut c = demo_tree();
        let pc = c.child_record(c.root(), "profile").unwrap();
        c.set(pc, "position", vec![0.0, f64::NAN]).unwrap();
        assert!(a.diff(&c, 0.0, true).is_empty());
    }

    #[test]
    fn strings_compare_exactly() {
        let mut a = demo_tree();
        let mut b = demo_tree();
        a.set(a.root(), "comment", "left").unwrap();
        b.set(b.root(), "comment", "right").unwrap();
        let report = a.diff(&b, 0.0, true);
        assert_eq!(
            report.get("comment"),
            Some(&Discrepancy::Text { left: "left".into(), right: "right".into() })
        );
    }

    #[test]
    fn non_recursive_skips_containers() {
        let mut a = demo_tree();
        let b = demo_tree();
        let profile = a.child_record(a.root(), "profile").unwrap();
        a.set(profile, "label", "x").unwrap();
        assert!(a.diff(&b, 0.0, false).is_empty());
        assert_eq!(a.diff(&b, 0.0, true).len(), 1);
    }

    #[test]
    fn expressions_are_never_evaluated_by_diff() {
        use crate::testutil::demo_catalog;
        use crate::{ExprKind, ExprRegistry};
        use std::sync::Arc;

        let mut registry = ExprRegistry::new();
        registry.register("comment", ExprKind::OneTime, |_, _| {
            Ok(Value::Str("computed".into()))
        });
        let a = Tree::new(demo_catalog(), Arc::new(registry));
        let b = demo_tree();
        // The unevaluated one-time expression is not data.
        assert!(a.diff(&b, 0.0, true).is_empty());
        assert!(!a.is_filled(a.root(), "comment"));
    }

    #[test]
    fn relative_metric() {
        assert_eq!(relative(0.0, 0.0), 0.0);
        assert_eq!(relative(1.0, 1.0), 0.0);
        assert!(relative(1.0, 2.0) > 0.49 && relative(1.0, 2.0) < 0.51);
        assert_eq!(relative(f64::INFINITY, f64::INFINITY), 0.0);
        assert_eq!(relative(f64::INFINITY, 1.0), f64::INFINITY);
        assert_eq!(relative(f64::NAN, f64::NAN), 0.0);
        assert_eq!(relative(f64::NAN, 1.0), f64::INFINITY);
    }
}
