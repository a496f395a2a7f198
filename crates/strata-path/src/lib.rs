//! Canonical path utilities for strata trees.
//!
//! A canonical path names one field in a schema-typed tree, using dots
//! between field names and brackets for array element indices:
//! `system[2].cost`, `profile.density`, `time`. The placeholder form
//! `system[:].cost` (a [`Step::Wild`] index) is the *template* of a path —
//! the key form used by the schema catalog and the expression registry.
//!
//! # Example
//!
//! ```
//! use strata_path::{parse, format, template, Step};
//!
//! let path = parse("system[2].cost").unwrap();
//! assert_eq!(path, vec![
//!     Step::Name("system".to_string()),
//!     Step::Index(2),
//!     Step::Name("cost".to_string()),
//! ]);
//!
//! assert_eq!(format(&path), "system[2].cost");
//! assert_eq!(format(&template(&path)), "system[:].cost");
//! ```

use thiserror::Error;

/// One step of a canonical path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// A named field.
    Name(String),
    /// A concrete array element index.
    Index(usize),
    /// The `[:]` index placeholder used in template paths.
    Wild,
}

impl Step {
    /// Returns the field name, or `None` for index steps.
    pub fn name(&self) -> Option<&str> {
        match self {
            Step::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the concrete index, or `None` for name/placeholder steps.
    pub fn index(&self) -> Option<usize> {
        match self {
            Step::Index(i) => Some(*i),
            _ => None,
        }
    }
}

/// A parsed canonical path.
pub type Path = Vec<Step>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("EMPTY_STEP")]
    EmptyStep,
    #[error("UNCLOSED_BRACKET")]
    UnclosedBracket,
    #[error("INVALID_INDEX")]
    InvalidIndex,
}

/// Check if a string represents a valid non-negative array index.
///
/// # Example
///
/// ```
/// use strata_path::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index("abc"));
/// assert!(!is_valid_index(""));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a canonical path string into steps.
///
/// - The empty string parses to the empty (root) path.
/// - `a.b` splits on dots into named steps.
/// - `a[2]` appends a concrete index step after the name.
/// - `a[:]` appends the index placeholder.
///
/// # Example
///
/// ```
/// use strata_path::{parse, Step};
///
/// assert_eq!(parse(""), Ok(vec![]));
/// assert_eq!(parse("time"), Ok(vec![Step::Name("time".to_string())]));
/// assert!(parse("a..b").is_err());
/// assert!(parse("a[x]").is_err());
/// ```
pub fn parse(path: &str) -> Result<Path, PathError> {
    let mut steps = Path::new();
    if path.is_empty() {
        return Ok(steps);
    }
    for segment in path.split('.') {
        if segment.is_empty() {
            return Err(PathError::EmptyStep);
        }
        let mut rest = segment;
        // Leading name part, up to the first bracket.
        match rest.find('[') {
            None => {
                steps.push(Step::Name(rest.to_string()));
                continue;
            }
            Some(0) => return Err(PathError::EmptyStep),
            Some(open) => {
                steps.push(Step::Name(rest[..open].to_string()));
                rest = &rest[open..];
            }
        }
        // Any number of `[...]` index suffixes.
        while !rest.is_empty() {
            if !rest.starts_with('[') {
                return Err(PathError::InvalidIndex);
            }
            let close = rest.find(']').ok_or(PathError::UnclosedBracket)?;
            let inner = &rest[1..close];
            if inner == ":" {
                steps.push(Step::Wild);
            } else {
                if !is_valid_index(inner) {
                    return Err(PathError::InvalidIndex);
                }
                let idx = inner.parse().map_err(|_| PathError::InvalidIndex)?;
                steps.push(Step::Index(idx));
            }
            rest = &rest[close + 1..];
        }
    }
    Ok(steps)
}

/// Format path steps back into a canonical path string.
///
/// # Example
///
/// ```
/// use strata_path::{format, Step};
///
/// let path = vec![Step::Name("system".to_string()), Step::Index(1)];
/// assert_eq!(format(&path), "system[1]");
/// assert_eq!(format(&[]), "");
/// ```
pub fn format(path: &[Step]) -> String {
    let mut out = String::new();
    for step in path {
        match step {
            Step::Name(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Step::Index(idx) => {
                out.push('[');
                out.push_str(&idx.to_string());
                out.push(']');
            }
            Step::Wild => out.push_str("[:]"),
        }
    }
    out
}

/// Replace every concrete index with the `[:]` placeholder.
///
/// The result is the template form, i.e. the schema catalog key of the path.
///
/// # Example
///
/// ```
/// use strata_path::{parse, format, template};
///
/// let path = parse("system[4].sensor[0].gain").unwrap();
/// assert_eq!(format(&template(&path)), "system[:].sensor[:].gain");
/// ```
pub fn template(path: &[Step]) -> Path {
    path.iter()
        .map(|s| match s {
            Step::Index(_) => Step::Wild,
            other => other.clone(),
        })
        .collect()
}

/// Whether two steps match for prefix purposes.
///
/// A placeholder matches any concrete index (and another placeholder);
/// names and concrete indices match by equality.
fn step_matches(a: &Step, b: &Step) -> bool {
    match (a, b) {
        (Step::Wild, Step::Index(_)) | (Step::Index(_), Step::Wild) => true,
        _ => a == b,
    }
}

/// Length of the longest common prefix of two paths.
///
/// Placeholder steps match concrete indices, so a template path shares a
/// prefix with any of its instances.
///
/// # Example
///
/// ```
/// use strata_path::{parse, common_prefix};
///
/// let a = parse("system[2].cost").unwrap();
/// let b = parse("system[:].identifier").unwrap();
/// assert_eq!(common_prefix(&a, &b), 2);
/// ```
pub fn common_prefix(a: &[Step], b: &[Step]) -> usize {
    let mut n = 0;
    while n < a.len() && n < b.len() && step_matches(&a[n], &b[n]) {
        n += 1;
    }
    n
}

/// Check if `parent` strictly contains `child`.
///
/// # Example
///
/// ```
/// use strata_path::{parse, is_child};
///
/// let parent = parse("system[0]").unwrap();
/// let child = parse("system[0].cost").unwrap();
/// assert!(is_child(&parent, &child));
/// assert!(!is_child(&child, &parent));
/// assert!(!is_child(&parent, &parent));
/// ```
pub fn is_child(parent: &[Step], child: &[Step]) -> bool {
    parent.len() < child.len() && common_prefix(parent, child) == parent.len()
}

/// The parent path of `path`.
///
/// # Errors
///
/// Fails on the root (empty) path.
///
/// # Example
///
/// ```
/// use strata_path::{parse, parent_of, format};
///
/// let path = parse("system[1].cost").unwrap();
/// assert_eq!(format(&parent_of(&path).unwrap()), "system[1]");
/// assert!(parent_of(&[]).is_err());
/// ```
pub fn parent_of(path: &[Step]) -> Result<Path, PathError> {
    if path.is_empty() {
        return Err(PathError::EmptyStep);
    }
    Ok(path[..path.len() - 1].to_vec())
}
