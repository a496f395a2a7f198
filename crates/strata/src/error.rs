use thiserror::Error;

/// Error kinds of the core engine.
///
/// Only `MissingData` is routinely recovered from (via the default-returning
/// accessor); the rest propagate to the caller. Mutating a frozen node is a
/// programmer error and panics instead of returning a variant.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    #[error("MISSING_DATA: {0}")]
    MissingData(String),

    #[error("WRONG_TYPE: {field} expects {expected}, got {actual}")]
    WrongType {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("MISSING_COORDINATE: {field} depends on {coordinate}")]
    MissingCoordinate { field: String, coordinate: String },

    #[error("UNKNOWN_PATH: {0}")]
    UnknownPath(String),

    #[error("UNKNOWN_FIELD: {0}")]
    UnknownField(String),

    #[error("INDEX_OUT_OF_RANGE: {index} >= {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("AMBIGUOUS_MATCH: {0} elements match")]
    AmbiguousMatch(usize),

    #[error("TIME_ORDERING_VIOLATION: {given} is older than {last}")]
    TimeOrderingViolation { last: f64, given: f64 },

    #[error("EXPRESSION: {0}")]
    Expression(String),
}
