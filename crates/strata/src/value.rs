//! Leaf values and their conformance to declared schema types.

use strata_catalog::DataType;

/// A leaf value stored in a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Strs(Vec<String>),
}

impl Value {
    /// Short kind tag used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Ints(_) => "int[]",
            Value::Floats(_) => "float[]",
            Value::Strs(_) => "str[]",
        }
    }

    /// True for the numeric kinds (scalar or array).
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::Float(_) | Value::Ints(_) | Value::Floats(_)
        )
    }

    /// Scalar numeric view; integers widen to float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric array view; integer arrays widen to float.
    pub fn as_floats(&self) -> Option<Vec<f64>> {
        match self {
            Value::Floats(fs) => Some(fs.clone()),
            Value::Ints(is) => Some(is.iter().map(|&i| i as f64).collect()),
            _ => None,
        }
    }

    /// Coerce into the declared type, or `None` when incompatible.
    ///
    /// The only widening accepted is integer into a float slot (scalar and
    /// array); everything else must match exactly.
    pub(crate) fn conform(self, declared: DataType) -> Option<Value> {
        match (declared, self) {
            (DataType::Int, v @ Value::Int(_)) => Some(v),
            (DataType::Float, Value::Int(i)) => Some(Value::Float(i as f64)),
            (DataType::Float, v @ Value::Float(_)) => Some(v),
            (DataType::Str, v @ Value::Str(_)) => Some(v),
            (DataType::IntArray, v @ Value::Ints(_)) => Some(v),
            (DataType::FloatArray, Value::Ints(is)) => {
                Some(Value::Floats(is.iter().map(|&i| i as f64).collect()))
            }
            (DataType::FloatArray, v @ Value::Floats(_)) => Some(v),
            (DataType::StrArray, v @ Value::Strs(_)) => Some(v),
            _ => None,
        }
    }
}

/// Display name of a declared type, for error messages.
pub fn declared_name(dt: DataType) -> &'static str {
    match dt {
        DataType::Int => "INT_0D",
        DataType::Float => "FLT_0D",
        DataType::Str => "STR_0D",
        DataType::IntArray => "INT_1D",
        DataType::FloatArray => "FLT_1D",
        DataType::StrArray => "STR_1D",
        DataType::Structure => "STRUCTURE",
        DataType::StructArray => "STRUCT_ARRAY",
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::Ints(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Floats(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::Strs(v)
    }
}

impl From<&[f64]> for Value {
    fn from(v: &[f64]) -> Self {
        Value::Floats(v.to_vec())
    }
}
