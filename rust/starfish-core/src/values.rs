//! Numeric value representation for the starfish VM.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A stack value: an exact integer or a float.
///
/// Mixed arithmetic promotes to `Float`. Equality through [`Value::num_eq`]
/// compares numerically, so `Int(1)` and `Float(1.0)` are the same number
/// even though the derived `PartialEq` keeps them apart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn from_char(c: char) -> Self {
        Value::Int(c as i64)
    }

    pub fn as_float(&self) -> f64 {
        match self {
            Value::Int(n) => *n as f64,
            Value::Float(f) => *f,
        }
    }

    /// The value as an exact integer, if it has one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => {
                if *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            Value::Float(_) => None,
        }
    }

    /// Truncating integer conversion, used where the language floors a
    /// coordinate or count before using it.
    pub fn truncate(&self) -> i64 {
        match self {
            Value::Int(n) => *n,
            Value::Float(f) => *f as i64,
        }
    }

    /// The Unicode scalar value this number encodes, if any.
    pub fn as_char(&self) -> Option<char> {
        let code = self.as_int()?;
        u32::try_from(code).ok().and_then(char::from_u32)
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Value::Int(n) => *n == 0,
            Value::Float(f) => *f == 0.0,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn num_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            _ => self.as_float() == other.as_float(),
        }
    }

    pub fn num_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            _ => self.as_float().partial_cmp(&other.as_float()),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::from_char(c)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
        }
    }
}

/// Integral floats print without a fraction; everything else uses the
/// shortest representation that round-trips.
pub fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.0}", f)
    } else {
        format!("{}", f)
    }
}
