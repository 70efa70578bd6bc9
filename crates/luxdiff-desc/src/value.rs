//! Attribute values and tolerance-based closeness.
//!
//! Scene attributes carry values of mixed shape: numeric scalars, strings,
//! booleans, vectors, matrices, and occasional nested tables. Rather than
//! inspecting runtime type names, everything is folded into the closed
//! [`Value`] variant type, and comparison dispatches on the tag.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Relative tolerance used by [`Tolerance::default`].
///
/// Matches standard `isclose` semantics for double-precision values.
pub const DEFAULT_REL_TOL: f64 = 1e-9;

/// Tolerance configuration for floating-point closeness checks.
///
/// Two finite values `a` and `b` are close when
/// `|a - b| <= max(rel_tol * max(|a|, |b|), abs_tol)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Relative tolerance, scaled by the larger magnitude of the operands.
    pub rel_tol: f64,
    /// Absolute tolerance floor, useful for comparisons near zero.
    pub abs_tol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rel_tol: DEFAULT_REL_TOL,
            abs_tol: 0.0,
        }
    }
}

impl Tolerance {
    /// Creates a tolerance with the given relative component and no
    /// absolute floor.
    pub fn relative(rel_tol: f64) -> Self {
        Self {
            rel_tol,
            abs_tol: 0.0,
        }
    }

    /// Returns true if `a` and `b` are equal within this tolerance.
    pub fn isclose(&self, a: f64, b: f64) -> bool {
        if a == b {
            // covers identical infinities and exact matches
            return true;
        }
        if !a.is_finite() || !b.is_finite() {
            return false;
        }
        let scale = self.rel_tol * a.abs().max(b.abs());
        (a - b).abs() <= scale.max(self.abs_tol)
    }
}

/// A single attribute value at one frame.
///
/// The `untagged` serde representation keeps the persisted JSON identical
/// to what the value "looks like": integers stay integers, reals stay
/// reals, vectors are plain arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean flag (e.g. `treatAsPoint`).
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// String, token, or asset path.
    Text(String),
    /// Ordered sequence: vectors, matrices (as nested rows), tuples.
    Sequence(Vec<Value>),
    /// Ordered string-keyed table.
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    /// Numeric view of a scalar, if this is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Flattens a sequence (arbitrarily nested) into scalars, returning
    /// `None` if any leaf is non-numeric.
    pub fn flatten_numeric(&self) -> Option<Vec<f64>> {
        fn walk(val: &Value, out: &mut Vec<f64>) -> bool {
            match val {
                Value::Int(_) | Value::Float(_) => {
                    out.push(val.as_f64().expect("numeric tag"));
                    true
                }
                Value::Sequence(items) => items.iter().all(|v| walk(v, out)),
                _ => false,
            }
        }
        let mut out = Vec::new();
        if walk(self, &mut out) {
            Some(out)
        } else {
            None
        }
    }

    /// Structural closeness check.
    ///
    /// Discrete types compare exactly; numeric scalars through the
    /// tolerance; sequences element-wise after flattening when fully
    /// numeric (so a row-major matrix and its flat form agree).
    /// Heterogeneous tags are never close.
    pub fn close(&self, other: &Value, tol: &Tolerance) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let (a, b) = (self.as_f64().expect("numeric"), other.as_f64().expect("numeric"));
                tol.isclose(a, b)
            }
            (Value::Sequence(a), Value::Sequence(b)) => {
                if let (Some(fa), Some(fb)) = (self.flatten_numeric(), other.flatten_numeric()) {
                    return fa.len() == fb.len()
                        && fa.iter().zip(&fb).all(|(x, y)| tol.isclose(*x, *y));
                }
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.close(y, tol))
            }
            (Value::Mapping(a), Value::Mapping(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|((ka, va), (kb, vb))| {
                        ka == kb && va.close(vb, tol)
                    })
            }
            _ => false,
        }
    }

    /// Partial order between values of the same shape.
    ///
    /// Numeric scalars order numerically, text lexicographically,
    /// sequences element-wise. Mismatched or unordered shapes yield
    /// `None`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Sequence(a), Value::Sequence(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        other => return Some(other),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
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
        Value::Text(v.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Sequence(v)
    }
}

impl<const N: usize> From<[f64; N]> for Value {
    fn from(v: [f64; N]) -> Self {
        Value::Sequence(v.iter().map(|f| Value::Float(*f)).collect())
    }
}

/// Direction of change of a varying attribute, determined from the first
/// two disagreeing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increasing,
    Decreasing,
}

impl Direction {
    /// Direction implied by moving from `old` to `new`.
    ///
    /// Only meaningful for values already known to differ beyond
    /// tolerance; unordered shapes fall back to `Decreasing`.
    pub fn of(old: &Value, new: &Value) -> Direction {
        match new.compare(old) {
            Some(Ordering::Greater) => Direction::Increasing,
            _ => Direction::Decreasing,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Increasing => write!(f, "increasing"),
            Direction::Decreasing => write!(f, "decreasing"),
        }
    }
}
