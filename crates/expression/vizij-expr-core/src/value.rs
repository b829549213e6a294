//! Values flowing through the evaluator.
//!
//! `H` is the backend's opaque handle type (a node plug, an attribute path, ...). Literal
//! values never touch the backend; handles only come from bindings or backend primitives.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::error::CompileError;
use crate::token::RotateOrder;

/// Ordered components of a vector literal. Always 2, 3 or 4 long.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence<H>(Vec<Value<H>>);

impl<H> Sequence<H> {
    pub const MIN_LEN: usize = 2;
    pub const MAX_LEN: usize = 4;

    /// Build a sequence, rejecting any length outside `2..=4`.
    pub fn new(items: Vec<Value<H>>) -> Result<Self, CompileError> {
        if (Self::MIN_LEN..=Self::MAX_LEN).contains(&items.len()) {
            Ok(Sequence(items))
        } else {
            Err(CompileError::SequenceLength(items.len()))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value<H>> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Value<H>] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&Value<H>> {
        self.0.get(index)
    }

    pub fn into_vec(self) -> Vec<Value<H>> {
        self.0
    }

    /// All components as scalars, or `None` if any component is not a plain number.
    pub fn scalars(&self) -> Option<Vec<f64>> {
        self.0.iter().map(Value::as_scalar).collect()
    }
}

/// A compile-time value: either a literal known to the compiler or a backend handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<H> {
    Scalar(f64),
    Bool(bool),
    Sequence(Sequence<H>),
    RotateOrder(RotateOrder),
    Handle(H),
}

impl<H> Value<H> {
    /// Sequence of scalars; fails unless `components` has 2, 3 or 4 entries.
    pub fn vector(components: &[f64]) -> Result<Self, CompileError> {
        Sequence::new(components.iter().copied().map(Value::Scalar).collect()).map(Value::Sequence)
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&H> {
        match self {
            Value::Handle(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence<H>> {
        match self {
            Value::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Convert declarative JSON (numbers, booleans, 2-4 number arrays, rotate-order
    /// keywords) into a literal value.
    pub fn from_json(json: &JsonValue) -> Result<Self, CompileError> {
        match json {
            JsonValue::Number(n) => n
                .as_f64()
                .map(Value::Scalar)
                .ok_or_else(|| CompileError::InvalidBinding(format!("number {n} is not representable"))),
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            JsonValue::Array(items) => {
                let values = items
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<Vec<_>, _>>()?;
                Sequence::new(values).map(Value::Sequence)
            }
            JsonValue::String(word) => RotateOrder::from_keyword(word)
                .map(Value::RotateOrder)
                .ok_or_else(|| CompileError::InvalidBinding(format!("unknown keyword {word:?}"))),
            other => Err(CompileError::InvalidBinding(format!(
                "unsupported JSON value {other}"
            ))),
        }
    }
}

impl<H: fmt::Display> Value<H> {
    /// Normalised, hashable form used to look a value back up by its binding name.
    pub fn key(&self) -> ValueKey {
        ValueKey(self.to_string())
    }
}

impl<H: fmt::Display> fmt::Display for Value<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(v) => write!(f, "{v}"),
            Value::Bool(true) => f.write_str("TRUE"),
            Value::Bool(false) => f.write_str("FALSE"),
            Value::Sequence(seq) => {
                f.write_str("[")?;
                for (i, item) in seq.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::RotateOrder(order) => f.write_str(order.keyword()),
            Value::Handle(handle) => write!(f, "{handle}"),
        }
    }
}

impl<H> From<f64> for Value<H> {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl<H> From<bool> for Value<H> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<H> From<RotateOrder> for Value<H> {
    fn from(order: RotateOrder) -> Self {
        Value::RotateOrder(order)
    }
}

/// Reverse-lookup key for a bound value. Sequences normalise to their ordered,
/// bracketed rendering so equal literals share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueKey(String);

impl ValueKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
