//! Numeric helper utilities shared across node evaluators.

use crate::types::GraphValue;

/// Components of a numeric value; booleans read as 0 or 1.
pub fn as_vector(v: &GraphValue) -> Vec<f64> {
    match v {
        GraphValue::Float(f) => vec![*f],
        GraphValue::Bool(b) => vec![if *b { 1.0 } else { 0.0 }],
        GraphValue::Vector(items) => items.clone(),
    }
}

/// Coerce a [`GraphValue`] to a single `f64`, reading the first component of vectors.
pub fn as_float(v: &GraphValue) -> f64 {
    match v {
        GraphValue::Float(f) => *f,
        GraphValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        GraphValue::Vector(items) => items.first().copied().unwrap_or(f64::NAN),
    }
}

/// Coerce a [`GraphValue`] to a boolean, treating non-zero numeric entries as `true`.
pub fn as_bool(v: &GraphValue) -> bool {
    match v {
        GraphValue::Bool(b) => *b,
        GraphValue::Float(f) => *f != 0.0,
        GraphValue::Vector(items) => items.iter().any(|x| *x != 0.0),
    }
}

/// Apply `op` pairwise to two numeric values, broadcasting scalars over vectors.
/// Vectors of different lengths produce a NaN-filled vector of the longer length.
pub fn binary_numeric<F>(lhs: &GraphValue, rhs: &GraphValue, op: F) -> GraphValue
where
    F: Fn(f64, f64) -> f64 + Copy,
{
    match (lhs, rhs) {
        (GraphValue::Vector(a), GraphValue::Vector(b)) => {
            if a.len() == b.len() {
                GraphValue::Vector(a.iter().zip(b).map(|(x, y)| op(*x, *y)).collect())
            } else {
                GraphValue::Vector(vec![f64::NAN; a.len().max(b.len())])
            }
        }
        (GraphValue::Vector(a), scalar) => {
            let s = as_float(scalar);
            GraphValue::Vector(a.iter().map(|x| op(*x, s)).collect())
        }
        (scalar, GraphValue::Vector(b)) => {
            let s = as_float(scalar);
            GraphValue::Vector(b.iter().map(|y| op(s, *y)).collect())
        }
        (a, b) => GraphValue::Float(op(as_float(a), as_float(b))),
    }
}

/// Apply `op` to every component of `input`.
pub fn unary_numeric<F>(input: &GraphValue, op: F) -> GraphValue
where
    F: Fn(f64) -> f64 + Copy,
{
    match input {
        GraphValue::Vector(items) => GraphValue::Vector(items.iter().map(|x| op(*x)).collect()),
        other => GraphValue::Float(op(as_float(other))),
    }
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn length(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}
