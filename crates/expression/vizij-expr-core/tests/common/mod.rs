//! Call-recording reference backend shared by the integration tests.
//!
//! Literal scalar operands are computed numerically; anything involving a handle yields a
//! fresh symbolic handle. Every primitive call is logged as `name(arg, ...)`.

#![allow(dead_code)]

use std::fmt;

use anyhow::{anyhow, bail};
use vizij_expr_core::{
    Backend, BackendResult, Comparison, Component, Derived, RotateOrder, Sequence, Value,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sym(pub String);

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type V = Value<Sym>;

pub fn sym(name: &str) -> V {
    Value::Handle(Sym(name.to_string()))
}

#[derive(Debug, Default)]
pub struct Calculator {
    pub calls: Vec<String>,
    pub assignments: Vec<(String, String)>,
    next: usize,
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of logged calls to `name`.
    pub fn count(&self, name: &str) -> usize {
        let prefix = format!("{name}(");
        self.calls.iter().filter(|c| c.starts_with(&prefix)).count()
    }

    fn record(&mut self, name: &str, args: &[&V]) {
        let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.calls.push(format!("{name}({})", rendered.join(", ")));
    }

    fn symbolic(&mut self, name: &str) -> V {
        self.next += 1;
        Value::Handle(Sym(format!("{name}#{}", self.next)))
    }

    fn unary(&mut self, name: &str, a: V, f: impl Fn(f64) -> f64) -> BackendResult<V> {
        self.record(name, &[&a]);
        Ok(match a.as_scalar() {
            Some(x) => Value::Scalar(f(x)),
            None => self.symbolic(name),
        })
    }

    fn binary(&mut self, name: &str, a: V, b: V, f: impl Fn(f64, f64) -> f64) -> BackendResult<V> {
        self.record(name, &[&a, &b]);
        Ok(match (a.as_scalar(), b.as_scalar()) {
            (Some(x), Some(y)) => Value::Scalar(f(x, y)),
            _ => self.symbolic(name),
        })
    }

    fn logic(&mut self, name: &str, a: V, b: V, f: impl Fn(bool, bool) -> bool) -> BackendResult<V> {
        self.record(name, &[&a, &b]);
        Ok(match (truth(&a), truth(&b)) {
            (Some(x), Some(y)) => Value::Bool(f(x, y)),
            _ => self.symbolic(name),
        })
    }

    fn vectors(&mut self, name: &str, args: &[&V]) -> Option<Vec<Vec<f64>>> {
        self.record(name, args);
        args.iter()
            .map(|a| a.as_sequence().and_then(Sequence::scalars))
            .collect()
    }
}

fn truth(v: &V) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Scalar(x) => Some(*x != 0.0),
        _ => None,
    }
}

fn magnitude(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn vector_value(components: Vec<f64>) -> BackendResult<V> {
    Ok(Value::vector(&components)?)
}

impl Backend for Calculator {
    type Handle = Sym;

    fn equal(&mut self, source: V, destination: V) -> BackendResult<()> {
        self.record("equal", &[&source, &destination]);
        self.assignments
            .push((source.to_string(), destination.to_string()));
        Ok(())
    }

    fn add(&mut self, a: V, b: V) -> BackendResult<V> {
        self.binary("add", a, b, |x, y| x + y)
    }

    fn subtract(&mut self, a: V, b: V) -> BackendResult<V> {
        self.binary("subtract", a, b, |x, y| x - y)
    }

    fn multiply(&mut self, a: V, b: V) -> BackendResult<V> {
        self.binary("multiply", a, b, |x, y| x * y)
    }

    fn divide(&mut self, a: V, b: V) -> BackendResult<V> {
        self.binary("divide", a, b, |x, y| x / y)
    }

    fn pow(&mut self, a: V, b: V) -> BackendResult<V> {
        self.binary("pow", a, b, f64::powf)
    }

    fn logical_or(&mut self, a: V, b: V) -> BackendResult<V> {
        self.logic("logical_or", a, b, |x, y| x || y)
    }

    fn logical_and(&mut self, a: V, b: V) -> BackendResult<V> {
        self.logic("logical_and", a, b, |x, y| x && y)
    }

    fn logical_xor(&mut self, a: V, b: V) -> BackendResult<V> {
        self.logic("logical_xor", a, b, |x, y| x ^ y)
    }

    fn logical_not(&mut self, a: V) -> BackendResult<V> {
        self.record("logical_not", &[&a]);
        Ok(match truth(&a) {
            Some(x) => Value::Bool(!x),
            None => self.symbolic("logical_not"),
        })
    }

    fn clamp(&mut self, value: V, min: V, max: V) -> BackendResult<V> {
        self.record("clamp", &[&value, &min, &max]);
        Ok(match (value.as_scalar(), min.as_scalar(), max.as_scalar()) {
            (Some(v), Some(lo), Some(hi)) => Value::Scalar(v.max(lo).min(hi)),
            _ => self.symbolic("clamp"),
        })
    }

    fn condition(&mut self, first: V, op: Comparison, second: V, if_true: V, if_false: V) -> BackendResult<V> {
        self.record("condition", &[&first, &second, &if_true, &if_false]);
        Ok(match (first.as_scalar(), second.as_scalar()) {
            (Some(a), Some(b)) if op.test(a, b) => if_true,
            (Some(_), Some(_)) => if_false,
            _ => self.symbolic("condition"),
        })
    }

    fn lerp(&mut self, a: V, b: V, t: V) -> BackendResult<V> {
        self.record("lerp", &[&a, &b, &t]);
        Ok(match (a.as_scalar(), b.as_scalar(), t.as_scalar()) {
            (Some(a), Some(b), Some(t)) => Value::Scalar(a + (b - a) * t),
            _ => self.symbolic("lerp"),
        })
    }

    fn remap(&mut self, value: V, old_min: V, old_max: V, new_min: V, new_max: V) -> BackendResult<V> {
        self.record("remap", &[&value, &old_min, &old_max, &new_min, &new_max]);
        let args = [&value, &old_min, &old_max, &new_min, &new_max];
        let scalars: Option<Vec<f64>> = args.iter().map(|v| v.as_scalar()).collect();
        Ok(match scalars.as_deref() {
            Some([v, a, b, c, d]) => Value::Scalar(c + (v - a) / (b - a) * (d - c)),
            _ => self.symbolic("remap"),
        })
    }

    fn cos(&mut self, a: V) -> BackendResult<V> {
        self.unary("cos", a, f64::cos)
    }

    fn sin(&mut self, a: V) -> BackendResult<V> {
        self.unary("sin", a, f64::sin)
    }

    fn acos(&mut self, a: V) -> BackendResult<V> {
        self.unary("acos", a, f64::acos)
    }

    fn asin(&mut self, a: V) -> BackendResult<V> {
        self.unary("asin", a, f64::asin)
    }

    fn atan(&mut self, a: V) -> BackendResult<V> {
        self.unary("atan", a, f64::atan)
    }

    fn noise(&mut self, a: V) -> BackendResult<V> {
        self.record("noise", &[&a]);
        Ok(self.symbolic("noise"))
    }

    fn dnoise(&mut self, a: V) -> BackendResult<V> {
        self.record("dnoise", &[&a]);
        Ok(self.symbolic("dnoise"))
    }

    fn get_component(&mut self, object: V, component: &Component) -> BackendResult<V> {
        self.record("get_component", &[&object]);
        match (&object, component) {
            (Value::Sequence(seq), Component::Axis(index)) => seq
                .get(*index)
                .cloned()
                .ok_or_else(|| anyhow!("component {component} out of range for {object}")),
            (Value::Handle(_), _) => Ok(self.symbolic("get_component")),
            _ => bail!("cannot read {component} from {object}"),
        }
    }

    fn is_scalar(&self, value: &V) -> bool {
        matches!(value, Value::Scalar(_))
    }

    fn is_vector(&self, value: &V) -> bool {
        matches!(value, Value::Sequence(_))
    }

    fn norm(&mut self, v: V) -> BackendResult<V> {
        match self.vectors("norm", &[&v]).as_deref() {
            Some([v]) => {
                let m = magnitude(v);
                vector_value(v.iter().map(|x| x / m).collect())
            }
            _ => Ok(self.symbolic("norm")),
        }
    }

    fn dot(&mut self, a: V, b: V) -> BackendResult<V> {
        match self.vectors("dot", &[&a, &b]).as_deref() {
            Some([a, b]) => Ok(Value::Scalar(a.iter().zip(b).map(|(x, y)| x * y).sum())),
            _ => Ok(self.symbolic("dot")),
        }
    }

    fn cross(&mut self, a: V, b: V) -> BackendResult<V> {
        match self.vectors("cross", &[&a, &b]).as_deref() {
            Some([a, b]) if a.len() == 3 && b.len() == 3 => vector_value(vec![
                a[1] * b[2] - a[2] * b[1],
                a[2] * b[0] - a[0] * b[2],
                a[0] * b[1] - a[1] * b[0],
            ]),
            _ => Ok(self.symbolic("cross")),
        }
    }

    fn len(&mut self, v: V) -> BackendResult<V> {
        match self.vectors("len", &[&v]).as_deref() {
            Some([v]) => Ok(Value::Scalar(magnitude(v))),
            _ => Ok(self.symbolic("len")),
        }
    }

    fn distance(&mut self, a: V, b: V) -> BackendResult<V> {
        match self.vectors("distance", &[&a, &b]).as_deref() {
            Some([a, b]) => {
                let delta: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
                Ok(Value::Scalar(magnitude(&delta)))
            }
            _ => Ok(self.symbolic("distance")),
        }
    }

    fn angle(&mut self, a: V, b: V) -> BackendResult<V> {
        match self.vectors("angle", &[&a, &b]).as_deref() {
            Some([a, b]) => {
                let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let cos = dot / (magnitude(a) * magnitude(b));
                Ok(Value::Scalar(cos.clamp(-1.0, 1.0).acos()))
            }
            _ => Ok(self.symbolic("angle")),
        }
    }

    fn vector(&mut self, components: Vec<V>) -> BackendResult<V> {
        let refs: Vec<&V> = components.iter().collect();
        self.record("vector", &refs);
        Ok(Value::Sequence(Sequence::new(components)?))
    }

    fn euler(&mut self, args: Vec<V>) -> BackendResult<V> {
        let refs: Vec<&V> = args.iter().collect();
        self.record("euler", &refs);
        Ok(self.symbolic("euler"))
    }

    fn rotate_order(&mut self, value: V) -> BackendResult<V> {
        self.record("rotate_order", &[&value]);
        match value {
            Value::RotateOrder(_) => Ok(value),
            Value::Scalar(x) => RotateOrder::from_index(x as usize)
                .map(Value::RotateOrder)
                .ok_or_else(|| anyhow!("no rotate order at index {x}")),
            _ => Ok(self.symbolic("rotate_order")),
        }
    }

    fn quat(&mut self, args: Vec<V>) -> BackendResult<V> {
        let refs: Vec<&V> = args.iter().collect();
        self.record("quat", &refs);
        Ok(self.symbolic("quat"))
    }

    fn transform(&mut self, args: Vec<V>) -> BackendResult<V> {
        let refs: Vec<&V> = args.iter().collect();
        self.record("transform", &refs);
        Ok(self.symbolic("transform"))
    }

    fn matrix(&mut self, args: Vec<V>) -> BackendResult<V> {
        let refs: Vec<&V> = args.iter().collect();
        self.record("matrix", &refs);
        Ok(self.symbolic("matrix"))
    }

    fn slerp(&mut self, a: V, b: V, t: V) -> BackendResult<V> {
        self.record("slerp", &[&a, &b, &t]);
        Ok(self.symbolic("slerp"))
    }

    fn int(&mut self, a: V) -> BackendResult<V> {
        self.unary("int", a, f64::trunc)
    }

    fn bool(&mut self, a: V) -> BackendResult<V> {
        self.record("bool", &[&a]);
        Ok(match truth(&a) {
            Some(x) => Value::Bool(x),
            None => self.symbolic("bool"),
        })
    }

    fn switch(&mut self, selector: V, options: Vec<V>) -> BackendResult<V> {
        let mut refs: Vec<&V> = vec![&selector];
        refs.extend(options.iter());
        self.record("switch", &refs);
        match selector.as_scalar() {
            Some(index) => options
                .get(index as usize)
                .cloned()
                .ok_or_else(|| anyhow!("switch selector {index} out of range")),
            None => Ok(self.symbolic("switch")),
        }
    }
}

impl Derived for Calculator {}
