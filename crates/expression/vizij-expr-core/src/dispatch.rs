//! Dispatch table from evaluated operators to backend calls.

use std::fmt;

use crate::backend::{BackendValue, Derived};
use crate::error::{CompileError, Result};
use crate::token::{BinaryOp, Comparison, Component, LIST_MARKER};
use crate::value::{Sequence, Value};

/// Accepted argument counts for a callable function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::Range(min, max) => write!(f, "{min} to {max}"),
            Arity::AtLeast(min) => write!(f, "at least {min}"),
        }
    }
}

macro_rules! functions {
    ($($variant:ident => $name:literal, $arity:expr;)*) => {
        /// Functions callable by name from an expression.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Function {
            $($variant,)*
        }

        impl Function {
            pub const ALL: &'static [Function] = &[$(Function::$variant,)*];

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Function::$variant),)*
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Function::$variant => $name,)*
                }
            }

            pub fn arity(self) -> Arity {
                match self {
                    $(Function::$variant => $arity,)*
                }
            }
        }
    };
}

functions! {
    Clamp => "clamp", Arity::Exact(3);
    Lerp => "lerp", Arity::Exact(3);
    Remap => "remap", Arity::Exact(5);
    Cos => "cos", Arity::Exact(1);
    Sin => "sin", Arity::Exact(1);
    Tan => "tan", Arity::Exact(1);
    Acos => "acos", Arity::Exact(1);
    Asin => "asin", Arity::Exact(1);
    Atan => "atan", Arity::Exact(1);
    Noise => "noise", Arity::Exact(1);
    Dnoise => "dnoise", Arity::Exact(1);
    Norm => "norm", Arity::Exact(1);
    Dot => "dot", Arity::Exact(2);
    Cross => "cross", Arity::Exact(2);
    Len => "len", Arity::Exact(1);
    Distance => "distance", Arity::Exact(2);
    Angle => "angle", Arity::Exact(2);
    Vector => "vector", Arity::Range(2, 4);
    Euler => "euler", Arity::Range(1, 4);
    RotateOrder => "rotate_order", Arity::Exact(1);
    Quat => "quat", Arity::Range(1, 4);
    Transform => "transform", Arity::Range(1, 3);
    Matrix => "matrix", Arity::AtLeast(1);
    Slerp => "slerp", Arity::Exact(3);
    Int => "int", Arity::Exact(1);
    Bool => "bool", Arity::Exact(1);
    Switch => "switch", Arity::AtLeast(2);
    IsScalar => "is_scalar", Arity::Exact(1);
    IsVector => "is_vector", Arity::Exact(1);
    Xor => "xor", Arity::Exact(2);
    Pow => "pow", Arity::Exact(2);
    Modulo => "modulo", Arity::Exact(2);
    Inverse => "inverse", Arity::Exact(1);
    Exp => "exp", Arity::Exact(1);
    Sqrt => "sqrt", Arity::Exact(1);
    Abs => "abs", Arity::Exact(1);
    Sign => "sign", Arity::Exact(1);
    Min => "min", Arity::Exact(2);
    Max => "max", Arity::Exact(2);
    Value => "value", Arity::Exact(1);
}

/// An operation routed through the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Binary(BinaryOp),
    Negate,
    Not,
    /// Ternary; operands are `[first, second, if_true, if_false]`.
    Condition(Comparison),
    /// Operand is the object being accessed.
    Component(Component),
    List,
    Call(Function),
}

impl Primitive {
    /// Canonical signature for this operation applied to already-rendered operands.
    ///
    /// Equivalence is purely syntactic: operand order is preserved and no commutative
    /// normalisation happens.
    pub fn signature(&self, args: &[String]) -> String {
        let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or("?");
        match self {
            Primitive::Binary(op) => format!("{} {} {}", arg(0), op.symbol(), arg(1)),
            Primitive::Negate => format!("-({})", arg(0)),
            Primitive::Not => format!("!({})", arg(0)),
            Primitive::Condition(op) => {
                format!("{} {} {} ? {} : {}", arg(0), op, arg(1), arg(2), arg(3))
            }
            Primitive::Component(component) => format!("{}.{}", arg(0), component),
            Primitive::List => format!("{LIST_MARKER}({})", args.join(", ")),
            Primitive::Call(function) => format!("{}({})", function.name(), args.join(", ")),
        }
    }

    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Primitive::Binary(op) => op.symbol(),
            Primitive::Negate => "neg",
            Primitive::Not => "not",
            Primitive::Condition(_) => "condition",
            Primitive::Component(_) => "get_component",
            Primitive::List => LIST_MARKER,
            Primitive::Call(function) => function.name(),
        }
    }
}

fn take<const N: usize, T>(args: Vec<T>, label: &str) -> Result<[T; N]> {
    args.try_into().map_err(|rest: Vec<T>| CompileError::Arity {
        function: label.to_string(),
        expected: N.to_string(),
        found: rest.len(),
    })
}

/// Run `primitive` against the backend.
pub fn invoke<B: Derived + ?Sized>(
    backend: &mut B,
    primitive: &Primitive,
    args: Vec<BackendValue<B>>,
) -> Result<BackendValue<B>> {
    let label = primitive.label();
    let value = match primitive {
        Primitive::Binary(op) => {
            let [a, b] = take(args, label)?;
            match op {
                BinaryOp::Add => backend.add(a, b)?,
                BinaryOp::Subtract => backend.subtract(a, b)?,
                BinaryOp::Multiply => backend.multiply(a, b)?,
                BinaryOp::Divide => backend.divide(a, b)?,
                BinaryOp::Power => backend.pow(a, b)?,
                BinaryOp::Modulo => backend.modulo(a, b)?,
                BinaryOp::Or => backend.logical_or(a, b)?,
                BinaryOp::And => backend.logical_and(a, b)?,
            }
        }
        Primitive::Negate => {
            let [a] = take(args, label)?;
            backend.multiply(Value::Scalar(-1.0), a)?
        }
        Primitive::Not => {
            let [a] = take(args, label)?;
            backend.logical_not(a)?
        }
        Primitive::Condition(op) => {
            let [first, second, if_true, if_false] = take(args, label)?;
            backend.condition(first, *op, second, if_true, if_false)?
        }
        Primitive::Component(component) => {
            let [object] = take(args, label)?;
            backend.get_component(object, component)?
        }
        Primitive::List => Value::Sequence(Sequence::new(args)?),
        Primitive::Call(function) => call(backend, *function, args)?,
    };
    Ok(value)
}

fn call<B: Derived + ?Sized>(
    backend: &mut B,
    function: Function,
    args: Vec<BackendValue<B>>,
) -> Result<BackendValue<B>> {
    let label = function.name();
    let value = match function {
        Function::Clamp => {
            let [v, min, max] = take(args, label)?;
            backend.clamp(v, min, max)?
        }
        Function::Lerp => {
            let [a, b, t] = take(args, label)?;
            backend.lerp(a, b, t)?
        }
        Function::Remap => {
            let [v, old_min, old_max, new_min, new_max] = take(args, label)?;
            backend.remap(v, old_min, old_max, new_min, new_max)?
        }
        Function::Cos => backend.cos(unary(args, label)?)?,
        Function::Sin => backend.sin(unary(args, label)?)?,
        Function::Tan => backend.tan(unary(args, label)?)?,
        Function::Acos => backend.acos(unary(args, label)?)?,
        Function::Asin => backend.asin(unary(args, label)?)?,
        Function::Atan => backend.atan(unary(args, label)?)?,
        Function::Noise => backend.noise(unary(args, label)?)?,
        Function::Dnoise => backend.dnoise(unary(args, label)?)?,
        Function::Norm => backend.norm(unary(args, label)?)?,
        Function::Len => backend.len(unary(args, label)?)?,
        Function::Dot => {
            let [a, b] = take(args, label)?;
            backend.dot(a, b)?
        }
        Function::Cross => {
            let [a, b] = take(args, label)?;
            backend.cross(a, b)?
        }
        Function::Distance => {
            let [a, b] = take(args, label)?;
            backend.distance(a, b)?
        }
        Function::Angle => {
            let [a, b] = take(args, label)?;
            backend.angle(a, b)?
        }
        Function::Vector => backend.vector(args)?,
        Function::Euler => backend.euler(args)?,
        Function::RotateOrder => backend.rotate_order(unary(args, label)?)?,
        Function::Quat => backend.quat(args)?,
        Function::Transform => backend.transform(args)?,
        Function::Matrix => backend.matrix(args)?,
        Function::Slerp => {
            let [a, b, t] = take(args, label)?;
            backend.slerp(a, b, t)?
        }
        Function::Int => backend.int(unary(args, label)?)?,
        Function::Bool => backend.bool(unary(args, label)?)?,
        Function::Switch => {
            let mut args = args.into_iter();
            let selector = args.next().ok_or_else(|| CompileError::Arity {
                function: label.to_string(),
                expected: function.arity().to_string(),
                found: 0,
            })?;
            backend.switch(selector, args.collect())?
        }
        Function::IsScalar => {
            let v = unary(args, label)?;
            Value::Bool(backend.is_scalar(&v))
        }
        Function::IsVector => {
            let v = unary(args, label)?;
            Value::Bool(backend.is_vector(&v))
        }
        Function::Xor => {
            let [a, b] = take(args, label)?;
            backend.logical_xor(a, b)?
        }
        Function::Pow => {
            let [a, b] = take(args, label)?;
            backend.pow(a, b)?
        }
        Function::Modulo => {
            let [a, b] = take(args, label)?;
            backend.modulo(a, b)?
        }
        Function::Inverse => backend.inverse(unary(args, label)?)?,
        Function::Exp => backend.exp(unary(args, label)?)?,
        Function::Sqrt => backend.sqrt(unary(args, label)?)?,
        Function::Abs => backend.abs(unary(args, label)?)?,
        Function::Sign => backend.sign(unary(args, label)?)?,
        Function::Min => {
            let [a, b] = take(args, label)?;
            backend.min(a, b)?
        }
        Function::Max => {
            let [a, b] = take(args, label)?;
            backend.max(a, b)?
        }
        Function::Value => backend.value(unary(args, label)?)?,
    };
    Ok(value)
}

fn unary<T>(args: Vec<T>, label: &str) -> Result<T> {
    let [only] = take(args, label)?;
    Ok(only)
}
