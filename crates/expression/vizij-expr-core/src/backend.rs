//! Capabilities a target runtime must provide for the compiler to emit into it.
//!
//! [`Backend`] lists the primitives with no default; a concrete backend implements all of
//! them. [`Derived`] layers composite operations on top, expressed only through the
//! primitives. A backend opts in with an empty `impl Derived for MyBackend {}` and may
//! override any derived method with a cheaper native node.

use std::f64::consts::E;
use std::fmt;

use crate::token::{Comparison, Component};
use crate::value::Value;

/// Result type returned by backend primitives. Errors pass through `compile` untouched.
pub type BackendResult<T> = anyhow::Result<T>;

/// Shorthand for a value carrying `B`'s handle type.
pub type BackendValue<B> = Value<<B as Backend>::Handle>;

/// Primitive operations every backend supplies.
pub trait Backend {
    /// Opaque reference to a node or attribute in the target graph. Its `Display` form
    /// is used when building cache signatures.
    type Handle: Clone + fmt::Debug + fmt::Display;

    /// Drive `destination` from `source`. Called once per assignment, emit mode only.
    fn equal(
        &mut self,
        source: Value<Self::Handle>,
        destination: Value<Self::Handle>,
    ) -> BackendResult<()>;

    fn add(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn subtract(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn multiply(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn divide(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn pow(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;

    fn logical_or(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn logical_and(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn logical_xor(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn logical_not(&mut self, a: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;

    fn clamp(
        &mut self,
        value: Value<Self::Handle>,
        min: Value<Self::Handle>,
        max: Value<Self::Handle>,
    ) -> BackendResult<Value<Self::Handle>>;

    /// `first op second ? if_true : if_false`
    fn condition(
        &mut self,
        first: Value<Self::Handle>,
        op: Comparison,
        second: Value<Self::Handle>,
        if_true: Value<Self::Handle>,
        if_false: Value<Self::Handle>,
    ) -> BackendResult<Value<Self::Handle>>;

    fn lerp(
        &mut self,
        a: Value<Self::Handle>,
        b: Value<Self::Handle>,
        t: Value<Self::Handle>,
    ) -> BackendResult<Value<Self::Handle>>;

    fn remap(
        &mut self,
        value: Value<Self::Handle>,
        old_min: Value<Self::Handle>,
        old_max: Value<Self::Handle>,
        new_min: Value<Self::Handle>,
        new_max: Value<Self::Handle>,
    ) -> BackendResult<Value<Self::Handle>>;

    fn cos(&mut self, a: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn sin(&mut self, a: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn acos(&mut self, a: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn asin(&mut self, a: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn atan(&mut self, a: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;

    fn noise(&mut self, a: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    /// Derivative of [`Backend::noise`].
    fn dnoise(&mut self, a: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;

    fn get_component(
        &mut self,
        object: Value<Self::Handle>,
        component: &Component,
    ) -> BackendResult<Value<Self::Handle>>;

    fn is_scalar(&self, value: &Value<Self::Handle>) -> bool;
    fn is_vector(&self, value: &Value<Self::Handle>) -> bool;

    fn norm(&mut self, v: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn dot(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn cross(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn len(&mut self, v: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn distance(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn angle(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;

    /// Build a vector from 2-4 components.
    fn vector(&mut self, components: Vec<Value<Self::Handle>>) -> BackendResult<Value<Self::Handle>>;
    /// Euler rotation from a vector or three angles, optionally followed by a rotate order.
    fn euler(&mut self, args: Vec<Value<Self::Handle>>) -> BackendResult<Value<Self::Handle>>;
    fn rotate_order(&mut self, value: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    /// Quaternion from an Euler rotation, an axis and angle, or four components.
    fn quat(&mut self, args: Vec<Value<Self::Handle>>) -> BackendResult<Value<Self::Handle>>;
    /// Transform from translate, rotate and scale.
    fn transform(&mut self, args: Vec<Value<Self::Handle>>) -> BackendResult<Value<Self::Handle>>;
    fn matrix(&mut self, args: Vec<Value<Self::Handle>>) -> BackendResult<Value<Self::Handle>>;
    fn slerp(
        &mut self,
        a: Value<Self::Handle>,
        b: Value<Self::Handle>,
        t: Value<Self::Handle>,
    ) -> BackendResult<Value<Self::Handle>>;

    fn int(&mut self, a: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    fn bool(&mut self, a: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>>;
    /// Pick `options[selector]`.
    fn switch(
        &mut self,
        selector: Value<Self::Handle>,
        options: Vec<Value<Self::Handle>>,
    ) -> BackendResult<Value<Self::Handle>>;

    /// Final post-processing of an emitted result.
    fn optimize(&mut self, value: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>> {
        Ok(value)
    }
}

/// Composite operations built from [`Backend`] primitives.
pub trait Derived: Backend {
    /// `a - b * int(a / b)`
    fn modulo(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>> {
        let ratio = self.divide(a.clone(), b.clone())?;
        let whole = self.int(ratio)?;
        let scaled = self.multiply(b, whole)?;
        self.subtract(a, scaled)
    }

    fn inverse(&mut self, v: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>> {
        self.pow(v, Value::Scalar(-1.0))
    }

    fn exp(&mut self, x: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>> {
        self.pow(Value::Scalar(E), x)
    }

    fn sqrt(&mut self, x: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>> {
        self.pow(x, Value::Scalar(0.5))
    }

    fn abs(&mut self, x: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>> {
        let negated = self.multiply(Value::Scalar(-1.0), x.clone())?;
        self.condition(
            x.clone(),
            Comparison::GreaterEqual,
            Value::Scalar(0.0),
            x,
            negated,
        )
    }

    fn sign(&mut self, x: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>> {
        let nonzero = self.condition(
            x.clone(),
            Comparison::GreaterEqual,
            Value::Scalar(0.0),
            Value::Scalar(1.0),
            Value::Scalar(-1.0),
        )?;
        self.condition(
            x,
            Comparison::Equal,
            Value::Scalar(0.0),
            Value::Scalar(0.0),
            nonzero,
        )
    }

    fn min(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>> {
        self.condition(a.clone(), Comparison::Less, b.clone(), a, b)
    }

    fn max(&mut self, a: Value<Self::Handle>, b: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>> {
        self.condition(a.clone(), Comparison::Greater, b.clone(), a, b)
    }

    fn tan(&mut self, a: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>> {
        let sin = self.sin(a.clone())?;
        let cos = self.cos(a)?;
        self.divide(sin, cos)
    }

    /// Identity; routing a literal through it forces it through the operation cache.
    fn value(&mut self, v: Value<Self::Handle>) -> BackendResult<Value<Self::Handle>> {
        Ok(v)
    }
}
