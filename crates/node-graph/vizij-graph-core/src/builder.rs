//! [`GraphBuilder`]: an expression-compiler backend that emits one rig node per primitive.
//!
//! Handles are [`Plug`]s (a node id plus an output port). Literal operands are turned into
//! `Constant` nodes on demand, and equal literals share a single node. Host-facing plugs
//! come from [`GraphBuilder::input`] and [`GraphBuilder::output`]; assignments wire an
//! expression into an output node.

use anyhow::{anyhow, bail};
use hashbrown::HashMap;
use log::{debug, warn};
use vizij_expr_core::{
    Backend, BackendResult, Comparison, Component, Derived, RotateOrder, Sequence, Value,
};

use crate::eval::variadic_key;
use crate::types::{GraphSpec, GraphValue, NodeId, NodeParams, NodeSpec, NodeType, Plug, DEFAULT_PORT};

type PlugValue = Value<Plug>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Scalar,
    Vector,
    Unknown,
}

#[derive(Debug, Default)]
pub struct GraphBuilder {
    spec: GraphSpec,
    kinds: HashMap<NodeId, NodeType>,
    constants: HashMap<String, Plug>,
    inputs: HashMap<String, Plug>,
    outputs: HashMap<String, Plug>,
    next_id: usize,
    result: Option<PlugValue>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plug for the host input `name`, created on first use.
    pub fn input(&mut self, name: &str) -> PlugValue {
        self.input_with_default(name, None)
    }

    /// Like [`GraphBuilder::input`], with the value used when nothing is staged.
    pub fn input_with_default(&mut self, name: &str, default: Option<GraphValue>) -> PlugValue {
        if let Some(plug) = self.inputs.get(name) {
            return Value::Handle(plug.clone());
        }
        let params = NodeParams {
            name: Some(name.to_string()),
            value: default,
            ..Default::default()
        };
        let plug = self.add_node(NodeType::Input, params, Vec::new());
        self.inputs.insert(name.to_string(), plug.clone());
        Value::Handle(plug)
    }

    /// Plug for the host output `name`, created on first use. Only output plugs can be
    /// assigned to.
    pub fn output(&mut self, name: &str) -> PlugValue {
        if let Some(plug) = self.outputs.get(name) {
            return Value::Handle(plug.clone());
        }
        let params = NodeParams {
            name: Some(name.to_string()),
            ..Default::default()
        };
        let plug = self.add_node(NodeType::Output, params, Vec::new());
        self.outputs.insert(name.to_string(), plug.clone());
        Value::Handle(plug)
    }

    /// Input and output plugs keyed by name, ready to pass to the compiler as bindings.
    pub fn bindings(&mut self, inputs: &[&str], outputs: &[&str]) -> Vec<(String, PlugValue)> {
        let mut bound = Vec::with_capacity(inputs.len() + outputs.len());
        for name in inputs {
            bound.push((name.to_string(), self.input(name)));
        }
        for name in outputs {
            bound.push((name.to_string(), self.output(name)));
        }
        bound
    }

    pub fn spec(&self) -> &GraphSpec {
        &self.spec
    }

    pub fn into_spec(self) -> GraphSpec {
        self.spec
    }

    /// Value of the most recent non-assignment compile, after optimisation.
    pub fn result(&self) -> Option<&PlugValue> {
        self.result.as_ref()
    }

    pub fn node_count(&self) -> usize {
        self.spec.nodes.len()
    }

    fn add_node(&mut self, kind: NodeType, params: NodeParams, inputs: Vec<(String, Plug)>) -> Plug {
        self.next_id += 1;
        let id = format!("{}_{}", format!("{kind:?}").to_lowercase(), self.next_id);
        debug!("node {id}: {kind:?}");
        self.kinds.insert(id.clone(), kind);
        self.spec.nodes.push(NodeSpec {
            id: id.clone(),
            kind,
            params,
            inputs: inputs
                .into_iter()
                .map(|(key, plug)| (key, plug.connection()))
                .collect(),
        });
        Plug::new(id)
    }

    fn constant(&mut self, value: GraphValue) -> Plug {
        let key = value.to_string();
        if let Some(plug) = self.constants.get(&key) {
            return plug.clone();
        }
        let params = NodeParams {
            value: Some(value),
            ..Default::default()
        };
        let plug = self.add_node(NodeType::Constant, params, Vec::new());
        self.constants.insert(key, plug.clone());
        plug
    }

    /// Plug carrying `value`, creating constant or join nodes for literals.
    fn materialize(&mut self, value: PlugValue) -> BackendResult<Plug> {
        Ok(match value {
            Value::Handle(plug) => plug,
            Value::Scalar(v) => self.constant(GraphValue::Float(v)),
            Value::Bool(b) => self.constant(GraphValue::Bool(b)),
            Value::RotateOrder(order) => self.constant(GraphValue::Float(order.index() as f64)),
            Value::Sequence(seq) => match seq.scalars() {
                Some(components) => self.constant(GraphValue::Vector(components)),
                None => {
                    let parts = seq
                        .into_vec()
                        .into_iter()
                        .enumerate()
                        .map(|(i, item)| Ok((variadic_key(i), self.materialize(item)?)))
                        .collect::<BackendResult<Vec<_>>>()?;
                    self.add_node(NodeType::Join, NodeParams::default(), parts)
                }
            },
        })
    }

    fn emit(
        &mut self,
        kind: NodeType,
        params: NodeParams,
        operands: Vec<(String, PlugValue)>,
    ) -> BackendResult<PlugValue> {
        let mut inputs = Vec::with_capacity(operands.len());
        for (key, value) in operands {
            inputs.push((key, self.materialize(value)?));
        }
        Ok(Value::Handle(self.add_node(kind, params, inputs)))
    }

    fn unary(&mut self, kind: NodeType, a: PlugValue) -> BackendResult<PlugValue> {
        self.emit(kind, NodeParams::default(), vec![("in".into(), a)])
    }

    fn binary(&mut self, kind: NodeType, lhs: PlugValue, rhs: PlugValue) -> BackendResult<PlugValue> {
        self.emit(
            kind,
            NodeParams::default(),
            vec![("lhs".into(), lhs), ("rhs".into(), rhs)],
        )
    }

    fn pair(&mut self, kind: NodeType, a: PlugValue, b: PlugValue) -> BackendResult<PlugValue> {
        self.emit(
            kind,
            NodeParams::default(),
            vec![("a".into(), a), ("b".into(), b)],
        )
    }

    fn kind_of(&self, plug: &Plug) -> Option<NodeType> {
        self.kinds.get(&plug.node).copied()
    }

    fn shape_of(&self, plug: &Plug) -> Shape {
        if plug.port != DEFAULT_PORT {
            return Shape::Vector;
        }
        match self.kind_of(plug) {
            Some(kind) if kind.yields_scalar() => Shape::Scalar,
            Some(kind) if kind.yields_vector() => Shape::Vector,
            Some(NodeType::Constant | NodeType::Input) => {
                let value = self
                    .spec
                    .node(&plug.node)
                    .and_then(|node| node.params.value.as_ref());
                match value {
                    Some(GraphValue::Vector(_)) => Shape::Vector,
                    Some(_) => Shape::Scalar,
                    None => Shape::Unknown,
                }
            }
            _ => Shape::Unknown,
        }
    }

    /// Peel a trailing rotate order (literal or `rotate_order` node) off `args`.
    fn split_order(&self, mut args: Vec<PlugValue>) -> (Vec<PlugValue>, Option<PlugValue>) {
        let is_order = match args.last() {
            Some(Value::RotateOrder(_)) => true,
            Some(Value::Handle(plug)) => self.kind_of(plug) == Some(NodeType::RotateOrder),
            _ => false,
        };
        let order = if is_order { args.pop() } else { None };
        (args, order)
    }

    fn rotation_node(
        &mut self,
        kind: NodeType,
        mut operands: Vec<(String, PlugValue)>,
        order: Option<PlugValue>,
    ) -> BackendResult<PlugValue> {
        let mut params = NodeParams::default();
        match order {
            Some(Value::RotateOrder(order)) => params.order = Some(order),
            Some(other) => operands.push(("order".into(), other)),
            None => {}
        }
        self.emit(kind, params, operands)
    }
}

fn variadic(values: Vec<PlugValue>) -> Vec<(String, PlugValue)> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (variadic_key(i), v))
        .collect()
}

impl Backend for GraphBuilder {
    type Handle = Plug;

    fn equal(&mut self, source: PlugValue, destination: PlugValue) -> BackendResult<()> {
        let dest = match destination {
            Value::Handle(plug) => plug,
            other => bail!("cannot assign to literal {other}"),
        };
        if self.kind_of(&dest) != Some(NodeType::Output) {
            bail!("cannot drive {dest}: only output plugs accept assignments");
        }
        let src = self.materialize(source)?;
        let node = self
            .spec
            .node_mut(&dest.node)
            .ok_or_else(|| anyhow!("unknown node {dest}"))?;
        if node.inputs.insert("in".into(), src.connection()).is_some() {
            warn!("output {dest} was already driven; rewiring to {src}");
        }
        Ok(())
    }

    fn add(&mut self, a: PlugValue, b: PlugValue) -> BackendResult<PlugValue> {
        self.binary(NodeType::Add, a, b)
    }

    fn subtract(&mut self, a: PlugValue, b: PlugValue) -> BackendResult<PlugValue> {
        self.binary(NodeType::Subtract, a, b)
    }

    fn multiply(&mut self, a: PlugValue, b: PlugValue) -> BackendResult<PlugValue> {
        self.binary(NodeType::Multiply, a, b)
    }

    fn divide(&mut self, a: PlugValue, b: PlugValue) -> BackendResult<PlugValue> {
        self.binary(NodeType::Divide, a, b)
    }

    fn pow(&mut self, a: PlugValue, b: PlugValue) -> BackendResult<PlugValue> {
        self.binary(NodeType::Power, a, b)
    }

    fn logical_or(&mut self, a: PlugValue, b: PlugValue) -> BackendResult<PlugValue> {
        self.binary(NodeType::Or, a, b)
    }

    fn logical_and(&mut self, a: PlugValue, b: PlugValue) -> BackendResult<PlugValue> {
        self.binary(NodeType::And, a, b)
    }

    fn logical_xor(&mut self, a: PlugValue, b: PlugValue) -> BackendResult<PlugValue> {
        self.binary(NodeType::Xor, a, b)
    }

    fn logical_not(&mut self, a: PlugValue) -> BackendResult<PlugValue> {
        self.unary(NodeType::Not, a)
    }

    fn clamp(&mut self, value: PlugValue, min: PlugValue, max: PlugValue) -> BackendResult<PlugValue> {
        self.emit(
            NodeType::Clamp,
            NodeParams::default(),
            vec![("in".into(), value), ("min".into(), min), ("max".into(), max)],
        )
    }

    fn condition(
        &mut self,
        first: PlugValue,
        op: Comparison,
        second: PlugValue,
        if_true: PlugValue,
        if_false: PlugValue,
    ) -> BackendResult<PlugValue> {
        let params = NodeParams {
            comparison: Some(op),
            ..Default::default()
        };
        self.emit(
            NodeType::Condition,
            params,
            vec![
                ("lhs".into(), first),
                ("rhs".into(), second),
                ("then".into(), if_true),
                ("else".into(), if_false),
            ],
        )
    }

    fn lerp(&mut self, a: PlugValue, b: PlugValue, t: PlugValue) -> BackendResult<PlugValue> {
        self.emit(
            NodeType::Lerp,
            NodeParams::default(),
            vec![("a".into(), a), ("b".into(), b), ("t".into(), t)],
        )
    }

    fn remap(
        &mut self,
        value: PlugValue,
        old_min: PlugValue,
        old_max: PlugValue,
        new_min: PlugValue,
        new_max: PlugValue,
    ) -> BackendResult<PlugValue> {
        self.emit(
            NodeType::Remap,
            NodeParams::default(),
            vec![
                ("in".into(), value),
                ("in_min".into(), old_min),
                ("in_max".into(), old_max),
                ("out_min".into(), new_min),
                ("out_max".into(), new_max),
            ],
        )
    }

    fn cos(&mut self, a: PlugValue) -> BackendResult<PlugValue> {
        self.unary(NodeType::Cos, a)
    }

    fn sin(&mut self, a: PlugValue) -> BackendResult<PlugValue> {
        self.unary(NodeType::Sin, a)
    }

    fn acos(&mut self, a: PlugValue) -> BackendResult<PlugValue> {
        self.unary(NodeType::Acos, a)
    }

    fn asin(&mut self, a: PlugValue) -> BackendResult<PlugValue> {
        self.unary(NodeType::Asin, a)
    }

    fn atan(&mut self, a: PlugValue) -> BackendResult<PlugValue> {
        self.unary(NodeType::Atan, a)
    }

    fn noise(&mut self, a: PlugValue) -> BackendResult<PlugValue> {
        self.unary(NodeType::Noise, a)
    }

    fn dnoise(&mut self, a: PlugValue) -> BackendResult<PlugValue> {
        self.unary(NodeType::Dnoise, a)
    }

    fn get_component(&mut self, object: PlugValue, component: &Component) -> BackendResult<PlugValue> {
        match (object, component) {
            (Value::Sequence(seq), Component::Axis(index)) => seq
                .get(*index)
                .cloned()
                .ok_or_else(|| anyhow!("component {component} is out of range for a {}-vector", seq.len())),
            (Value::Handle(plug), Component::Axis(index)) => {
                let params = NodeParams {
                    index: Some(*index),
                    ..Default::default()
                };
                self.emit(
                    NodeType::Component,
                    params,
                    vec![("in".into(), Value::Handle(plug))],
                )
            }
            (Value::Handle(plug), Component::Named(port)) => {
                let kind = self
                    .kind_of(&plug)
                    .ok_or_else(|| anyhow!("unknown node {plug}"))?;
                if plug.port == DEFAULT_PORT && kind.has_port(port) {
                    Ok(Value::Handle(Plug::port(plug.node, port.as_str())))
                } else {
                    bail!("{plug} has no output '{port}'")
                }
            }
            (other, component) => bail!("{other} has no component {component}"),
        }
    }

    fn is_scalar(&self, value: &PlugValue) -> bool {
        match value {
            Value::Scalar(_) | Value::Bool(_) => true,
            Value::Handle(plug) => self.shape_of(plug) == Shape::Scalar,
            _ => false,
        }
    }

    fn is_vector(&self, value: &PlugValue) -> bool {
        match value {
            Value::Sequence(_) => true,
            Value::Handle(plug) => self.shape_of(plug) == Shape::Vector,
            _ => false,
        }
    }

    fn norm(&mut self, v: PlugValue) -> BackendResult<PlugValue> {
        self.unary(NodeType::Normalize, v)
    }

    fn dot(&mut self, a: PlugValue, b: PlugValue) -> BackendResult<PlugValue> {
        self.pair(NodeType::Dot, a, b)
    }

    fn cross(&mut self, a: PlugValue, b: PlugValue) -> BackendResult<PlugValue> {
        self.pair(NodeType::Cross, a, b)
    }

    fn len(&mut self, v: PlugValue) -> BackendResult<PlugValue> {
        self.unary(NodeType::Length, v)
    }

    fn distance(&mut self, a: PlugValue, b: PlugValue) -> BackendResult<PlugValue> {
        self.pair(NodeType::Distance, a, b)
    }

    fn angle(&mut self, a: PlugValue, b: PlugValue) -> BackendResult<PlugValue> {
        self.pair(NodeType::Angle, a, b)
    }

    fn vector(&mut self, components: Vec<PlugValue>) -> BackendResult<PlugValue> {
        let seq = Sequence::new(components)?;
        Ok(Value::Handle(self.materialize(Value::Sequence(seq))?))
    }

    fn euler(&mut self, args: Vec<PlugValue>) -> BackendResult<PlugValue> {
        let (angles, order) = self.split_order(args);
        let operands = match angles.len() {
            1 => angles.into_iter().map(|v| ("in".to_string(), v)).collect(),
            3 => variadic(angles),
            n => bail!("euler expects a vector or three angles, got {n} values"),
        };
        self.rotation_node(NodeType::Euler, operands, order)
    }

    fn rotate_order(&mut self, value: PlugValue) -> BackendResult<PlugValue> {
        match value {
            Value::RotateOrder(_) => Ok(value),
            Value::Scalar(x) if x >= 0.0 && x.fract() == 0.0 => RotateOrder::from_index(x as usize)
                .map(Value::RotateOrder)
                .ok_or_else(|| anyhow!("no rotate order at index {x}")),
            Value::Handle(_) => self.unary(NodeType::RotateOrder, value),
            other => bail!("{other} is not a rotate order"),
        }
    }

    fn quat(&mut self, args: Vec<PlugValue>) -> BackendResult<PlugValue> {
        let (values, order) = self.split_order(args);
        if let ([Value::Handle(plug)], None) = (values.as_slice(), &order) {
            if plug.port == DEFAULT_PORT && self.kind_of(plug) == Some(NodeType::Euler) {
                return Ok(Value::Handle(Plug::port(plug.node.clone(), "quat")));
            }
        }
        if values.is_empty() {
            bail!("quat needs at least one value besides the rotate order");
        }
        self.rotation_node(NodeType::Quat, variadic(values), order)
    }

    fn transform(&mut self, args: Vec<PlugValue>) -> BackendResult<PlugValue> {
        let operands = ["translate", "rotate", "scale"]
            .into_iter()
            .zip(args)
            .map(|(key, v)| (key.to_string(), v))
            .collect();
        self.emit(NodeType::Transform, NodeParams::default(), operands)
    }

    fn matrix(&mut self, args: Vec<PlugValue>) -> BackendResult<PlugValue> {
        self.emit(NodeType::Matrix, NodeParams::default(), variadic(args))
    }

    fn slerp(&mut self, a: PlugValue, b: PlugValue, t: PlugValue) -> BackendResult<PlugValue> {
        self.emit(
            NodeType::Slerp,
            NodeParams::default(),
            vec![("a".into(), a), ("b".into(), b), ("t".into(), t)],
        )
    }

    fn int(&mut self, a: PlugValue) -> BackendResult<PlugValue> {
        self.unary(NodeType::Int, a)
    }

    fn bool(&mut self, a: PlugValue) -> BackendResult<PlugValue> {
        self.unary(NodeType::Bool, a)
    }

    fn switch(&mut self, selector: PlugValue, options: Vec<PlugValue>) -> BackendResult<PlugValue> {
        let mut operands = variadic(options);
        operands.push(("selector".into(), selector));
        self.emit(NodeType::Switch, NodeParams::default(), operands)
    }

    fn optimize(&mut self, value: PlugValue) -> BackendResult<PlugValue> {
        debug!("result: {value}");
        self.result = Some(value.clone());
        Ok(value)
    }
}

impl Derived for GraphBuilder {}
