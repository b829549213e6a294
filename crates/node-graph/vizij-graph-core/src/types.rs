use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use vizij_expr_core::{Comparison, RotateOrder};

pub type NodeId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    // Sources and sinks (for external binding in hosts)
    Constant,
    Input,
    Output,

    // Arithmetic, broadcasting scalars over vectors
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Logic
    And,
    Or,
    Xor,
    Not,

    // Conditional / ranges
    Condition,
    Clamp,
    Lerp,
    Remap,

    // Trigonometry
    Cos,
    Sin,
    Acos,
    Asin,
    Atan,

    // Generators
    Noise,
    Dnoise,

    // Vector utilities
    Component,
    Join,
    Normalize,
    Dot,
    Cross,
    Length,
    Distance,
    Angle,

    // Rotations and transforms
    Euler,
    RotateOrder,
    Quat,
    Slerp,
    Transform,
    Matrix,

    // Conversions
    Int,
    Bool,
    Switch,
}

impl NodeType {
    /// Output ports besides `out`.
    pub fn extra_ports(self) -> &'static [&'static str] {
        match self {
            NodeType::Euler => &["quat"],
            NodeType::Transform => &["translate", "rotate", "scale"],
            _ => &[],
        }
    }

    pub fn has_port(self, port: &str) -> bool {
        port == DEFAULT_PORT || self.extra_ports().contains(&port)
    }

    /// Kinds whose `out` port always carries a single number or boolean.
    pub fn yields_scalar(self) -> bool {
        matches!(
            self,
            NodeType::And
                | NodeType::Or
                | NodeType::Xor
                | NodeType::Not
                | NodeType::Cos
                | NodeType::Sin
                | NodeType::Acos
                | NodeType::Asin
                | NodeType::Atan
                | NodeType::Noise
                | NodeType::Dnoise
                | NodeType::Component
                | NodeType::Dot
                | NodeType::Length
                | NodeType::Distance
                | NodeType::Angle
                | NodeType::RotateOrder
                | NodeType::Int
                | NodeType::Bool
        )
    }

    /// Kinds whose `out` port always carries a vector.
    pub fn yields_vector(self) -> bool {
        matches!(
            self,
            NodeType::Join
                | NodeType::Normalize
                | NodeType::Cross
                | NodeType::Euler
                | NodeType::Quat
                | NodeType::Slerp
                | NodeType::Transform
                | NodeType::Matrix
        )
    }
}

pub const DEFAULT_PORT: &str = "out";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum GraphValue {
    Float(f64),
    Bool(bool),
    Vector(Vec<f64>),
}

impl Default for GraphValue {
    fn default() -> Self {
        GraphValue::Float(0.0)
    }
}

impl fmt::Display for GraphValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphValue::Float(v) => write!(f, "{v}"),
            GraphValue::Bool(b) => write!(f, "{b}"),
            GraphValue::Vector(items) => {
                f.write_str("[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NodeParams {
    /// Constant value, or the fallback for an unstaged input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<GraphValue>,
    /// Host-facing name of an input or output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    // For Condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
    // For Component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    // For Euler / Quat when no `order` input is wired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<RotateOrder>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConnection {
    pub node_id: NodeId,
    #[serde(default = "default_output_key")]
    pub output_key: String,
}

fn default_output_key() -> String {
    DEFAULT_PORT.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSpec {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default)]
    pub params: NodeParams,
    #[serde(default)]
    pub inputs: HashMap<String, InputConnection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GraphSpec {
    pub nodes: Vec<NodeSpec>,
}

impl GraphSpec {
    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut NodeSpec> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Host names of every output node, in declaration order.
    pub fn output_names(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeType::Output)
            .filter_map(|n| n.params.name.as_deref())
            .collect()
    }

    pub fn count(&self, kind: NodeType) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    /// Parse a spec previously written by [`GraphSpec::to_json`].
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Handle the builder hands to the compiler: one output port of one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plug {
    pub node: NodeId,
    pub port: String,
}

impl Plug {
    pub fn new(node: impl Into<NodeId>) -> Self {
        Plug {
            node: node.into(),
            port: DEFAULT_PORT.to_string(),
        }
    }

    pub fn port(node: impl Into<NodeId>, port: impl Into<String>) -> Self {
        Plug {
            node: node.into(),
            port: port.into(),
        }
    }

    pub fn connection(&self) -> InputConnection {
        InputConnection {
            node_id: self.node.clone(),
            output_key: self.port.clone(),
        }
    }
}

impl fmt::Display for Plug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.port == DEFAULT_PORT {
            f.write_str(&self.node)
        } else {
            write!(f, "{}.{}", self.node, self.port)
        }
    }
}
