//! Post-order tokens emitted by the parser and consumed by the evaluator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary operators that map onto a backend primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Modulo,
    Or,
    And,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
            BinaryOp::Modulo => "%",
            BinaryOp::Or => "|",
            BinaryOp::And => "&",
        }
    }
}

/// Comparison operators. They only ever feed a `condition` primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
            Comparison::Greater => ">",
            Comparison::GreaterEqual => ">=",
            Comparison::Less => "<",
            Comparison::LessEqual => "<=",
        }
    }

    /// Apply the comparison to two scalars.
    pub fn test(self, a: f64, b: f64) -> bool {
        match self {
            Comparison::Equal => a == b,
            Comparison::NotEqual => a != b,
            Comparison::Greater => a > b,
            Comparison::GreaterEqual => a >= b,
            Comparison::Less => a < b,
            Comparison::LessEqual => a <= b,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Axis application order for Euler rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RotateOrder {
    Xyz,
    Yzx,
    Zxy,
    Xzy,
    Yxz,
    Zyx,
}

impl RotateOrder {
    pub const ALL: [RotateOrder; 6] = [
        RotateOrder::Xyz,
        RotateOrder::Yzx,
        RotateOrder::Zxy,
        RotateOrder::Xzy,
        RotateOrder::Yxz,
        RotateOrder::Zyx,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            RotateOrder::Xyz => "XYZ",
            RotateOrder::Yzx => "YZX",
            RotateOrder::Zxy => "ZXY",
            RotateOrder::Xzy => "XZY",
            RotateOrder::Yxz => "YXZ",
            RotateOrder::Zyx => "ZYX",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|order| order.keyword() == word)
    }

    /// Position in [`RotateOrder::ALL`], the integer encoding hosts use.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Axis indices (0 = x, 1 = y, 2 = z) in application order.
    pub fn axes(self) -> [usize; 3] {
        match self {
            RotateOrder::Xyz => [0, 1, 2],
            RotateOrder::Yzx => [1, 2, 0],
            RotateOrder::Zxy => [2, 0, 1],
            RotateOrder::Xzy => [0, 2, 1],
            RotateOrder::Yxz => [1, 0, 2],
            RotateOrder::Zyx => [2, 1, 0],
        }
    }
}

impl fmt::Display for RotateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Keyword constants resolved without touching the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    True,
    False,
    E,
    Pi,
}

impl Constant {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "TRUE" | "ON" => Some(Constant::True),
            "FALSE" | "OFF" => Some(Constant::False),
            "E" => Some(Constant::E),
            "PI" => Some(Constant::Pi),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Constant::True => "TRUE",
            Constant::False => "FALSE",
            Constant::E => "E",
            Constant::Pi => "PI",
        }
    }
}

/// Target of a `.component` postfix access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    /// `x`, `y`, `z`, `w` map to 0..=3.
    Axis(usize),
    Named(String),
}

impl Component {
    pub fn parse(name: &str) -> Self {
        match name {
            "x" => Component::Axis(0),
            "y" => Component::Axis(1),
            "z" => Component::Axis(2),
            "w" => Component::Axis(3),
            other => Component::Named(other.to_string()),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Axis(index) => f.write_str(["x", "y", "z", "w"].get(*index).unwrap_or(&"?")),
            Component::Named(name) => f.write_str(name),
        }
    }
}

/// Synthetic function name carried by list literals.
pub const LIST_MARKER: &str = "!list";

/// One entry of the post-order stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Token {
    /// Literal text; the fold pass may rewrite it to its negated form.
    Number(String),
    Identifier(String),
    Binary(BinaryOp),
    /// Prefix `-`.
    Negate,
    /// Prefix `!`.
    Not,
    Comparison(Comparison),
    Assign,
    Call { name: String, arity: usize },
    List { arity: usize },
    Component(Component),
    Constant(Constant),
    RotateOrder(RotateOrder),
    /// `?`, closes a ternary.
    Ternary,
    /// `:`, never emitted by the parser; the evaluator forwards past it.
    Else,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(text) => f.write_str(text),
            Token::Identifier(name) => f.write_str(name),
            Token::Binary(op) => f.write_str(op.symbol()),
            Token::Negate => f.write_str("neg"),
            Token::Not => f.write_str("!"),
            Token::Comparison(op) => f.write_str(op.symbol()),
            Token::Assign => f.write_str("="),
            Token::Call { name, arity } => write!(f, "({name}, {arity})"),
            Token::List { arity } => write!(f, "({LIST_MARKER}, {arity})"),
            Token::Component(component) => write!(f, "(., {component})"),
            Token::Constant(constant) => f.write_str(constant.keyword()),
            Token::RotateOrder(order) => f.write_str(order.keyword()),
            Token::Ternary => f.write_str("?"),
            Token::Else => f.write_str(":"),
        }
    }
}

/// Ordered token buffer consumed from the tail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn pop(&mut self) -> Option<Token> {
        self.tokens.pop()
    }

    /// Append `other` after the current tail.
    pub fn append(&mut self, mut other: TokenStream) {
        self.tokens.append(&mut other.tokens);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_vec(self) -> Vec<Token> {
        self.tokens
    }
}

impl From<Vec<Token>> for TokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        TokenStream { tokens }
    }
}

impl FromIterator<Token> for TokenStream {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        TokenStream {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for TokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}
