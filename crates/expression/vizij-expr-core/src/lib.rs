//! Rig expression compiler.
//!
//! Parses algebraic driver expressions such as `dst = clamp(a.x * 2, 0, 1)` into a
//! post-order token stream and evaluates that stream against a [`Backend`], asking it to
//! create one node per distinct operation. Repeated subexpressions are emitted once.
//!
//! ```ignore
//! let mut compiler = Compiler::new(my_backend);
//! let out = compiler.emit("a + b * 2", [("a", a_plug), ("b", b_plug)])?;
//! let report = compiler.validate("a + c", [("a", a_plug), ("b", b_plug)])?;
//! ```

pub mod backend;
pub mod bindings;
pub mod cache;
pub mod compiler;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod eval;
pub mod fold;
pub mod grammar;
pub mod parser;
pub mod token;
pub mod value;

pub use backend::{Backend, BackendResult, BackendValue, Derived};
pub use bindings::{Bindings, DiagnosticReport};
pub use compiler::{CompileOutput, Compiler};
pub use config::CompilerConfig;
pub use dispatch::{Arity, Function, Primitive};
pub use error::{CompileError, ParseError, ParseErrorKind, Result, Span};
pub use eval::CompileMode;
pub use fold::fold_unary;
pub use parser::{parse, ParsedExpression};
pub use token::{BinaryOp, Comparison, Component, Constant, RotateOrder, Token, TokenStream};
pub use value::{Sequence, Value, ValueKey};
