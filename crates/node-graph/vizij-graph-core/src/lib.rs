//! Rig node graphs driven by compiled expressions.
//!
//! [`GraphBuilder`] is a backend for the `vizij-expr-core` compiler: every primitive the
//! compiler emits becomes a node in a [`GraphSpec`]. [`evaluate_all`] then runs the graph
//! against host inputs staged on a [`GraphRuntime`].
//!
//! ```ignore
//! let mut compiler = Compiler::new(GraphBuilder::new());
//! let bindings = compiler.backend_mut().bindings(&["blink"], &["lid"]);
//! compiler.emit("lid = clamp(1 - blink, 0, 1)", bindings)?;
//! let spec = compiler.into_backend().into_spec();
//!
//! let mut rt = GraphRuntime::new();
//! rt.set_input("blink", GraphValue::Float(0.25));
//! rt.evaluate_all(&spec)?;
//! assert_eq!(rt.result("lid"), Some(&GraphValue::Float(0.75)));
//! ```

pub mod builder;
pub mod error;
pub mod eval;
pub mod topo;
pub mod types;

pub use builder::GraphBuilder;
pub use error::GraphError;
pub use eval::{eval_node, evaluate_all, GraphRuntime, StagedInput};
pub use topo::topo_order;
pub use types::*;
