//! Evaluation pipeline for emitted rig graphs.
//!
//! Walks a [`GraphSpec`](crate::types::GraphSpec) in topological order and computes every
//! node's port values. The submodules keep domain concerns isolated:
//!
//! - [`graph_runtime`] tracks per-node values and staged host inputs between evaluations.
//! - [`numeric`] and [`variadic`] provide shared math and input-ordering helpers.
//! - [`rotation`] wraps nalgebra for Euler, quaternion and matrix work.
//! - [`noise`] is the deterministic value-noise generator.
//! - [`eval_node`] houses the dispatch logic for individual [`NodeType`](crate::types::NodeType)s.

use hashbrown::HashMap;

use crate::error::GraphError;
use crate::types::{GraphSpec, NodeSpec};

pub mod eval_node;
mod graph_runtime;
pub mod noise;
mod numeric;
pub mod rotation;
mod variadic;

pub use eval_node::eval_node;
pub use graph_runtime::{GraphRuntime, StagedInput};
pub use variadic::variadic_key;

#[cfg(test)]
mod tests;

/// Evaluate every node in `spec`, updating `rt` in-place.
///
/// Values staged since the previous call become visible, earlier per-node values are
/// cleared, and nodes are visited in topological order. Any node error halts evaluation.
pub fn evaluate_all(rt: &mut GraphRuntime, spec: &GraphSpec) -> Result<(), GraphError> {
    rt.advance_epoch();
    rt.outputs.clear();
    rt.results.clear();

    let by_id: HashMap<&str, &NodeSpec> = spec.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let order = crate::topo::topo_order(&spec.nodes)?;
    log::trace!("evaluating {} node(s)", order.len());
    for id in order {
        if let Some(node) = by_id.get(id.as_str()) {
            eval_node::eval_node(rt, node)?;
        }
    }
    Ok(())
}

impl GraphRuntime {
    /// Method form of [`evaluate_all`].
    pub fn evaluate_all(&mut self, spec: &GraphSpec) -> Result<(), GraphError> {
        evaluate_all(self, spec)
    }
}
