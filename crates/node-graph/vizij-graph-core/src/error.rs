use thiserror::Error;

use crate::types::NodeId;

/// Failures while ordering or evaluating a graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("cycle detected in graph")]
    Cycle,
    #[error("node '{node}' reads from unknown node '{upstream}'")]
    UnknownNode { node: NodeId, upstream: NodeId },
    #[error("node '{node}' has no output '{port}'")]
    MissingOutput { node: NodeId, port: String },
    #[error("node '{node}': {reason}")]
    Evaluation { node: NodeId, reason: String },
}

impl GraphError {
    pub fn evaluation(node: &str, reason: impl Into<String>) -> Self {
        GraphError::Evaluation {
            node: node.to_string(),
            reason: reason.into(),
        }
    }
}
