//! Mutable runtime state that persists across graph evaluations.

use hashbrown::HashMap;

use crate::types::{GraphValue, NodeId};

/// Data staged by the host for consumption by [`NodeType::Input`](crate::types::NodeType::Input).
#[derive(Debug, Clone, PartialEq)]
pub struct StagedInput {
    pub value: GraphValue,
    pub epoch: u64,
}

/// Runtime data shared by all node evaluations.
#[derive(Debug, Default)]
pub struct GraphRuntime {
    /// Per-node port values from the most recent evaluation.
    pub outputs: HashMap<NodeId, HashMap<String, GraphValue>>,
    /// Values reaching each named output node.
    pub results: HashMap<String, GraphValue>,
    pub staged_inputs: HashMap<String, StagedInput>,
    pub input_epoch: u64,
}

impl GraphRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the staging epoch. Values staged for `epoch + 1` become visible for the
    /// upcoming evaluation; older entries are dropped so stale data cannot leak through.
    pub fn advance_epoch(&mut self) {
        self.input_epoch = self.input_epoch.saturating_add(1);
        let current = self.input_epoch;
        self.staged_inputs.retain(|_, staged| staged.epoch == current);
    }

    /// Stage a named input value for the next evaluation.
    pub fn set_input(&mut self, name: impl Into<String>, value: GraphValue) -> Option<StagedInput> {
        let staged = StagedInput {
            value,
            epoch: self.input_epoch.saturating_add(1),
        };
        self.staged_inputs.insert(name.into(), staged)
    }

    /// Fetch a staged input for the current evaluation epoch, if present.
    pub fn get_input(&self, name: &str) -> Option<&StagedInput> {
        self.staged_inputs
            .get(name)
            .filter(|staged| staged.epoch == self.input_epoch)
    }

    /// Value of one node port from the last evaluation.
    pub fn value(&self, node: &str, port: &str) -> Option<&GraphValue> {
        self.outputs.get(node).and_then(|ports| ports.get(port))
    }

    /// Value reaching the output node named `name` in the last evaluation.
    pub fn result(&self, name: &str) -> Option<&GraphValue> {
        self.results.get(name)
    }
}
