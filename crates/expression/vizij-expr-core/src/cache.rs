//! Per-compile memo of backend results keyed by canonical signature.

use hashbrown::HashMap;

use crate::value::Value;

#[derive(Debug, Clone)]
pub struct OperationCache<H> {
    entries: HashMap<String, Value<H>>,
}

impl<H> Default for OperationCache<H> {
    fn default() -> Self {
        OperationCache {
            entries: HashMap::new(),
        }
    }
}

impl<H: Clone> OperationCache<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn lookup(&self, signature: &str) -> Option<Value<H>> {
        self.entries.get(signature).cloned()
    }

    pub fn insert(&mut self, signature: String, value: Value<H>) {
        self.entries.insert(signature, value);
    }

    /// Number of distinct signatures stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
