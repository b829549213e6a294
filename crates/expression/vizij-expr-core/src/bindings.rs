//! Caller-supplied identifier bindings and usage tracking.

use std::fmt;

use hashbrown::HashMap;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::value::{Value, ValueKey};

/// Identifier usage collected by a validate-mode compile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Identifiers that resolved to a binding, in first-reference order.
    pub connected: IndexSet<String>,
    /// Identifiers referenced without a binding, in first-reference order.
    pub invalid: IndexSet<String>,
    /// Bindings never referenced, in binding order.
    pub unused: Vec<String>,
}

impl DiagnosticReport {
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty() && self.unused.is_empty()
    }
}

/// Per-compile binding table with a value-to-name reverse map.
#[derive(Debug, Clone)]
pub struct Bindings<H> {
    values: IndexMap<String, Value<H>>,
    reverse: HashMap<ValueKey, String>,
    connected: IndexSet<String>,
    invalid: IndexSet<String>,
}

impl<H> Default for Bindings<H> {
    fn default() -> Self {
        Bindings {
            values: IndexMap::new(),
            reverse: HashMap::new(),
            connected: IndexSet::new(),
            invalid: IndexSet::new(),
        }
    }
}

impl<H: Clone + fmt::Display> Bindings<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.reverse.clear();
        self.connected.clear();
        self.invalid.clear();
    }

    /// Register bindings in order. When two names carry equal values the later name
    /// wins the reverse lookup. Rebinding a name replaces its earlier value, and the
    /// earlier value no longer describes as that name.
    pub fn register<I, S>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (S, Value<H>)>,
        S: Into<String>,
    {
        for (name, value) in bindings {
            let name = name.into();
            let key = value.key();
            if let Some(previous) = self.values.insert(name.clone(), value) {
                self.forget(previous.key(), &name);
            }
            self.reverse.insert(key, name);
        }
    }

    /// Drop `name` as the description of `stale`, falling back to the last other name
    /// still bound to an equal value.
    fn forget(&mut self, stale: ValueKey, name: &str) {
        if self.reverse.get(&stale).map(String::as_str) != Some(name) {
            return;
        }
        let fallback = self
            .values
            .iter()
            .rev()
            .find(|(other, value)| other.as_str() != name && value.key() == stale)
            .map(|(other, _)| other.clone());
        match fallback {
            Some(other) => {
                self.reverse.insert(stale, other);
            }
            None => {
                self.reverse.remove(&stale);
            }
        }
    }

    /// Look up `name`, recording it as connected when found.
    pub fn resolve(&mut self, name: &str) -> Option<Value<H>> {
        let value = self.values.get(name).cloned()?;
        self.connected.insert(name.to_string());
        Some(value)
    }

    pub fn mark_invalid(&mut self, name: &str) {
        self.invalid.insert(name.to_string());
    }

    /// Binding name for `value` if one carries it, else the value's own rendering.
    pub fn describe(&self, value: &Value<H>) -> String {
        let key = value.key();
        match self.reverse.get(&key) {
            Some(name) => name.clone(),
            None => key.as_str().to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Snapshot usage; `unused` is every binding neither connected nor invalid.
    pub fn report(&self) -> DiagnosticReport {
        let unused = self
            .values
            .keys()
            .filter(|name| !self.connected.contains(*name) && !self.invalid.contains(*name))
            .cloned()
            .collect();
        DiagnosticReport {
            connected: self.connected.clone(),
            invalid: self.invalid.clone(),
            unused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_binding_wins_reverse_lookup() {
        let mut bindings: Bindings<String> = Bindings::new();
        bindings.register([("a", Value::Scalar(1.0)), ("b", Value::Scalar(1.0))]);
        assert_eq!(bindings.describe(&Value::Scalar(1.0)), "b");
        assert_eq!(bindings.describe(&Value::Scalar(2.0)), "2");
    }

    #[test]
    fn rebinding_a_name_releases_its_old_value() {
        let mut bindings: Bindings<String> = Bindings::new();
        bindings.register([("a", Value::Scalar(1.0)), ("a", Value::Scalar(2.0))]);
        assert_eq!(bindings.describe(&Value::Scalar(1.0)), "1");
        assert_eq!(bindings.describe(&Value::Scalar(2.0)), "a");
        assert_eq!(bindings.len(), 1);

        bindings.clear();
        bindings.register([
            ("b", Value::Scalar(1.0)),
            ("a", Value::Scalar(1.0)),
            ("a", Value::Scalar(3.0)),
        ]);
        assert_eq!(bindings.describe(&Value::Scalar(1.0)), "b");
    }

    #[test]
    fn report_tracks_usage() {
        let mut bindings: Bindings<String> = Bindings::new();
        bindings.register([
            ("a", Value::Scalar(1.0)),
            ("b", Value::Handle("node.out".to_string())),
            ("c", Value::Bool(true)),
        ]);
        assert!(bindings.resolve("b").is_some());
        assert!(bindings.resolve("missing").is_none());
        bindings.mark_invalid("missing");

        let report = bindings.report();
        assert_eq!(report.connected.iter().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(report.invalid.iter().collect::<Vec<_>>(), vec!["missing"]);
        assert_eq!(report.unused, vec!["a".to_string(), "c".to_string()]);
        assert!(!report.is_clean());
    }

    #[test]
    fn handles_describe_by_name() {
        let mut bindings: Bindings<String> = Bindings::new();
        bindings.register([("arm", Value::Handle("rig:arm.rx".to_string()))]);
        assert_eq!(
            bindings.describe(&Value::Handle("rig:arm.rx".to_string())),
            "arm"
        );
        bindings.clear();
        assert!(bindings.is_empty());
        assert_eq!(
            bindings.describe(&Value::Handle("rig:arm.rx".to_string())),
            "rig:arm.rx"
        );
    }
}
