//! Shared JSON fixtures for the expression compiler and its graph backend.
//!
//! Every fixture is listed in `fixtures/manifest.json` at the workspace root and
//! addressed by key, so tests never hard-code file paths.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    expressions: BTreeMap<String, String>,
    rigs: BTreeMap<String, String>,
}

fn load_json<T: DeserializeOwned>(
    map: &BTreeMap<String, String>,
    kind: &str,
    name: &str,
) -> Result<T> {
    let rel = map
        .get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))?;
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../../fixtures")
        .join(rel);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

/// Expression suites: named cases with bindings and the expected value, report or error.
pub mod expressions {
    use super::*;

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        load_json(&MANIFEST.expressions, "expression suite", name)
    }
}

/// Rig driver sets: expressions compiled into one node graph, staged inputs and the
/// expected outputs after evaluation.
pub mod rigs {
    use super::*;

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        load_json(&MANIFEST.rigs, "rig", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn every_manifest_entry_parses() {
        for key in MANIFEST.expressions.keys() {
            expressions::load::<Value>(key).expect("listed suite loads");
        }
        for key in MANIFEST.rigs.keys() {
            rigs::load::<Value>(key).expect("listed rig loads");
        }
    }

    #[test]
    fn unknown_keys_are_reported() {
        let err = expressions::load::<Value>("does-not-exist").unwrap_err();
        assert!(err.to_string().contains("does-not-exist"));
    }
}
