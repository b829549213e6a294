//! Helpers for dealing with variadic node inputs (`in_0`, `in_1`, ...).

use std::cmp::Ordering;

use hashbrown::HashMap;

use crate::types::GraphValue;

pub const VARIADIC_PREFIX: &str = "in";

/// Key of the `index`th variadic input.
pub fn variadic_key(index: usize) -> String {
    format!("{VARIADIC_PREFIX}_{index}")
}

/// Split a variadic input key into its prefix and optional positional suffix.
pub fn parse_variadic_key(key: &str) -> (&str, Option<usize>) {
    if let Some((prefix, tail)) = key.rsplit_once('_') {
        if let Ok(idx) = tail.parse::<usize>() {
            return (prefix, Some(idx));
        }
    }
    (key, None)
}

/// Sort variadic keys lexicographically by prefix then index.
pub fn compare_variadic_keys(a: &str, b: &str) -> Ordering {
    let (prefix_a, idx_a) = parse_variadic_key(a);
    let (prefix_b, idx_b) = parse_variadic_key(b);

    match prefix_a.cmp(prefix_b) {
        Ordering::Equal => match (idx_a, idx_b) {
            (Some(ia), Some(ib)) => ia.cmp(&ib),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        },
        other => other,
    }
}

/// Values wired into `in_N` inputs, ordered by `N`.
pub fn collect_variadic(inputs: &HashMap<String, GraphValue>) -> Vec<GraphValue> {
    let mut keys: Vec<&String> = inputs
        .keys()
        .filter(|key| matches!(parse_variadic_key(key), (VARIADIC_PREFIX, Some(_))))
        .collect();
    keys.sort_by(|a, b| compare_variadic_keys(a, b));
    keys.into_iter()
        .filter_map(|key| inputs.get(key).cloned())
        .collect()
}
