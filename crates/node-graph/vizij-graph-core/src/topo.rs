use std::collections::VecDeque;

use hashbrown::HashMap;

use crate::error::GraphError;
use crate::types::*;

/// Kahn ordering over input connections. Ties resolve in declaration order, so the same
/// spec always evaluates in the same sequence.
pub fn topo_order(nodes: &[NodeSpec]) -> Result<Vec<NodeId>, GraphError> {
    let mut indeg: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();

    for n in nodes {
        indeg.entry(n.id.as_str()).or_insert(0);
    }
    for n in nodes {
        for conn in n.inputs.values() {
            if !indeg.contains_key(conn.node_id.as_str()) {
                return Err(GraphError::UnknownNode {
                    node: n.id.clone(),
                    upstream: conn.node_id.clone(),
                });
            }
            adj.entry(conn.node_id.as_str()).or_default().push(n.id.as_str());
            *indeg.entry(n.id.as_str()).or_default() += 1;
        }
    }

    let mut q: VecDeque<&str> = nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| indeg.get(id) == Some(&0))
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(u) = q.pop_front() {
        order.push(u.to_string());
        if let Some(vs) = adj.get(u) {
            for v in vs {
                if let Some(d) = indeg.get_mut(v) {
                    *d -= 1;
                    if *d == 0 {
                        q.push_back(*v);
                    }
                }
            }
        }
    }

    if order.len() != indeg.len() {
        return Err(GraphError::Cycle);
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: NodeType, inputs: &[(&str, &str)]) -> NodeSpec {
        NodeSpec {
            id: id.into(),
            kind,
            params: NodeParams::default(),
            inputs: inputs
                .iter()
                .map(|(key, src)| (key.to_string(), Plug::new(*src).connection()))
                .collect(),
        }
    }

    #[test]
    fn upstream_nodes_come_first() {
        let nodes = vec![
            node("sum", NodeType::Add, &[("lhs", "a"), ("rhs", "b")]),
            node("a", NodeType::Constant, &[]),
            node("b", NodeType::Constant, &[]),
            node("out", NodeType::Output, &[("in", "sum")]),
        ];
        let order = topo_order(&nodes).unwrap();
        assert_eq!(order, vec!["a", "b", "sum", "out"]);
    }

    #[test]
    fn shared_operand_counts_each_edge() {
        let nodes = vec![
            node("a", NodeType::Constant, &[]),
            node("sq", NodeType::Multiply, &[("lhs", "a"), ("rhs", "a")]),
        ];
        assert_eq!(topo_order(&nodes).unwrap(), vec!["a", "sq"]);
    }

    #[test]
    fn cycles_are_rejected() {
        let nodes = vec![
            node("a", NodeType::Add, &[("lhs", "b")]),
            node("b", NodeType::Add, &[("lhs", "a")]),
        ];
        assert_eq!(topo_order(&nodes), Err(GraphError::Cycle));
    }

    #[test]
    fn dangling_connections_are_rejected() {
        let nodes = vec![node("a", NodeType::Not, &[("in", "ghost")])];
        assert!(matches!(
            topo_order(&nodes),
            Err(GraphError::UnknownNode { ref upstream, .. }) if upstream == "ghost"
        ));
    }
}
