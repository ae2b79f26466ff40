use crate::{FlowGraph, NodeId};
use std::collections::BTreeMap;

/// Value of every node, keyed by node id
pub type NodeValues = BTreeMap<NodeId, f64>;

/// Compute the value of each node
///
/// A node's value is the maximum between the total value of its incoming
/// links and the total value of its outgoing links, so that its rendered
/// height can host both sides.
pub fn compute_node_values(graph: &FlowGraph) -> NodeValues {
    graph
        .nodes()
        .map(|node| {
            let value = graph
                .sum_of_links_from(&node.id)
                .max(graph.sum_of_links_targeting(&node.id));
            (node.id.clone(), value)
        })
        .collect()
}
