use super::LayoutError;
use crate::{FlowGraph, NodeId};
use petgraph::stable_graph::NodeIndex;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{trace, warn};

/// Assign a column to every node by iterative frontier relaxation
///
/// All nodes start in column 0 and in the frontier. Each round, a frontier
/// node moves one column to the right when one of its predecessors is still
/// in the frontier and not already to its left. Rounds compare against the
/// columns as they stood when the round started, so the outcome does not
/// depend on iteration order: every node ends up one column right of its
/// furthest predecessor.
///
/// A DAG settles in at most `node_count` rounds. A graph that is still moving
/// after `node_count + 1` rounds has a cycle.
pub(crate) fn assign_columns(graph: &FlowGraph) -> Result<BTreeMap<NodeId, usize>, LayoutError> {
    let graph = graph.inner();
    let max_rounds = graph.node_count() + 1;

    let mut columns: HashMap<NodeIndex, usize> =
        graph.node_indices().map(|node| (node, 0)).collect();
    let mut frontier: HashSet<NodeIndex> = graph.node_indices().collect();
    let mut rounds = 0;

    while !frontier.is_empty() {
        if rounds == max_rounds {
            let mut unsettled: Vec<NodeId> = frontier
                .iter()
                .map(|&node| graph[node].id.clone())
                .collect();
            unsettled.sort();
            warn!("Layering did not settle after {rounds} rounds: {unsettled:?}");
            return Err(LayoutError::CyclicGraph { rounds, unsettled });
        }
        rounds += 1;

        let next: HashSet<NodeIndex> = frontier
            .iter()
            .copied()
            .filter(|&node| {
                graph
                    .neighbors_directed(node, Direction::Incoming)
                    .any(|pred| frontier.contains(&pred) && columns[&pred] <= columns[&node])
            })
            .collect();

        for node in &next {
            if let Some(column) = columns.get_mut(node) {
                *column += 1;
            }
        }

        trace!("Layering round {rounds}: {} node(s) moved right", next.len());
        frontier = next;
    }

    Ok(columns
        .into_iter()
        .map(|(node, column)| (graph[node].id.clone(), column))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlowNode;
    use test_log::test;

    fn graph_of(nodes: &[&str], links: &[(&str, &str)]) -> FlowGraph {
        let mut graph = FlowGraph::new();
        for &id in nodes {
            graph.add_node(FlowNode::new(id, id)).unwrap();
        }
        for &(source, target) in links {
            graph.add_link(source, target, 1.0).unwrap();
        }
        graph
    }

    #[test]
    fn canonical_columns() {
        let graph = graph_of(
            &["n1", "n2", "n3", "n4"],
            &[("n1", "n2"), ("n1", "n3"), ("n3", "n4"), ("n1", "n4")],
        );
        let columns = assign_columns(&graph).unwrap();
        assert_eq!(columns[&NodeId::from("n1")], 0);
        assert_eq!(columns[&NodeId::from("n2")], 1);
        assert_eq!(columns[&NodeId::from("n3")], 1);
        assert_eq!(columns[&NodeId::from("n4")], 2);
    }

    #[test]
    fn node_follows_its_longest_chain() {
        // Insert in reverse so that index order disagrees with flow order
        let graph = graph_of(
            &["e", "d", "c", "b", "a"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "e"), ("d", "e")],
        );
        let columns = assign_columns(&graph).unwrap();
        assert_eq!(columns[&NodeId::from("a")], 0);
        assert_eq!(columns[&NodeId::from("d")], 3);
        assert_eq!(columns[&NodeId::from("e")], 4);

        for link in graph.links() {
            assert!(columns[&link.source] < columns[&link.target]);
        }
    }

    #[test]
    fn disconnected_nodes_stay_in_first_column() {
        let graph = graph_of(&["x", "y"], &[]);
        let columns = assign_columns(&graph).unwrap();
        assert!(columns.values().all(|&column| column == 0));
    }

    #[test]
    fn cycle_is_detected() {
        let graph = graph_of(
            &["src", "a", "b", "c"],
            &[("src", "a"), ("a", "b"), ("b", "c"), ("c", "a")],
        );
        let Err(LayoutError::CyclicGraph { rounds, unsettled }) = assign_columns(&graph) else {
            panic!("cycle went undetected");
        };
        assert_eq!(rounds, 5);
        assert_eq!(
            unsettled,
            vec![NodeId::from("a"), NodeId::from("b"), NodeId::from("c")]
        );
    }

    #[test]
    fn empty_graph_has_no_columns() {
        assert!(assign_columns(&FlowGraph::new()).unwrap().is_empty());
    }
}
