use crate::{NodeId, NodeValues};
use std::collections::BTreeMap;

/// Group nodes by column and order each column by ascending value
///
/// Nodes with equal values are ordered by id. The index of a node in its
/// column's list is its row.
pub(crate) fn assign_rows(
    values: &NodeValues,
    columns: &BTreeMap<NodeId, usize>,
) -> BTreeMap<usize, Vec<NodeId>> {
    let mut layers: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
    for (node, &column) in columns {
        layers.entry(column).or_default().push(node.clone());
    }

    let value_of = |node: &NodeId| values.get(node).copied().unwrap_or(0.0);
    for nodes in layers.values_mut() {
        nodes.sort_by(|a, b| value_of(a).total_cmp(&value_of(b)).then_with(|| a.cmp(b)));
    }

    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn ids(ids: &[&str]) -> Vec<NodeId> {
        ids.iter().map(|&id| NodeId::from(id)).collect()
    }

    #[test]
    fn rows_follow_ascending_value() {
        let values: NodeValues = [("n1", 13.0), ("n2", 2.0), ("n3", 5.0), ("n4", 7.0)]
            .into_iter()
            .map(|(id, value)| (NodeId::from(id), value))
            .collect();
        let columns: BTreeMap<NodeId, usize> = [("n1", 0), ("n3", 1), ("n2", 1), ("n4", 2)]
            .into_iter()
            .map(|(id, column)| (NodeId::from(id), column))
            .collect();

        let layers = assign_rows(&values, &columns);
        assert_eq!(layers[&0], ids(&["n1"]));
        assert_eq!(layers[&1], ids(&["n2", "n3"]));
        assert_eq!(layers[&2], ids(&["n4"]));
    }

    #[test]
    fn equal_values_are_ordered_by_id() {
        let values: NodeValues = ["b", "c", "a"]
            .into_iter()
            .map(|id| (NodeId::from(id), 1.0))
            .collect();
        let columns: BTreeMap<NodeId, usize> =
            values.keys().map(|id| (id.clone(), 0)).collect();

        assert_eq!(assign_rows(&values, &columns)[&0], ids(&["a", "b", "c"]));
    }
}
