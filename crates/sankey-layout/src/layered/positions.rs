use super::Layers;
use crate::{FlowGraph, Frame, NodeGeometry, NodeId, Placement, Point};
use std::collections::BTreeMap;

/// Assign pixel geometry to every node of the layers
///
/// Nodes found in `keep` retain the position they have there, every other
/// node is placed from its column and row. Sizes are always recomputed.
pub(crate) fn assign_coordinates(
    layers: &Layers,
    graph: &FlowGraph,
    frame: Frame,
    node_width: f64,
    node_padding: f64,
    keep: &BTreeMap<NodeId, NodeGeometry>,
) -> Placement {
    let ratio = value_to_height_ratio(layers, frame.height, node_padding);
    let pitch = column_pitch(layers.columns.len(), frame.width, node_width);

    let mut nodes = BTreeMap::new();
    for (&column, ids) in &layers.columns {
        let x = frame.left + column as f64 * pitch;
        let mut y = frame.top;

        for (row, id) in ids.iter().enumerate() {
            let value = layers.value_of(id);
            let height = value * ratio;
            let position = keep
                .get(id)
                .map_or(Point::new(x, y), NodeGeometry::position);
            let node = graph.node(id);

            nodes.insert(
                id.clone(),
                NodeGeometry {
                    id: id.clone(),
                    name: node.map(|node| node.name.clone()).unwrap_or_default(),
                    value,
                    column,
                    row,
                    x: position.x,
                    y: position.y,
                    width: node_width,
                    height,
                    color: node.and_then(|node| node.color),
                },
            );

            y += height + node_padding;
        }
    }

    Placement { ratio, nodes }
}

/// Pixels of height per unit of value
///
/// Every column, with the padding between its nodes, has to be displayed
/// completely in the frame: the ratio is the largest one satisfying all
/// columns. Without padding this is `height / total value of the biggest
/// column`.
pub(crate) fn value_to_height_ratio(layers: &Layers, height: f64, node_padding: f64) -> f64 {
    if !(height > 0.0) {
        return 0.0;
    }

    layers
        .columns
        .values()
        .filter_map(|nodes| {
            let total: f64 = nodes.iter().map(|id| layers.value_of(id)).sum();
            let available = height - nodes.len().saturating_sub(1) as f64 * node_padding;
            (total > 0.0).then(|| (available / total).max(0.0))
        })
        .min_by(f64::total_cmp)
        .unwrap_or(0.0)
}

/// Horizontal distance between the left edges of two adjacent columns
///
/// `(width - k * node_width) / (k - 1)` for `k` columns. A frame too narrow to
/// hold the nodes side by side gives 0 rather than moving columns leftwards.
pub(crate) fn column_pitch(column_count: usize, width: f64, node_width: f64) -> f64 {
    if column_count <= 1 || !(width > 0.0) {
        return 0.0;
    }

    let k = column_count as f64;
    ((width - k * node_width) / (k - 1.0)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FlowNode, NodeValues};
    use test_log::test;

    fn layers(columns: &[&[(&str, f64)]]) -> (Layers, FlowGraph) {
        let mut graph = FlowGraph::new();
        let mut values = NodeValues::new();
        let mut layers = BTreeMap::new();
        for (column, nodes) in columns.iter().enumerate() {
            let ids = nodes
                .iter()
                .map(|&(id, value)| {
                    graph.add_node(FlowNode::new(id, id.to_uppercase())).unwrap();
                    values.insert(NodeId::from(id), value);
                    NodeId::from(id)
                })
                .collect();
            layers.insert(column, ids);
        }
        (
            Layers {
                values,
                columns: layers,
            },
            graph,
        )
    }

    #[test]
    fn nodes_stack_from_the_top_of_their_column() {
        let (layers, graph) = layers(&[&[("a", 10.0)], &[("b", 4.0), ("c", 6.0)]]);
        let frame = Frame::new(10.0, 20.0, 200.0, 108.0);
        let placement = assign_coordinates(&layers, &graph, frame, 24.0, 8.0, &BTreeMap::new());

        // Column 1 holds two nodes: (108 - 8) / 10
        assert_eq!(placement.ratio, 10.0);

        let a = &placement.nodes[&NodeId::from("a")];
        assert_eq!((a.x, a.y, a.width, a.height), (20.0, 10.0, 24.0, 100.0));
        assert_eq!(a.name, "A");

        let b = &placement.nodes[&NodeId::from("b")];
        let c = &placement.nodes[&NodeId::from("c")];
        // Left edges are (200 - 2 * 24) / 1 apart
        assert_eq!((b.x, b.y, b.height, b.row), (172.0, 10.0, 40.0, 0));
        assert_eq!((c.x, c.y, c.height, c.row), (172.0, 58.0, 60.0, 1));
        assert!(c.x + c.width <= frame.left + frame.width);
    }

    #[test]
    fn single_column_sits_on_the_left_edge() {
        let (layers, graph) = layers(&[&[("a", 1.0), ("b", 1.0)]]);
        let frame = Frame::new(0.0, 5.0, 300.0, 100.0);
        let placement = assign_coordinates(&layers, &graph, frame, 24.0, 0.0, &BTreeMap::new());
        assert!(placement.nodes.values().all(|node| node.x == 5.0));
        assert_eq!(placement.ratio, 50.0);
    }

    #[test]
    fn degenerate_frames_do_not_divide_by_zero() {
        let (layers, graph) = layers(&[&[("a", 3.0)], &[("b", 3.0)]]);
        let placement = assign_coordinates(
            &layers,
            &graph,
            Frame::new(0.0, 0.0, 0.0, 0.0),
            24.0,
            8.0,
            &BTreeMap::new(),
        );
        assert_eq!(placement.ratio, 0.0);
        for node in placement.nodes.values() {
            assert_eq!((node.x, node.height), (0.0, 0.0));
            assert!(node.y.is_finite());
        }
    }

    #[test]
    fn zero_values_give_zero_ratio() {
        let (layers, _) = layers(&[&[("a", 0.0)], &[("b", 0.0)]]);
        assert_eq!(value_to_height_ratio(&layers, 100.0, 8.0), 0.0);
    }

    #[test]
    fn column_pitch_spreads_left_edges() {
        assert_eq!(column_pitch(3, 500.0, 24.0), 214.0);
        assert_eq!(column_pitch(2, 100.0, 20.0), 60.0);
        assert_eq!(column_pitch(3, 50.0, 24.0), 0.0);
        assert_eq!(column_pitch(1, 500.0, 24.0), 0.0);
    }

    #[test]
    fn kept_positions_are_not_reassigned() {
        let (layers, graph) = layers(&[&[("a", 2.0), ("b", 2.0)]]);
        let frame = Frame::new(0.0, 0.0, 100.0, 100.0);
        let first = assign_coordinates(&layers, &graph, frame, 24.0, 0.0, &BTreeMap::new());

        let mut keep = first.nodes.clone();
        keep.remove(&NodeId::from("b"));
        if let Some(a) = keep.get_mut(&NodeId::from("a")) {
            a.x = 42.0;
            a.y = 17.0;
        }

        let second = assign_coordinates(&layers, &graph, frame, 24.0, 0.0, &keep);
        assert_eq!(second.nodes[&NodeId::from("a")].position(), Point::new(42.0, 17.0));
        assert_eq!(second.nodes[&NodeId::from("b")], first.nodes[&NodeId::from("b")]);
    }
}
