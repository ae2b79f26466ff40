mod layers;
mod positions;
mod rows;

use crate::links::{route_links, AnchorOrder};
use crate::{
    compute_node_values, FlowGraph, FlowLink, Frame, LayoutResult, LinkStyle, NodeGeometry,
    NodeId, NodeValues, Placement,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use layers::assign_columns;
use positions::assign_coordinates;
use rows::assign_rows;

/// Errors that can occur during a layout pass
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// Layering kept moving nodes past its round limit
    #[error("graph contains a cycle through {unsettled:?}, layering did not settle after {rounds} rounds")]
    CyclicGraph {
        rounds: usize,
        unsettled: Vec<NodeId>,
    },
}

/// Configuration of the Sankey layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SankeyLayout {
    /// Width of every node
    pub node_width: f64,

    /// Vertical space between two nodes of a column
    pub node_padding: f64,

    /// How sibling links are ordered along a node's edge
    pub anchor_order: AnchorOrder,

    /// Stroke settings handed over to the renderer
    pub link_style: LinkStyle,
}

impl Default for SankeyLayout {
    fn default() -> Self {
        Self {
            node_width: 24.0,
            node_padding: 8.0,
            anchor_order: AnchorOrder::default(),
            link_style: LinkStyle::default(),
        }
    }
}

impl SankeyLayout {
    /// Create a new layout with the given node width and padding
    pub fn new(node_width: f64, node_padding: f64) -> Self {
        Self {
            node_width,
            node_padding,
            ..Default::default()
        }
    }
}

/// Columns of nodes, each ordered by row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layers {
    pub values: NodeValues,

    /// Nodes of each column, the index in the list is the row
    pub columns: BTreeMap<usize, Vec<NodeId>>,
}

impl Layers {
    pub fn value_of(&self, id: &NodeId) -> f64 {
        self.values.get(id).copied().unwrap_or(0.0)
    }

    /// Column and row of a node
    pub fn slot_of(&self, id: &NodeId) -> Option<(usize, usize)> {
        self.columns.iter().find_map(|(&column, nodes)| {
            nodes
                .iter()
                .position(|node| node == id)
                .map(|row| (column, row))
        })
    }
}

impl SankeyLayout {
    /// Derive the value of every node from its links
    pub fn compute_values(&self, graph: &FlowGraph) -> NodeValues {
        compute_node_values(graph)
    }

    /// Put every node in a column, right of all its predecessors
    ///
    /// # Errors
    /// Returns an error if the graph contains a cycle
    pub fn compute_columns(&self, graph: &FlowGraph) -> Result<BTreeMap<NodeId, usize>, LayoutError> {
        assign_columns(graph)
    }

    /// Order the nodes of each column by value
    pub fn compute_rows(&self, values: NodeValues, columns: &BTreeMap<NodeId, usize>) -> Layers {
        let columns = assign_rows(&values, columns);
        Layers { values, columns }
    }

    /// Place every node in the frame
    pub fn compute_coordinates(&self, layers: &Layers, graph: &FlowGraph, frame: Frame) -> Placement {
        self.compute_coordinates_keeping(layers, graph, frame, &BTreeMap::new())
    }

    /// Place the nodes absent from `keep` in the frame
    ///
    /// Nodes present in `keep` retain their position from there. Sizes of all
    /// nodes are recomputed as the ratio may have changed.
    pub fn compute_coordinates_keeping(
        &self,
        layers: &Layers,
        graph: &FlowGraph,
        frame: Frame,
        keep: &BTreeMap<NodeId, NodeGeometry>,
    ) -> Placement {
        assign_coordinates(
            layers,
            graph,
            frame,
            self.node_width,
            self.node_padding,
            keep,
        )
    }

    /// Route the links of the graph between the placed nodes
    pub fn route_links(&self, graph: &FlowGraph, placement: Placement) -> LayoutResult {
        let links: Vec<FlowLink> = graph.links().cloned().collect();
        self.reroute_links(&links, placement)
    }

    /// Route the given links between the placed nodes
    pub fn reroute_links(&self, links: &[FlowLink], placement: Placement) -> LayoutResult {
        let links = route_links(links, &placement.nodes, placement.ratio, self.anchor_order);
        LayoutResult {
            ratio: placement.ratio,
            nodes: placement.nodes,
            links,
        }
    }

    /// Run a full layout pass
    ///
    /// # Errors
    /// Returns an error if the graph contains a cycle, nothing is computed
    /// then.
    pub fn layout(&self, graph: &FlowGraph, frame: Frame) -> Result<LayoutResult, LayoutError> {
        self.layout_keeping(graph, frame, &BTreeMap::new())
    }

    /// Run a full layout pass, keeping the position of the nodes in `keep`
    pub fn layout_keeping(
        &self,
        graph: &FlowGraph,
        frame: Frame,
        keep: &BTreeMap<NodeId, NodeGeometry>,
    ) -> Result<LayoutResult, LayoutError> {
        debug!(
            "Layout of {} node(s) and {} link(s) in {frame:?}",
            graph.node_count(),
            graph.link_count()
        );

        let values = self.compute_values(graph);
        let columns = self.compute_columns(graph)?;
        let layers = self.compute_rows(values, &columns);
        let placement = self.compute_coordinates_keeping(&layers, graph, frame, keep);
        debug!(
            "Placed {} column(s), ratio {}",
            layers.columns.len(),
            placement.ratio
        );

        Ok(self.route_links(graph, placement))
    }
}
