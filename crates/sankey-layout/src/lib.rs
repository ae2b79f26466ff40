//! Sankey diagram layout
//!
//! This crate computes the geometry of a Sankey diagram from a directed,
//! weighted flow graph. A layout pass runs these steps:
//!
//! 1. derive each node's value from its links ([`compute_node_values`]),
//! 2. put each node in a column right of all its predecessors,
//! 3. order the nodes of each column by value,
//! 4. size and place the nodes in a frame, one unit of value taking the same
//!    number of pixels everywhere,
//! 5. route each link as a cubic curve, packed with its siblings along the
//!    edges of the nodes it joins.
//!
//! Only directed acyclic graphs can be laid out, a cycle is reported as
//! [`LayoutError::CyclicGraph`].
//!
//! # Example
//!
//! ```
//! use sankey_layout::{FlowGraph, FlowNode, Frame, SankeyLayout};
//!
//! // Create a graph
//! let mut graph = FlowGraph::new();
//! graph.add_node(FlowNode::new("coal", "Coal")).unwrap();
//! graph.add_node(FlowNode::new("power", "Power plant")).unwrap();
//! graph.add_node(FlowNode::new("homes", "Homes")).unwrap();
//! graph.add_link("coal", "power", 10.0).unwrap();
//! graph.add_link("power", "homes", 4.0).unwrap();
//!
//! let engine = SankeyLayout::default();
//!
//! // Run a complete pass:
//! let result = engine.layout(&graph, Frame::new(0.0, 0.0, 600.0, 400.0)).unwrap();
//! assert_eq!(result.node(&"power".into()).unwrap().column, 1);
//!
//! // Or call each step for better control
//! let values = engine.compute_values(&graph);
//! let columns = engine.compute_columns(&graph).unwrap();
//! let layers = engine.compute_rows(values, &columns);
//! let placement = engine.compute_coordinates(&layers, &graph, Frame::new(0.0, 0.0, 600.0, 400.0));
//! assert_eq!(engine.route_links(&graph, placement), result);
//! ```
//!
//! Hosts that edit the graph interactively can use [`SankeyChart`], which
//! keeps the last result, tracks whether a new pass is needed and notifies
//! [`GraphObserver`]s of every change.

mod chart;
mod geometry;
mod graph;
mod links;
mod observer;
mod result;
mod style;
mod values;

pub mod layered;

pub use chart::SankeyChart;
pub use geometry::{Frame, Point};
pub use graph::{
    FlowGraph, FlowLink, FlowNode, GraphDescription, GraphError, LinkDescription, LinkId, NodeId,
};
pub use links::{AnchorKey, AnchorOrder};
pub use observer::{GraphEvent, GraphObserver};
pub use result::{LayoutResult, LinkGeometry, NodeGeometry, Placement};
pub use style::{Color, LineCap, LinkStyle};
pub use values::{compute_node_values, NodeValues};

// Re-export layered layout types
pub use layered::{LayoutError, Layers, SankeyLayout};
