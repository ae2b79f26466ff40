use crate::{Color, LinkId, NodeId, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Geometry of a node after a layout pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGeometry {
    pub id: NodeId,
    pub name: String,
    pub value: f64,
    pub column: usize,
    pub row: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: Option<Color>,
}

impl NodeGeometry {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Geometry of a link after a layout pass
///
/// The link is drawn as a cubic curve from `start` to `end` through the two
/// control points, stroked with `stroke_width`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkGeometry {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    pub value: f64,
    pub start: Point,
    pub end: Point,
    pub control1: Point,
    pub control2: Point,
    pub stroke_width: f64,
    /// Stroke color, the source node's color
    pub color: Option<Color>,
}

/// Nodes placed in a frame, links not routed yet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placement {
    /// Pixels per unit of flow value, shared by all nodes and links
    pub ratio: f64,
    pub nodes: BTreeMap<NodeId, NodeGeometry>,
}

/// Everything a layout pass produces
///
/// A result is built from scratch by every pass and never patched, except by
/// [`SankeyChart::move_node`](crate::SankeyChart::move_node).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutResult {
    pub ratio: f64,
    pub nodes: BTreeMap<NodeId, NodeGeometry>,
    pub links: BTreeMap<LinkId, LinkGeometry>,
}

impl LayoutResult {
    pub fn node(&self, id: &NodeId) -> Option<&NodeGeometry> {
        self.nodes.get(id)
    }

    pub fn link(&self, id: LinkId) -> Option<&LinkGeometry> {
        self.links.get(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
