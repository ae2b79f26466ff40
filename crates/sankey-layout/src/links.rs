use crate::{FlowLink, LinkGeometry, LinkId, NodeGeometry, NodeId, Point};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Coordinate of the neighbor node that sibling links are sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorKey {
    /// Top to bottom by the neighbor's y coordinate
    NeighborY,
    /// Left to right by the neighbor's x coordinate
    NeighborX,
}

impl AnchorKey {
    fn of(self, node: &NodeGeometry) -> f64 {
        match self {
            AnchorKey::NeighborY => node.y,
            AnchorKey::NeighborX => node.x,
        }
    }
}

/// Order in which sibling links are packed along a node's edges
///
/// Outgoing links are ordered by their target node, incoming links by their
/// source node, each edge with its own key. Ties are broken by the neighbor's
/// id, then by link id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorOrder {
    pub outgoing: AnchorKey,
    pub incoming: AnchorKey,
}

impl Default for AnchorOrder {
    fn default() -> Self {
        Self {
            outgoing: AnchorKey::NeighborY,
            incoming: AnchorKey::NeighborX,
        }
    }
}

impl AnchorOrder {
    /// Sort both edges by the same key
    pub fn uniform(key: AnchorKey) -> Self {
        Self {
            outgoing: key,
            incoming: key,
        }
    }
}

/// Compute anchors, control points and stroke of every link
///
/// Links of a node are stacked contiguously from the top of its edge, each
/// taking `value * ratio` pixels. Links with an endpoint missing from `nodes`
/// are skipped.
pub(crate) fn route_links(
    links: &[FlowLink],
    nodes: &BTreeMap<NodeId, NodeGeometry>,
    ratio: f64,
    order: AnchorOrder,
) -> BTreeMap<LinkId, LinkGeometry> {
    let mut outgoing: HashMap<&NodeId, Vec<(&FlowLink, &NodeGeometry)>> = HashMap::new();
    let mut incoming: HashMap<&NodeId, Vec<(&FlowLink, &NodeGeometry)>> = HashMap::new();

    for link in links {
        let (Some(source), Some(target)) = (nodes.get(&link.source), nodes.get(&link.target))
        else {
            warn!("Link {} has no placed endpoint, skipping it", link.id);
            continue;
        };
        outgoing.entry(&link.source).or_default().push((link, target));
        incoming.entry(&link.target).or_default().push((link, source));
    }

    let mut starts = HashMap::new();
    for (id, siblings) in &mut outgoing {
        let node = &nodes[*id];
        let x = node.x + node.width;
        for (link, y) in stack(siblings, node.y, ratio, order.outgoing) {
            starts.insert(link, Point::new(x, y));
        }
    }

    let mut ends = HashMap::new();
    for (id, siblings) in &mut incoming {
        let node = &nodes[*id];
        for (link, y) in stack(siblings, node.y, ratio, order.incoming) {
            ends.insert(link, Point::new(node.x, y));
        }
    }

    links
        .iter()
        .filter_map(|link| {
            let start = *starts.get(&link.id)?;
            let end = *ends.get(&link.id)?;
            let dx = (end.x - start.x) / 3.0;

            Some((
                link.id,
                LinkGeometry {
                    id: link.id,
                    source: link.source.clone(),
                    target: link.target.clone(),
                    value: link.value,
                    start,
                    end,
                    control1: Point::new(start.x + dx, start.y),
                    control2: Point::new(start.x + 2.0 * dx, end.y),
                    stroke_width: link.value * ratio,
                    color: nodes[&link.source].color,
                },
            ))
        })
        .collect()
}

/// Sort sibling links and return the vertical midpoint of each one
fn stack(
    siblings: &mut [(&FlowLink, &NodeGeometry)],
    top: f64,
    ratio: f64,
    key: AnchorKey,
) -> Vec<(LinkId, f64)> {
    siblings.sort_by(|(a, a_neighbor), (b, b_neighbor)| {
        key.of(a_neighbor)
            .total_cmp(&key.of(b_neighbor))
            .then_with(|| a_neighbor.id.cmp(&b_neighbor.id))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut current = top;
    siblings
        .iter()
        .map(|(link, _)| {
            let thickness = link.value * ratio;
            let mid = current + thickness / 2.0;
            current += thickness;
            (link.id, mid)
        })
        .collect()
}
