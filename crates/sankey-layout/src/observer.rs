use crate::{LinkId, NodeId};

/// Change applied to the graph of a [`SankeyChart`](crate::SankeyChart)
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    NodeAdded(NodeId),
    /// The node was removed along with the listed links
    NodeRemoved {
        node: NodeId,
        links: Vec<LinkId>,
    },
    NodeRenamed {
        node: NodeId,
        name: String,
    },
    NodeColorChanged(NodeId),
    LinkAdded(LinkId),
    LinkRemoved(LinkId),
    LinkValueChanged {
        link: LinkId,
        value: f64,
    },
}

/// Receives the changes applied to a chart's graph
///
/// Hosts typically react by requesting a layout pass or a repaint.
pub trait GraphObserver {
    fn on_event(&mut self, event: &GraphEvent);
}

// Blanket implementation for closures
impl<F> GraphObserver for F
where
    F: FnMut(&GraphEvent),
{
    fn on_event(&mut self, event: &GraphEvent) {
        self(event)
    }
}
