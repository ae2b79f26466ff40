use crate::{
    Color, FlowGraph, FlowLink, FlowNode, Frame, GraphError, GraphEvent, GraphObserver,
    LayoutError, LayoutResult, LinkId, NodeGeometry, NodeId, Placement, Point, SankeyLayout,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, trace};

/// A flow graph together with its current layout
///
/// Every mutation goes through the chart, which validates it, notifies the
/// observers and marks the layout as stale. Layout passes and node moves take
/// `&mut self`, so the graph cannot change while a pass reads it.
///
/// In incremental mode, a pass only assigns coordinates to the nodes added
/// since the previous pass; the other nodes keep their position while their
/// value, column, row and size are still recomputed.
pub struct SankeyChart {
    graph: FlowGraph,
    layout: SankeyLayout,
    result: LayoutResult,
    frame: Option<Frame>,
    needs_layout: bool,
    incremental: bool,
    new_nodes: BTreeSet<NodeId>,
    observers: Vec<Box<dyn GraphObserver>>,
}

impl Default for SankeyChart {
    fn default() -> Self {
        Self::new(SankeyLayout::default())
    }
}

impl fmt::Debug for SankeyChart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SankeyChart")
            .field("graph", &self.graph)
            .field("layout", &self.layout)
            .field("frame", &self.frame)
            .field("needs_layout", &self.needs_layout)
            .field("incremental", &self.incremental)
            .field("new_nodes", &self.new_nodes)
            .finish_non_exhaustive()
    }
}

impl SankeyChart {
    pub fn new(layout: SankeyLayout) -> Self {
        Self::from_graph(FlowGraph::new(), layout)
    }

    /// Create a chart around an existing graph, none of it laid out yet
    pub fn from_graph(graph: FlowGraph, layout: SankeyLayout) -> Self {
        let new_nodes = graph.nodes().map(|node| node.id.clone()).collect();
        Self {
            graph,
            layout,
            result: LayoutResult::default(),
            frame: None,
            needs_layout: true,
            incremental: false,
            new_nodes,
            observers: Vec::new(),
        }
    }

    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn set_incremental(&mut self, incremental: bool) {
        self.incremental = incremental;
    }

    pub fn is_incremental(&self) -> bool {
        self.incremental
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn settings(&self) -> &SankeyLayout {
        &self.layout
    }

    /// Change the layout configuration, the next pass will use it
    pub fn set_settings(&mut self, layout: SankeyLayout) {
        self.layout = layout;
        self.needs_layout = true;
    }

    /// Result of the last successful pass
    pub fn result(&self) -> &LayoutResult {
        &self.result
    }

    pub fn needs_layout(&self) -> bool {
        self.needs_layout
    }

    /// Register an observer of graph changes
    pub fn subscribe(&mut self, observer: impl GraphObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn add_node(&mut self, node: FlowNode) -> Result<(), GraphError> {
        let id = node.id.clone();
        self.graph.add_node(node)?;
        self.new_nodes.insert(id.clone());
        self.changed(GraphEvent::NodeAdded(id));
        Ok(())
    }

    /// Add nodes in order, stopping at the first one rejected
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = FlowNode>) -> Result<(), GraphError> {
        nodes.into_iter().try_for_each(|node| self.add_node(node))
    }

    pub fn add_link(
        &mut self,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        value: f64,
    ) -> Result<LinkId, GraphError> {
        let id = self.graph.add_link(source, target, value)?;
        self.changed(GraphEvent::LinkAdded(id));
        Ok(id)
    }

    /// Remove a node and all the links touching it
    pub fn remove_node(&mut self, id: &NodeId) -> Result<FlowNode, GraphError> {
        let (node, links) = self.graph.remove_node(id)?;
        self.new_nodes.remove(id);
        self.changed(GraphEvent::NodeRemoved {
            node: id.clone(),
            links: links.into_iter().map(|link| link.id).collect(),
        });
        Ok(node)
    }

    pub fn remove_link(&mut self, id: LinkId) -> Result<FlowLink, GraphError> {
        let link = self.graph.remove_link(id)?;
        self.changed(GraphEvent::LinkRemoved(id));
        Ok(link)
    }

    pub fn set_link_value(&mut self, id: LinkId, value: f64) -> Result<f64, GraphError> {
        let previous = self.graph.set_link_value(id, value)?;
        self.changed(GraphEvent::LinkValueChanged { link: id, value });
        Ok(previous)
    }

    pub fn rename_node(&mut self, id: &NodeId, name: impl Into<String>) -> Result<String, GraphError> {
        let name = name.into();
        let previous = self.graph.rename_node(id, name.clone())?;
        self.changed(GraphEvent::NodeRenamed {
            node: id.clone(),
            name,
        });
        Ok(previous)
    }

    pub fn set_node_color(&mut self, id: &NodeId, color: Option<Color>) -> Result<(), GraphError> {
        self.graph.set_node_color(id, color)?;
        self.changed(GraphEvent::NodeColorChanged(id.clone()));
        Ok(())
    }

    /// Mark the layout as stale without changing the graph
    pub fn request_layout(&mut self) {
        self.needs_layout = true;
    }

    /// Run a layout pass in the given frame
    ///
    /// On failure the previous result is kept as is, and so are the nodes
    /// waiting for a position in incremental mode.
    ///
    /// # Errors
    /// Returns an error if the graph contains a cycle
    pub fn layout(&mut self, frame: Frame) -> Result<&LayoutResult, LayoutError> {
        let keep = self.kept_positions(frame);
        trace!("Keeping the position of {} node(s)", keep.len());

        let result = self.layout.layout_keeping(&self.graph, frame, &keep)?;
        debug!(
            "Laid out {} node(s) and {} link(s)",
            result.nodes.len(),
            result.links.len()
        );

        self.result = result;
        self.frame = Some(frame);
        self.needs_layout = false;
        self.new_nodes.clear();
        Ok(&self.result)
    }

    /// Run a layout pass only if the graph or the frame changed since the last one
    pub fn layout_if_needed(&mut self, frame: Frame) -> Result<&LayoutResult, LayoutError> {
        if self.needs_layout || self.frame != Some(frame) {
            self.layout(frame)
        } else {
            Ok(&self.result)
        }
    }

    /// Move a laid out node, as when dragging it, and reroute the links
    ///
    /// The links routed are the ones of the current result: changes to the
    /// graph since the last pass are only reflected by the next pass.
    pub fn move_node(&mut self, id: &NodeId, position: Point) -> Result<(), GraphError> {
        let Some(node) = self.result.nodes.get_mut(id) else {
            return Err(GraphError::UnknownNode(id.clone()));
        };
        node.x = position.x;
        node.y = position.y;

        let links: Vec<FlowLink> = self
            .result
            .links
            .values()
            .map(|link| FlowLink {
                id: link.id,
                source: link.source.clone(),
                target: link.target.clone(),
                value: link.value,
            })
            .collect();
        let placement = Placement {
            ratio: self.result.ratio,
            nodes: std::mem::take(&mut self.result.nodes),
        };

        trace!("Moved node {id} to {position:?}");
        self.result = self.layout.reroute_links(&links, placement);
        Ok(())
    }

    fn kept_positions(&self, frame: Frame) -> BTreeMap<NodeId, NodeGeometry> {
        if !self.incremental || self.frame != Some(frame) {
            return BTreeMap::new();
        }

        self.result
            .nodes
            .iter()
            .filter(|(id, _)| !self.new_nodes.contains(*id))
            .map(|(id, node)| (id.clone(), node.clone()))
            .collect()
    }

    fn changed(&mut self, event: GraphEvent) {
        self.needs_layout = true;
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use test_log::test;

    const FRAME: Frame = Frame {
        top: 0.0,
        left: 0.0,
        width: 500.0,
        height: 500.0,
    };

    fn chart() -> SankeyChart {
        let mut chart = SankeyChart::default();
        chart
            .add_nodes(["n1", "n2", "n3", "n4"].map(|id| FlowNode::new(id, id)))
            .unwrap();
        chart.add_link("n1", "n2", 2.0).unwrap();
        chart.add_link("n1", "n3", 5.0).unwrap();
        chart.add_link("n3", "n4", 1.0).unwrap();
        chart.add_link("n1", "n4", 6.0).unwrap();
        chart
    }

    #[test]
    fn observers_see_every_change() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut chart = chart();
        let sink = events.clone();
        chart.subscribe(move |event: &GraphEvent| sink.borrow_mut().push(event.clone()));

        let link = chart.add_link("n2", "n4", 1.0).unwrap();
        chart.set_link_value(link, 2.0).unwrap();
        chart.rename_node(&"n2".into(), "two").unwrap();
        chart.remove_node(&"n3".into()).unwrap();
        assert!(chart.add_link("n3", "n4", 1.0).is_err());

        assert_eq!(
            *events.borrow(),
            vec![
                GraphEvent::LinkAdded(link),
                GraphEvent::LinkValueChanged {
                    link,
                    value: 2.0
                },
                GraphEvent::NodeRenamed {
                    node: "n2".into(),
                    name: "two".to_string()
                },
                GraphEvent::NodeRemoved {
                    node: "n3".into(),
                    links: vec![LinkId(1), LinkId(2)]
                },
            ]
        );
    }

    #[test]
    fn layout_only_when_needed() {
        let mut chart = chart();
        assert!(chart.needs_layout());
        chart.layout_if_needed(FRAME).unwrap();
        assert!(!chart.needs_layout());

        let first = chart.result().clone();
        assert_eq!(chart.layout_if_needed(FRAME).unwrap(), &first);

        chart.request_layout();
        assert!(chart.needs_layout());
        chart.layout_if_needed(FRAME).unwrap();
        assert_eq!(chart.result(), &first);

        let wider = Frame { width: 800.0, ..FRAME };
        let resized = chart.layout_if_needed(wider).unwrap();
        assert_ne!(resized.node(&"n4".into()).unwrap().x, first.node(&"n4".into()).unwrap().x);
    }

    #[test]
    fn failed_pass_keeps_previous_result() {
        let mut chart = chart();
        let first = chart.layout(FRAME).unwrap().clone();

        chart.add_link("n4", "n1", 1.0).unwrap();
        assert!(matches!(chart.layout(FRAME), Err(LayoutError::CyclicGraph { .. })));
        assert_eq!(chart.result(), &first);
        assert!(chart.needs_layout());
    }

    #[test]
    fn incremental_mode_places_only_new_nodes() {
        let mut chart = chart().with_incremental(true);
        chart.layout(FRAME).unwrap();

        chart.move_node(&"n2".into(), Point::new(300.0, 400.0)).unwrap();
        chart.add_node(FlowNode::new("n5", "n5")).unwrap();
        chart.add_link("n4", "n5", 7.0).unwrap();
        let result = chart.layout(FRAME).unwrap();

        let n2 = result.node(&"n2".into()).unwrap();
        assert_eq!(n2.position(), Point::new(300.0, 400.0));

        // Values, columns and sizes are still global
        let n5 = result.node(&"n5".into()).unwrap();
        assert_eq!((n5.column, n5.value), (3, 7.0));
        assert!((n5.x - 3.0 * (500.0 - 4.0 * 24.0) / 3.0).abs() < 1e-9);
        assert_eq!(n5.height, 7.0 * result.ratio);
        let n4 = result.node(&"n4".into()).unwrap();
        assert_eq!(n4.height, 7.0 * result.ratio);
    }

    #[test]
    fn full_mode_places_every_node() {
        let mut chart = chart();
        let first = chart.layout(FRAME).unwrap().clone();

        chart.move_node(&"n2".into(), Point::new(300.0, 400.0)).unwrap();
        chart.request_layout();
        assert_eq!(chart.layout(FRAME).unwrap(), &first);
    }

    #[test]
    fn moving_a_node_reroutes_its_links() {
        let mut chart = chart();
        chart.layout(FRAME).unwrap();

        chart.move_node(&"n2".into(), Point::new(100.0, 250.0)).unwrap();
        let link = chart.result().link(LinkId(0)).unwrap();
        let ratio = chart.result().ratio;
        assert_eq!(link.end, Point::new(100.0, 250.0 + ratio));
        assert_eq!(link.control2.y, link.end.y);

        assert_eq!(
            chart.move_node(&"ghost".into(), Point::new(0.0, 0.0)),
            Err(GraphError::UnknownNode("ghost".into()))
        );
        assert_eq!(chart.result().nodes.len(), 4);
    }
}
