use crate::Color;
use derive_more::{Display, From};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Caller-assigned node identity
///
/// Two nodes are the same node iff their ids are equal, display names play no
/// part in identity.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, From, Display,
)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Link identity, assigned by the graph in insertion order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, From, Display,
)]
#[serde(transparent)]
pub struct LinkId(pub u64);

/// Errors raised when a mutation would break the graph's integrity
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {0} already exists")]
    DuplicateNode(NodeId),

    #[error("unknown link {0}")]
    UnknownLink(LinkId),

    /// Link values must be finite and non-negative
    #[error("invalid link value {0}")]
    InvalidValue(f64),

    #[error("self-loop on node {0} is not supported")]
    SelfLoop(NodeId),

    /// The total flow entering or leaving a node must stay finite
    #[error("total flow of node {0} would overflow")]
    FlowOverflow(NodeId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: NodeId,
    pub name: String,
    /// Fill color, only used to pick the stroke color of outgoing links
    #[serde(default)]
    pub color: Option<Color>,
}

impl FlowNode {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLink {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    pub value: f64,
}

/// Directed, weighted multigraph of flows
///
/// Every link's endpoints exist in the node set at all times: mutations that
/// would break this fail immediately and leave the graph untouched.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    graph: StableDiGraph<FlowNode, FlowLink>,
    nodes: HashMap<NodeId, NodeIndex>,
    links: HashMap<LinkId, EdgeIndex>,
    next_link_id: u64,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: FlowNode) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            warn!("Rejecting duplicate node {}", node.id);
            return Err(GraphError::DuplicateNode(node.id));
        }

        debug!("Adding node {} ({:?})", node.id, node.name);
        let id = node.id.clone();
        let index = self.graph.add_node(node);
        self.nodes.insert(id, index);
        Ok(())
    }

    /// Add a link carrying `value` from `source` to `target`
    ///
    /// Parallel links between the same pair of nodes are kept apart, each
    /// with its own [`LinkId`].
    pub fn add_link(
        &mut self,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        value: f64,
    ) -> Result<LinkId, GraphError> {
        let (source, target) = (source.into(), target.into());
        check_value(value)?;
        let from = self.index_of(&source)?;
        let to = self.index_of(&target)?;
        if from == to {
            warn!("Rejecting self-loop on {source}");
            return Err(GraphError::SelfLoop(source));
        }
        check_total(&source, self.sum_of_links_from(&source) + value)?;
        check_total(&target, self.sum_of_links_targeting(&target) + value)?;

        let id = LinkId(self.next_link_id);
        self.next_link_id += 1;
        debug!("Adding link {id}: {source} -> {target} ({value})");

        let edge = self.graph.add_edge(
            from,
            to,
            FlowLink {
                id,
                source,
                target,
                value,
            },
        );
        self.links.insert(id, edge);
        Ok(id)
    }

    /// Remove a node together with every link touching it
    pub fn remove_node(&mut self, id: &NodeId) -> Result<(FlowNode, Vec<FlowLink>), GraphError> {
        let index = self.index_of(id)?;

        let mut edges: Vec<EdgeIndex> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .chain(self.graph.edges_directed(index, Direction::Incoming))
            .map(|edge| edge.id())
            .collect();
        edges.sort();

        let mut removed = Vec::with_capacity(edges.len());
        for edge in edges {
            if let Some(link) = self.graph.remove_edge(edge) {
                self.links.remove(&link.id);
                removed.push(link);
            }
        }

        self.nodes.remove(id);
        let node = self
            .graph
            .remove_node(index)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))?;
        debug!("Removed node {id} and {} link(s)", removed.len());

        Ok((node, removed))
    }

    pub fn remove_link(&mut self, id: LinkId) -> Result<FlowLink, GraphError> {
        let edge = self.links.remove(&id).ok_or(GraphError::UnknownLink(id))?;
        self.graph
            .remove_edge(edge)
            .ok_or(GraphError::UnknownLink(id))
    }

    /// Change the value carried by a link, returning the previous one
    pub fn set_link_value(&mut self, id: LinkId, value: f64) -> Result<f64, GraphError> {
        check_value(value)?;
        let link = self.link(id).ok_or(GraphError::UnknownLink(id))?;
        let outflow: f64 = self
            .outgoing(&link.source)
            .filter(|other| other.id != id)
            .map(|other| other.value)
            .sum();
        let inflow: f64 = self
            .incoming(&link.target)
            .filter(|other| other.id != id)
            .map(|other| other.value)
            .sum();
        check_total(&link.source, outflow + value)?;
        check_total(&link.target, inflow + value)?;

        let link = self
            .links
            .get(&id)
            .and_then(|&edge| self.graph.edge_weight_mut(edge))
            .ok_or(GraphError::UnknownLink(id))?;
        Ok(std::mem::replace(&mut link.value, value))
    }

    /// Change the display name of a node, returning the previous one
    pub fn rename_node(
        &mut self,
        id: &NodeId,
        name: impl Into<String>,
    ) -> Result<String, GraphError> {
        let node = self.node_mut(id)?;
        Ok(std::mem::replace(&mut node.name, name.into()))
    }

    pub fn set_node_color(&mut self, id: &NodeId, color: Option<Color>) -> Result<(), GraphError> {
        self.node_mut(id)?.color = color;
        Ok(())
    }

    pub fn node(&self, id: &NodeId) -> Option<&FlowNode> {
        self.nodes.get(id).map(|&index| &self.graph[index])
    }

    pub fn link(&self, id: LinkId) -> Option<&FlowLink> {
        self.links.get(&id).map(|&edge| &self.graph[edge])
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.graph.node_weights()
    }

    pub fn links(&self) -> impl Iterator<Item = &FlowLink> {
        self.graph.edge_weights()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Links leaving the given node, empty if the node is unknown
    pub fn outgoing<'a>(&'a self, id: &NodeId) -> impl Iterator<Item = &'a FlowLink> + 'a {
        self.links_directed(id, Direction::Outgoing)
    }

    /// Links entering the given node, empty if the node is unknown
    pub fn incoming<'a>(&'a self, id: &NodeId) -> impl Iterator<Item = &'a FlowLink> + 'a {
        self.links_directed(id, Direction::Incoming)
    }

    /// Sum of the values of the links coming from the given node
    pub fn sum_of_links_from(&self, id: &NodeId) -> f64 {
        self.outgoing(id).map(|link| link.value).sum()
    }

    /// Sum of the values of the links targeting the given node
    pub fn sum_of_links_targeting(&self, id: &NodeId) -> f64 {
        self.incoming(id).map(|link| link.value).sum()
    }

    pub(crate) fn inner(&self) -> &StableDiGraph<FlowNode, FlowLink> {
        &self.graph
    }

    fn links_directed<'a>(
        &'a self,
        id: &NodeId,
        direction: Direction,
    ) -> impl Iterator<Item = &'a FlowLink> + 'a {
        self.nodes.get(id).into_iter().flat_map(move |&index| {
            self.graph
                .edges_directed(index, direction)
                .map(|edge| edge.weight())
        })
    }

    fn index_of(&self, id: &NodeId) -> Result<NodeIndex, GraphError> {
        self.nodes.get(id).copied().ok_or_else(|| {
            warn!("Unknown node {id}");
            GraphError::UnknownNode(id.clone())
        })
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut FlowNode, GraphError> {
        let index = self.index_of(id)?;
        self.graph
            .node_weight_mut(index)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))
    }
}

fn check_value(value: f64) -> Result<(), GraphError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        warn!("Rejecting link value {value}");
        Err(GraphError::InvalidValue(value))
    }
}

fn check_total(node: &NodeId, total: f64) -> Result<(), GraphError> {
    if total.is_finite() {
        Ok(())
    } else {
        warn!("Rejecting link, the flow of {node} would overflow");
        Err(GraphError::FlowOverflow(node.clone()))
    }
}

/// Serializable description of a flow graph
///
/// Link ids are assigned on conversion, in the order links are listed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphDescription {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<LinkDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDescription {
    pub source: NodeId,
    pub target: NodeId,
    pub value: f64,
}

impl TryFrom<GraphDescription> for FlowGraph {
    type Error = GraphError;

    fn try_from(description: GraphDescription) -> Result<Self, Self::Error> {
        let mut graph = FlowGraph::new();
        for node in description.nodes {
            graph.add_node(node)?;
        }
        for link in description.links {
            graph.add_link(link.source, link.target, link.value)?;
        }
        Ok(graph)
    }
}

impl From<&FlowGraph> for GraphDescription {
    fn from(graph: &FlowGraph) -> Self {
        let mut links: Vec<&FlowLink> = graph.links().collect();
        links.sort_by_key(|link| link.id);

        Self {
            nodes: graph.nodes().cloned().collect(),
            links: links
                .into_iter()
                .map(|link| LinkDescription {
                    source: link.source.clone(),
                    target: link.target.clone(),
                    value: link.value,
                })
                .collect(),
        }
    }
}
