//! Graph value type
//!
//! [`Graph`] is a plain value: ordered nodes and edges, with edges referring
//! to nodes by id. Mutation tooling elsewhere clones a graph and returns a new
//! version instead of editing a shared one in place, so older versions (and
//! snapshots of them) stay valid.

use crate::node::{Node, NodeKind};
use serde::{Deserialize, Serialize};

/// Directed edge between two node ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Unique id within the graph
    pub id: String,
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Optional display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    /// Create unlabeled edge
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
        }
    }

    /// Set label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether the edge touches the given node
    #[inline]
    #[must_use]
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Workflow graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes in authoring order
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges in authoring order
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Create empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node
    #[inline]
    #[must_use]
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Append an edge
    #[inline]
    #[must_use]
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Append an edge with a generated id `source->target`
    #[must_use]
    pub fn connect(self, source: &str, target: &str) -> Self {
        let id = format!("{source}->{target}");
        self.with_edge(Edge::new(id, source, target))
    }

    /// True when there are no nodes and no edges
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Look up a node by id (first match)
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Mutable node lookup
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Look up an edge by id
    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Whether a node with this id exists
    #[inline]
    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Nodes of the given kind, in order
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// Edges pointing at a node
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.target == id)
    }

    /// Edges leaving a node
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Nodes connected to `id` by an edge in either direction
    ///
    /// Order follows edge order; each neighbor appears once and `id` itself
    /// is excluded.
    #[must_use]
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for edge in &self.edges {
            let other = if edge.source == id {
                edge.target.as_str()
            } else if edge.target == id {
                edge.source.as_str()
            } else {
                continue;
            };
            if other != id && !out.contains(&other) {
                out.push(other);
            }
        }
        out
    }

    /// Remove a node and every edge touching it
    ///
    /// Returns the removed node and edges, or `None` if the node is absent.
    pub fn remove_node(&mut self, id: &str) -> Option<(Node, Vec<Edge>)> {
        let pos = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(pos);
        let (removed, kept): (Vec<Edge>, Vec<Edge>) =
            std::mem::take(&mut self.edges).into_iter().partition(|e| e.touches(id));
        self.edges = kept;
        Some((node, removed))
    }

    /// Remove an edge by id
    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let pos = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(pos))
    }
}
