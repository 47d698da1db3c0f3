//! Graph-shape laws

use crate::law::Law;
use crate::violation::{LawCategory, Severity};
use ontos_graph::{cycle_key, GraphIndex, NodeKind};
use std::collections::HashSet;

pub(super) fn begin_exists() -> Law {
    Law::infallible(
        "structural.begin_exists",
        LawCategory::Structural,
        Severity::Critical,
        "A non-empty graph has at least one Begin node",
        |graph, meta| {
            if graph.nodes.is_empty() || graph.nodes_of_kind(NodeKind::Begin).next().is_some() {
                return Vec::new();
            }
            vec![meta
                .violation("Graph has no Begin node")
                .suggest("Add a Begin node as the entry point of the workflow")]
        },
    )
}

pub(super) fn unique_ids() -> Law {
    Law::infallible(
        "structural.unique_ids",
        LawCategory::Structural,
        Severity::Error,
        "Node ids are unique",
        |graph, meta| {
            let mut seen = HashSet::new();
            graph
                .nodes
                .iter()
                .filter(|n| !seen.insert(n.id.as_str()))
                .map(|n| {
                    meta.violation(format!("Duplicate node id '{}'", n.id))
                        .at_node(&n.id)
                        .suggest("Give every node a distinct id")
                })
                .collect()
        },
    )
}

pub(super) fn edge_endpoints() -> Law {
    Law::infallible(
        "structural.edge_endpoints",
        LawCategory::Structural,
        Severity::Error,
        "Edges reference existing nodes",
        |graph, meta| {
            let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
            let mut out = Vec::new();
            for edge in &graph.edges {
                for (end, id) in [("source", &edge.source), ("target", &edge.target)] {
                    if !ids.contains(id.as_str()) {
                        out.push(
                            meta.violation(format!(
                                "Edge '{}' references missing {end} node '{id}'",
                                edge.id
                            ))
                            .at_edge(&edge.id)
                            .suggest("Remove the edge or restore the missing node"),
                        );
                    }
                }
            }
            out
        },
    )
}

pub(super) fn begin_no_inbound() -> Law {
    Law::infallible(
        "structural.begin_no_inbound",
        LawCategory::Structural,
        Severity::Error,
        "Begin nodes have no inbound edges",
        |graph, meta| {
            graph
                .nodes_of_kind(NodeKind::Begin)
                .filter_map(|node| {
                    let inbound = graph.incoming(&node.id).count();
                    (inbound > 0).then(|| {
                        meta.violation(format!(
                            "Begin node '{}' has {inbound} inbound edge(s)",
                            node.id
                        ))
                        .at_node(&node.id)
                        .suggest("Remove edges into the Begin node or change its kind")
                    })
                })
                .collect()
        },
    )
}

pub(super) fn reachability() -> Law {
    Law::infallible(
        "structural.reachability",
        LawCategory::Structural,
        Severity::Warning,
        "Every node is reachable from some Begin node",
        |graph, meta| {
            let index = GraphIndex::build(graph);
            let starts: Vec<usize> = (0..index.len())
                .filter(|&pos| index.node_at(pos).kind == NodeKind::Begin)
                .collect();
            if starts.is_empty() {
                return Vec::new();
            }
            let reached = index.reachable_from(starts);
            (0..index.len())
                .filter(|&pos| !reached[pos])
                .map(|pos| {
                    let id = index.id_at(pos);
                    meta.violation(format!("Node '{id}' is not reachable from any Begin node"))
                        .at_node(id)
                        .suggest("Connect the node to the flow or remove it")
                })
                .collect()
        },
    )
}

pub(super) fn acyclic() -> Law {
    Law::infallible(
        "structural.acyclic",
        LawCategory::Structural,
        Severity::Error,
        "The graph contains no directed cycles",
        |graph, meta| {
            GraphIndex::build(graph)
                .cycles()
                .into_iter()
                .map(|cycle| {
                    let first = cycle[0];
                    meta.violation(format!(
                        "Cycle detected: {} -> {first}",
                        cycle_key(&cycle)
                    ))
                    .at_node(first)
                    .suggest("Remove or redirect one edge of the cycle")
                })
                .collect()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontos_graph::{Edge, Graph, Node};

    #[test]
    fn begin_exists_ignores_empty_graph() {
        let law = begin_exists();
        assert!(law.evaluate(&Graph::new()).unwrap().is_empty());
        let g = Graph::new().with_node(Node::become_("a", "e"));
        assert_eq!(law.evaluate(&g).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_ids_reported_after_first() {
        let g = Graph::new()
            .with_node(Node::begin("a", "e"))
            .with_node(Node::become_("a", "e"))
            .with_node(Node::become_("a", "e"));
        assert_eq!(unique_ids().evaluate(&g).unwrap().len(), 2);
    }

    #[test]
    fn dangling_edge_reports_each_missing_end() {
        let g = Graph::new()
            .with_node(Node::begin("a", "e"))
            .with_edge(Edge::new("e1", "a", "ghost"))
            .with_edge(Edge::new("e2", "x", "y"));
        let out = edge_endpoints().evaluate(&g).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].edge_id.as_deref(), Some("e1"));
        assert!(out[0].message.contains("missing target node 'ghost'"));
        assert!(out[1].message.contains("missing source node 'x'"));
    }

    #[test]
    fn begin_with_inbound_edge() {
        let g = Graph::new()
            .with_node(Node::begin("a", "e"))
            .with_node(Node::become_("b", "e"))
            .connect("b", "a");
        let out = begin_no_inbound().evaluate(&g).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].node_id.as_deref(), Some("a"));
    }

    #[test]
    fn unreachable_nodes_warned_in_node_order() {
        let g = Graph::new()
            .with_node(Node::begin("a", "e"))
            .with_node(Node::become_("z", "e"))
            .with_node(Node::become_("b", "e"))
            .with_node(Node::become_("y", "e"))
            .connect("a", "b")
            .connect("z", "y");
        let out = reachability().evaluate(&g).unwrap();
        let ids: Vec<_> = out.iter().filter_map(|v| v.node_id.as_deref()).collect();
        assert_eq!(ids, vec!["z", "y"]);
        assert!(out.iter().all(|v| v.severity == Severity::Warning));
    }

    #[test]
    fn reachability_silent_without_begin() {
        let g = Graph::new().with_node(Node::become_("a", "e"));
        assert!(reachability().evaluate(&g).unwrap().is_empty());
    }

    #[test]
    fn cycle_message_closes_the_loop() {
        let g = Graph::new()
            .with_node(Node::become_("b", "e"))
            .with_node(Node::become_("a", "e"))
            .connect("b", "a")
            .connect("a", "b");
        let out = acyclic().evaluate(&g).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message, "Cycle detected: a -> b -> a");
        assert_eq!(out[0].node_id.as_deref(), Some("a"));
    }
}
