//! Size and branching soft limits

use crate::law::Law;
use crate::violation::{LawCategory, Severity};
use ontos_graph::GraphIndex;

pub(super) fn node_limit(max_nodes: usize) -> Law {
    Law::infallible(
        "operational.node_limit",
        LawCategory::Operational,
        Severity::Warning,
        format!("Graphs stay within {max_nodes} nodes"),
        move |graph, meta| {
            let count = graph.nodes.len();
            if count <= max_nodes {
                return Vec::new();
            }
            vec![meta
                .violation(format!("Graph has {count} nodes (limit {max_nodes})"))
                .suggest("Split the workflow into smaller graphs")]
        },
    )
}

pub(super) fn branching_limit(max_out_degree: usize) -> Law {
    Law::infallible(
        "operational.branching_limit",
        LawCategory::Operational,
        Severity::Warning,
        format!("Nodes fan out to at most {max_out_degree} successors"),
        move |graph, meta| {
            let index = GraphIndex::build(graph);
            (0..index.len())
                .filter_map(|pos| {
                    let id = index.id_at(pos);
                    let degree = index.out_degree(id);
                    (degree > max_out_degree).then(|| {
                        meta.violation(format!(
                            "Node '{id}' has {degree} outgoing edges (limit {max_out_degree})"
                        ))
                        .at_node(id)
                        .suggest("Introduce an intermediate node to group branches")
                    })
                })
                .collect()
        },
    )
}
