//! Hints for optional kind-specific fields

use crate::law::Law;
use crate::violation::{LawCategory, Severity};
use ontos_graph::{is_blank, NodeKind};

pub(super) fn transcend_portal() -> Law {
    Law::infallible(
        "semantic.transcend_portal",
        LawCategory::Semantic,
        Severity::Info,
        "Transcend nodes usually name a portal",
        |graph, meta| {
            graph
                .nodes_of_kind(NodeKind::Transcend)
                .filter(|n| is_blank(n.data.portal.as_deref()))
                .map(|n| {
                    meta.violation(format!("Transcend node '{}' has no portal", n.id))
                        .at_node(&n.id)
                        .suggest("Name the portal the entity passes through")
                })
                .collect()
        },
    )
}

pub(super) fn resolve_strategy() -> Law {
    Law::infallible(
        "semantic.resolve_strategy",
        LawCategory::Semantic,
        Severity::Info,
        "Resolve nodes usually name a strategy",
        |graph, meta| {
            graph
                .nodes_of_kind(NodeKind::Resolve)
                .filter(|n| is_blank(n.data.strategy.as_deref()))
                .map(|n| {
                    meta.violation(format!("Resolve node '{}' has no strategy", n.id))
                        .at_node(&n.id)
                        .suggest("Name the reconciliation strategy")
                })
                .collect()
        },
    )
}
