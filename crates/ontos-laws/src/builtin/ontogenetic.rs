//! Kind-specific required fields

use crate::law::Law;
use crate::violation::{LawCategory, Severity};
use ontos_graph::{is_blank, NodeKind};

pub(super) fn entity() -> Law {
    Law::infallible(
        "ontogenetic.entity",
        LawCategory::Ontogenetic,
        Severity::Error,
        "Ontogenetic nodes name the entity they describe",
        |graph, meta| {
            graph
                .nodes
                .iter()
                .filter(|n| n.kind.is_ontogenetic() && is_blank(n.data.entity.as_deref()))
                .map(|n| {
                    meta.violation(format!("{} node '{}' has no entity", n.kind, n.id))
                        .at_node(&n.id)
                        .suggest("Set the entity this node describes")
                })
                .collect()
        },
    )
}

pub(super) fn begin_properties() -> Law {
    Law::infallible(
        "ontogenetic.begin_properties",
        LawCategory::Ontogenetic,
        Severity::Error,
        "Begin nodes declare initial properties",
        |graph, meta| {
            graph
                .nodes_of_kind(NodeKind::Begin)
                .filter(|n| n.data.properties.is_empty())
                .map(|n| {
                    meta.violation(format!("Begin node '{}' has no properties", n.id))
                        .at_node(&n.id)
                        .suggest("Declare the entity's initial properties")
                })
                .collect()
        },
    )
}

pub(super) fn become_transform() -> Law {
    Law::infallible(
        "ontogenetic.become_transform",
        LawCategory::Ontogenetic,
        Severity::Error,
        "Become nodes declare a transform",
        |graph, meta| {
            graph
                .nodes_of_kind(NodeKind::Become)
                .filter(|n| is_blank(n.data.transform.as_deref()))
                .map(|n| {
                    meta.violation(format!("Become node '{}' has no transform", n.id))
                        .at_node(&n.id)
                        .suggest("Set a transform describing how the entity changes")
                })
                .collect()
        },
    )
}

pub(super) fn cease_condition() -> Law {
    Law::infallible(
        "ontogenetic.cease_condition",
        LawCategory::Ontogenetic,
        Severity::Error,
        "Cease nodes declare a condition",
        |graph, meta| {
            graph
                .nodes_of_kind(NodeKind::Cease)
                .filter(|n| is_blank(n.data.condition.as_deref()))
                .map(|n| {
                    meta.violation(format!("Cease node '{}' has no condition", n.id))
                        .at_node(&n.id)
                        .suggest("Set the condition under which the entity ceases")
                })
                .collect()
        },
    )
}
