//! Blast-radius analysis for proposed repairs
//!
//! [`ImpactAnalyzer::analyze`] decides, per step, which nodes and edges a
//! repair touches, what ripples outward from it and how strongly neighbors
//! depend on the change. The aggregate feeds a 0-100 risk score, a conflict
//! band and a reversibility flag. Nothing here mutates the graph.

use crate::step::{RepairAction, RepairStep};
use ontos_graph::{Graph, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Dependency strength above which a link counts as strong
pub const STRONG_DEPENDENCY: f64 = 0.7;
/// Strength of a neighbor's dependency on a field mutation
pub const FIELD_DEPENDENCY: f64 = 0.7;
/// Strength of an edge's dependency on its source, and of neighbors on a removed node
pub const EDGE_DEPENDENCY: f64 = 0.9;

/// How far a ripple is expected to spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RippleSeverity {
    /// Local only
    Low,
    /// Neighbors affected
    Medium,
    /// Structure affected
    High,
}

/// What kind of change a ripple describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RippleKind {
    /// A data field is rewritten
    FieldChanged,
    /// An edge is inserted
    EdgeAdded,
    /// An edge is deleted
    EdgeRemoved,
    /// A node is inserted
    NodeAdded,
    /// A node and its edges are deleted
    NodeRemoved,
    /// The node is only inspected or touched up
    Inspected,
}

/// One expected consequence of a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RippleEffect {
    /// Node the ripple starts from
    pub node_id: String,
    /// Kind of change
    pub change_type: RippleKind,
    /// Spread
    pub severity: RippleSeverity,
    /// Human-readable description
    pub description: String,
}

/// How a dependent element relates to the change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    /// Has an edge into the changed node
    Upstream,
    /// Receives an edge from the changed node
    Downstream,
    /// Source of a new edge
    EdgeSource,
    /// Loses its connection when a node is removed
    Orphaned,
}

/// One entry of the dependency chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyLink {
    /// Dependent node id
    pub id: String,
    /// Its kind, when the node exists
    pub kind: Option<NodeKind>,
    /// Relationship to the change
    pub relationship: Relationship,
    /// 0-1
    pub strength: f64,
}

impl DependencyLink {
    /// Whether the link counts toward risk
    #[inline]
    #[must_use]
    pub fn is_strong(&self) -> bool {
        self.strength > STRONG_DEPENDENCY
    }
}

/// Likelihood that a repair collides with other edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPotential {
    /// Single element, low risk
    None,
    /// Small scope
    Low,
    /// Moderate scope
    Medium,
    /// Wide scope or high risk
    High,
}

/// Affected subgraph and derived risk metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactAnalysis {
    /// Touched nodes
    pub affected_nodes: BTreeSet<String>,
    /// Touched edges
    pub affected_edges: BTreeSet<String>,
    /// Expected consequences, one or more per step
    pub ripple_effects: Vec<RippleEffect>,
    /// Elements depending on the change, one entry per id
    pub dependency_chain: Vec<DependencyLink>,
    /// 0-100
    pub risk_score: u32,
    /// Affected nodes plus affected edges
    pub estimated_changes: usize,
    /// False when any step deletes elements
    pub reversible: bool,
    /// Conflict band
    pub conflict_potential: ConflictPotential,
}

impl ImpactAnalysis {
    /// Ripples of a given severity
    #[must_use]
    pub fn ripple_count(&self, severity: RippleSeverity) -> usize {
        self.ripple_effects
            .iter()
            .filter(|r| r.severity == severity)
            .count()
    }

    /// Links above [`STRONG_DEPENDENCY`]
    #[must_use]
    pub fn strong_dependencies(&self) -> usize {
        self.dependency_chain.iter().filter(|d| d.is_strong()).count()
    }
}

/// Risk formula
///
/// `min(nodes*5 + edges*3, 50) + high*15 + medium*8 + strong*5`, capped at 100.
/// Non-decreasing in every argument.
#[must_use]
pub fn risk_score(nodes: usize, edges: usize, high: usize, medium: usize, strong: usize) -> u32 {
    let scope = nodes
        .saturating_mul(5)
        .saturating_add(edges.saturating_mul(3))
        .min(50);
    let total = scope
        .saturating_add(high.saturating_mul(15))
        .saturating_add(medium.saturating_mul(8))
        .saturating_add(strong.saturating_mul(5))
        .min(100);
    u32::try_from(total).unwrap_or(100)
}

/// Conflict band for an affected-node count and risk score
#[must_use]
pub fn conflict_potential(affected: usize, risk: u32) -> ConflictPotential {
    if affected <= 1 && risk < 20 {
        ConflictPotential::None
    } else if affected <= 3 && risk < 40 {
        ConflictPotential::Low
    } else if affected <= 6 && risk < 60 {
        ConflictPotential::Medium
    } else {
        ConflictPotential::High
    }
}

/// Computes [`ImpactAnalysis`] for step lists
#[derive(Debug, Clone, Copy, Default)]
pub struct ImpactAnalyzer;

impl ImpactAnalyzer {
    /// Create analyzer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Analyze `steps` against `graph`
    ///
    /// `target_id` stands in for steps whose own target is blank.
    #[must_use]
    pub fn analyze(&self, target_id: &str, steps: &[RepairStep], graph: &Graph) -> ImpactAnalysis {
        let mut acc = Accumulator::default();

        for step in steps {
            let target = if step.has_blank_target() {
                target_id
            } else {
                step.target.as_str()
            };
            match step.action {
                action if action.is_field_mutation() => acc.field_mutation(action, target, graph),
                RepairAction::AddEdge => acc.add_edge(step, target, graph),
                RepairAction::RemoveEdge => acc.remove_edge(target, graph),
                RepairAction::RemoveNode => acc.remove_node(target, graph),
                RepairAction::AddNode => {
                    acc.touch(target, RippleKind::NodeAdded, "node is inserted");
                }
                _ => acc.touch(target, RippleKind::Inspected, "node is inspected"),
            }
        }

        let reversible = !steps.iter().any(|s| s.action.is_destructive());
        acc.finish(reversible)
    }
}

#[derive(Default)]
struct Accumulator {
    nodes: BTreeSet<String>,
    edges: BTreeSet<String>,
    ripples: Vec<RippleEffect>,
    chain: Vec<DependencyLink>,
}

impl Accumulator {
    fn ripple(
        &mut self,
        node_id: &str,
        change_type: RippleKind,
        severity: RippleSeverity,
        description: String,
    ) {
        self.ripples.push(RippleEffect {
            node_id: node_id.to_string(),
            change_type,
            severity,
            description,
        });
    }

    /// Record a dependency, keeping the strongest entry per id
    fn depend(&mut self, graph: &Graph, id: &str, relationship: Relationship, strength: f64) {
        if let Some(existing) = self.chain.iter_mut().find(|d| d.id == id) {
            if strength > existing.strength {
                existing.strength = strength;
                existing.relationship = relationship;
            }
            return;
        }
        self.chain.push(DependencyLink {
            id: id.to_string(),
            kind: graph.node(id).map(|n| n.kind),
            relationship,
            strength,
        });
    }

    fn field_mutation(&mut self, action: RepairAction, target: &str, graph: &Graph) {
        self.nodes.insert(target.to_string());
        for neighbor in graph.neighbors(target) {
            self.nodes.insert(neighbor.to_string());
            let upstream = graph.incoming(target).any(|e| e.source == neighbor);
            let relationship = if upstream {
                Relationship::Upstream
            } else {
                Relationship::Downstream
            };
            self.depend(graph, neighbor, relationship, FIELD_DEPENDENCY);
        }
        let field = action.field().unwrap_or("data");
        self.ripple(
            target,
            RippleKind::FieldChanged,
            RippleSeverity::Medium,
            format!("{action} rewrites '{field}' on '{target}'"),
        );
    }

    fn add_edge(&mut self, step: &RepairStep, edge_id: &str, graph: &Graph) {
        let source = step.param_str("source").unwrap_or_default();
        let target = step.param_str("target").unwrap_or_default();
        for end in [source, target] {
            if !end.is_empty() {
                self.nodes.insert(end.to_string());
            }
        }
        self.edges.insert(edge_id.to_string());
        if !source.is_empty() {
            self.depend(graph, source, Relationship::EdgeSource, EDGE_DEPENDENCY);
        }
        self.ripple(
            if source.is_empty() { edge_id } else { source },
            RippleKind::EdgeAdded,
            RippleSeverity::Medium,
            format!("edge '{edge_id}' connects '{source}' -> '{target}'"),
        );
    }

    fn remove_edge(&mut self, edge_id: &str, graph: &Graph) {
        self.edges.insert(edge_id.to_string());
        let origin = match graph.edge(edge_id) {
            Some(edge) => {
                self.nodes.insert(edge.source.clone());
                self.nodes.insert(edge.target.clone());
                edge.target.clone()
            }
            None => edge_id.to_string(),
        };
        self.ripple(
            &origin,
            RippleKind::EdgeRemoved,
            RippleSeverity::Low,
            format!("edge '{edge_id}' is removed"),
        );
    }

    fn remove_node(&mut self, node_id: &str, graph: &Graph) {
        self.nodes.insert(node_id.to_string());
        for edge in graph.edges.iter().filter(|e| e.touches(node_id)) {
            self.edges.insert(edge.id.clone());
        }
        for neighbor in graph.neighbors(node_id) {
            self.nodes.insert(neighbor.to_string());
            self.depend(graph, neighbor, Relationship::Orphaned, EDGE_DEPENDENCY);
        }
        self.ripple(
            node_id,
            RippleKind::NodeRemoved,
            RippleSeverity::High,
            format!("node '{node_id}' and its edges are removed"),
        );
    }

    fn touch(&mut self, target: &str, change_type: RippleKind, what: &str) {
        self.nodes.insert(target.to_string());
        self.ripple(
            target,
            change_type,
            RippleSeverity::Low,
            format!("'{target}': {what}"),
        );
    }

    fn finish(self, reversible: bool) -> ImpactAnalysis {
        let count = |s: RippleSeverity| self.ripples.iter().filter(|r| r.severity == s).count();
        let strong = self.chain.iter().filter(|d| d.is_strong()).count();
        let risk = risk_score(
            self.nodes.len(),
            self.edges.len(),
            count(RippleSeverity::High),
            count(RippleSeverity::Medium),
            strong,
        );
        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            ripples = self.ripples.len(),
            risk,
            reversible,
            "impact analyzed"
        );
        ImpactAnalysis {
            estimated_changes: self.nodes.len() + self.edges.len(),
            conflict_potential: conflict_potential(self.nodes.len(), risk),
            affected_nodes: self.nodes,
            affected_edges: self.edges,
            ripple_effects: self.ripples,
            dependency_chain: self.chain,
            risk_score: risk,
            reversible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontos_graph::Node;
    use proptest::prelude::*;

    fn line() -> Graph {
        Graph::new()
            .with_node(Node::begin("a", "e").with_property("n", 1))
            .with_node(Node::become_("b", "e"))
            .with_node(Node::cease("c", "e").with_condition("done"))
            .connect("a", "b")
            .connect("b", "c")
    }

    #[test]
    fn field_mutation_touches_neighbors() {
        let steps = [RepairStep::set(RepairAction::SetTransform, "b", "grow")];
        let impact = ImpactAnalyzer::new().analyze("b", &steps, &line());
        assert_eq!(impact.affected_nodes.len(), 3);
        assert!(impact.affected_edges.is_empty());
        assert_eq!(impact.ripple_count(RippleSeverity::Medium), 1);
        assert_eq!(impact.dependency_chain.len(), 2);
        assert_eq!(impact.dependency_chain[0].relationship, Relationship::Upstream);
        assert_eq!(impact.dependency_chain[1].relationship, Relationship::Downstream);
        assert_eq!(impact.strong_dependencies(), 0);
        // 3*5 + 8
        assert_eq!(impact.risk_score, 23);
        assert_eq!(impact.conflict_potential, ConflictPotential::Low);
        assert!(impact.reversible);
    }

    #[test]
    fn add_edge_depends_strongly_on_source() {
        let steps = [RepairStep::add_edge("a->c", "a", "c")];
        let impact = ImpactAnalyzer::new().analyze("a", &steps, &line());
        assert_eq!(impact.affected_nodes.len(), 2);
        assert_eq!(impact.affected_edges.len(), 1);
        assert_eq!(impact.strong_dependencies(), 1);
        // 2*5 + 1*3 + 8 + 5
        assert_eq!(impact.risk_score, 26);
        assert!(impact.reversible);
    }

    #[test]
    fn remove_edge_is_irreversible() {
        let steps = [RepairStep::new(RepairAction::RemoveEdge, "b->c")];
        let impact = ImpactAnalyzer::new().analyze("b", &steps, &line());
        assert!(!impact.reversible);
        assert_eq!(impact.ripple_count(RippleSeverity::Low), 1);
        assert_eq!(impact.risk_score, 13);
        assert_eq!(impact.estimated_changes, 3);
    }

    #[test]
    fn remove_node_is_high_severity() {
        let steps = [RepairStep::new(RepairAction::RemoveNode, "b")];
        let impact = ImpactAnalyzer::new().analyze("b", &steps, &line());
        assert_eq!(impact.ripple_count(RippleSeverity::High), 1);
        assert_eq!(impact.affected_edges.len(), 2);
        // 3*5 + 2*3 + 15 + 2*5
        assert_eq!(impact.risk_score, 46);
        assert_eq!(impact.conflict_potential, ConflictPotential::Medium);
        assert!(!impact.reversible);
    }

    #[test]
    fn generic_actions_touch_only_target() {
        let steps = [RepairStep::new(RepairAction::Validate, "")];
        let impact = ImpactAnalyzer::new().analyze("a", &steps, &line());
        assert_eq!(impact.affected_nodes.iter().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(impact.risk_score, 5);
        assert_eq!(impact.conflict_potential, ConflictPotential::None);
    }

    #[test]
    fn conflict_bands() {
        assert_eq!(conflict_potential(1, 19), ConflictPotential::None);
        assert_eq!(conflict_potential(1, 20), ConflictPotential::Low);
        assert_eq!(conflict_potential(3, 39), ConflictPotential::Low);
        assert_eq!(conflict_potential(4, 10), ConflictPotential::Medium);
        assert_eq!(conflict_potential(6, 59), ConflictPotential::Medium);
        assert_eq!(conflict_potential(7, 0), ConflictPotential::High);
        assert_eq!(conflict_potential(2, 60), ConflictPotential::High);
    }

    #[test]
    fn risk_is_capped() {
        assert_eq!(risk_score(100, 100, 0, 0, 0), 50);
        assert_eq!(risk_score(100, 100, 10, 10, 10), 100);
        assert_eq!(risk_score(usize::MAX, usize::MAX, usize::MAX, 0, 0), 100);
    }

    proptest! {
        #[test]
        fn prop_risk_monotone_in_each_input(
            base in proptest::array::uniform5(0usize..30),
            which in 0usize..5,
            bump in 1usize..10,
        ) {
            let mut bumped = base;
            bumped[which] += bump;
            let before = risk_score(base[0], base[1], base[2], base[3], base[4]);
            let after = risk_score(bumped[0], bumped[1], bumped[2], bumped[3], bumped[4]);
            prop_assert!(after >= before);
        }

        #[test]
        fn prop_more_steps_never_lower_risk(
            picks in proptest::collection::vec((0usize..6, 0usize..3), 1..8)
        ) {
            let graph = line();
            let ids = ["a", "b", "c"];
            let steps: Vec<RepairStep> = picks
                .iter()
                .map(|&(action, node)| match action {
                    0 => RepairStep::set(RepairAction::SetEntity, ids[node], "x"),
                    1 => RepairStep::add_edge(format!("new{node}"), ids[node], "c"),
                    2 => RepairStep::new(RepairAction::RemoveEdge, "a->b"),
                    3 => RepairStep::new(RepairAction::RemoveNode, ids[node]),
                    4 => RepairStep::new(RepairAction::Enhance, ids[node]),
                    _ => RepairStep::new(RepairAction::AddNode, format!("n{node}")),
                })
                .collect();
            let analyzer = ImpactAnalyzer::new();
            let mut previous = 0;
            for k in 1..=steps.len() {
                let risk = analyzer.analyze("a", &steps[..k], &graph).risk_score;
                prop_assert!(risk >= previous);
                previous = risk;
            }
        }
    }
}
