//! Repair steps and proposals
//!
//! A [`RepairStep`] is one intended mutation of a graph. Steps are data: the
//! analyzer and validator reason about them without executing anything, and
//! [`crate::apply_steps`] is the only place that turns them into a new graph.

use ontos_graph::NodeKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Kind of mutation a step performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairAction {
    /// Set `data.entity` (param `entity`)
    SetEntity,
    /// Replace `data.properties` (param `properties`, an object)
    SetProperties,
    /// Set `data.transform` (param `transform`)
    SetTransform,
    /// Set `data.condition` (param `condition`)
    SetCondition,
    /// Set `data.portal` (param `portal`)
    SetPortal,
    /// Set `data.strategy` (param `strategy`)
    SetStrategy,
    /// Insert a node with id `target` (params `kind`, optional `data`)
    AddNode,
    /// Insert an edge with id `target` (params `source`, `target`, optional `label`)
    AddEdge,
    /// Delete the edge with id `target`
    RemoveEdge,
    /// Delete the node with id `target` and its edges
    RemoveNode,
    /// Re-check the target without mutating it
    Validate,
    /// Cosmetic improvement (optional params `narrative`, `status`)
    Enhance,
}

impl RepairAction {
    /// Stable snake_case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RepairAction::SetEntity => "set_entity",
            RepairAction::SetProperties => "set_properties",
            RepairAction::SetTransform => "set_transform",
            RepairAction::SetCondition => "set_condition",
            RepairAction::SetPortal => "set_portal",
            RepairAction::SetStrategy => "set_strategy",
            RepairAction::AddNode => "add_node",
            RepairAction::AddEdge => "add_edge",
            RepairAction::RemoveEdge => "remove_edge",
            RepairAction::RemoveNode => "remove_node",
            RepairAction::Validate => "validate",
            RepairAction::Enhance => "enhance",
        }
    }

    /// Data field written by a field mutation
    #[must_use]
    pub const fn field(self) -> Option<&'static str> {
        match self {
            RepairAction::SetEntity => Some("entity"),
            RepairAction::SetProperties => Some("properties"),
            RepairAction::SetTransform => Some("transform"),
            RepairAction::SetCondition => Some("condition"),
            RepairAction::SetPortal => Some("portal"),
            RepairAction::SetStrategy => Some("strategy"),
            _ => None,
        }
    }

    /// Whether the step writes a node data field
    #[inline]
    #[must_use]
    pub const fn is_field_mutation(self) -> bool {
        self.field().is_some()
    }

    /// Whether the step deletes graph elements
    #[inline]
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        matches!(self, RepairAction::RemoveEdge | RepairAction::RemoveNode)
    }

    /// Node kind the target must have, for kind-bound fields
    #[must_use]
    pub const fn required_kind(self) -> Option<NodeKind> {
        match self {
            RepairAction::SetProperties => Some(NodeKind::Begin),
            RepairAction::SetTransform => Some(NodeKind::Become),
            RepairAction::SetCondition => Some(NodeKind::Cease),
            RepairAction::SetPortal => Some(NodeKind::Transcend),
            RepairAction::SetStrategy => Some(NodeKind::Resolve),
            _ => None,
        }
    }
}

impl Display for RepairAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutation of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairStep {
    /// What to do
    pub action: RepairAction,
    /// Node or edge id acted on
    pub target: String,
    /// Action parameters
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
    /// Assertions expected to hold before the step (advisory)
    #[serde(default)]
    pub preconditions: Vec<String>,
    /// Assertions expected to hold after the step (advisory)
    #[serde(default)]
    pub postconditions: Vec<String>,
}

impl RepairStep {
    /// Create step without params
    #[must_use]
    pub fn new(action: RepairAction, target: impl Into<String>) -> Self {
        Self {
            action,
            target: target.into(),
            params: BTreeMap::new(),
            preconditions: Vec::new(),
            postconditions: Vec::new(),
        }
    }

    /// Field mutation writing `value` into the action's field
    ///
    /// Actions without a field get the value under `value`.
    #[must_use]
    pub fn set(action: RepairAction, target: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = action.field().unwrap_or("value");
        Self::new(action, target).with_param(key, value)
    }

    /// Edge insertion
    #[must_use]
    pub fn add_edge(id: impl Into<String>, source: &str, target: &str) -> Self {
        Self::new(RepairAction::AddEdge, id)
            .with_param("source", source)
            .with_param("target", target)
    }

    /// Add a parameter
    #[inline]
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a precondition
    #[inline]
    #[must_use]
    pub fn with_precondition(mut self, assertion: impl Into<String>) -> Self {
        self.preconditions.push(assertion.into());
        self
    }

    /// Add a postcondition
    #[inline]
    #[must_use]
    pub fn with_postcondition(mut self, assertion: impl Into<String>) -> Self {
        self.postconditions.push(assertion.into());
        self
    }

    /// Target is empty or whitespace
    #[inline]
    #[must_use]
    pub fn has_blank_target(&self) -> bool {
        self.target.trim().is_empty()
    }

    /// Replace a blank target with `fallback`
    #[must_use]
    pub fn resolve_target(mut self, fallback: &str) -> Self {
        if self.has_blank_target() {
            self.target = fallback.to_string();
        }
        self
    }

    /// String parameter
    #[must_use]
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}

/// Proposal flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalKind {
    /// Forward fix
    Patch,
    /// Undo of an earlier change
    Rollback,
}

/// Candidate repair produced by an external proposer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairProposal {
    /// Proposal id
    pub id: String,
    /// Patch or rollback
    #[serde(rename = "type")]
    pub kind: ProposalKind,
    /// Ordered steps
    pub steps: Vec<RepairStep>,
    /// Why the steps fix the violation
    #[serde(default)]
    pub proof: String,
    /// Proposer confidence in [0, 1]
    pub confidence: f64,
    /// Proposer's cost estimate
    #[serde(default)]
    pub estimated_cost: f64,
}

impl RepairProposal {
    /// Create patch proposal; confidence is clamped to [0, 1]
    #[must_use]
    pub fn patch(id: impl Into<String>, steps: Vec<RepairStep>, confidence: f64) -> Self {
        Self {
            id: id.into(),
            kind: ProposalKind::Patch,
            steps,
            proof: String::new(),
            confidence: clamp_confidence(confidence),
            estimated_cost: 0.0,
        }
    }

    /// With proof text
    #[inline]
    #[must_use]
    pub fn with_proof(mut self, proof: impl Into<String>) -> Self {
        self.proof = proof.into();
        self
    }

    /// With cost estimate
    #[inline]
    #[must_use]
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.estimated_cost = cost;
        self
    }
}

/// Clamp to [0, 1], mapping NaN to 0
#[must_use]
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
