//! Version-style step application
//!
//! [`apply_steps`] works on a clone of the input graph and returns the new
//! graph together with an audit log. A failing step is recorded and skipped;
//! later steps still run against the partially repaired copy.

use crate::error::StepError;
use crate::step::{RepairAction, RepairStep};
use chrono::{DateTime, Utc};
use ontos_graph::{Edge, Graph, Node, NodeData, NodeKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Kind of recorded change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Field rewritten
    Update,
    /// Element inserted
    Insert,
    /// Element deleted
    Delete,
}

/// One audited mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedChange {
    /// Index of the step that produced it
    pub step_index: usize,
    /// Step action
    pub action: RepairAction,
    /// Update, insert or delete
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    /// Node or edge id
    #[serde(rename = "targetId")]
    pub target: String,
    /// Field name for updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Value before the change
    pub before: Value,
    /// Value after the change
    pub after: Value,
    /// When the change was made
    pub timestamp: DateTime<Utc>,
}

/// A step that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFailure {
    /// Index into the step list
    pub step_index: usize,
    /// Step action
    pub action: RepairAction,
    /// Step target
    pub target: String,
    /// Rendered error
    pub error: String,
}

/// Result of applying a step list
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    /// Repaired copy
    pub graph: Graph,
    /// Audit log in application order
    pub changes: Vec<AppliedChange>,
    /// Steps that succeeded
    pub applied_steps: usize,
    /// Steps that failed
    pub failures: Vec<StepFailure>,
}

impl ApplyOutcome {
    /// Every step succeeded
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of steps attempted
    #[inline]
    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.applied_steps + self.failures.len()
    }
}

/// Apply `steps` to a copy of `graph`
///
/// The input graph is never modified.
#[must_use]
pub fn apply_steps(graph: &Graph, steps: &[RepairStep]) -> ApplyOutcome {
    let mut working = graph.clone();
    let mut changes = Vec::new();
    let mut failures = Vec::new();
    let mut applied_steps = 0;

    for (index, step) in steps.iter().enumerate() {
        match apply_step(&mut working, index, step) {
            Ok(mut recorded) => {
                applied_steps += 1;
                changes.append(&mut recorded);
            }
            Err(e) => {
                tracing::warn!(
                    step = index,
                    action = %step.action,
                    target = %step.target,
                    error = %e,
                    "step failed"
                );
                failures.push(StepFailure {
                    step_index: index,
                    action: step.action,
                    target: step.target.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        applied = applied_steps,
        failed = failures.len(),
        changes = changes.len(),
        "steps applied"
    );

    ApplyOutcome {
        graph: working,
        changes,
        applied_steps,
        failures,
    }
}

/// Apply one step in place; on error the graph is unchanged
fn apply_step(
    graph: &mut Graph,
    index: usize,
    step: &RepairStep,
) -> Result<Vec<AppliedChange>, StepError> {
    let record = |change_type, target: &str, field: Option<&str>, before, after| AppliedChange {
        step_index: index,
        action: step.action,
        change_type,
        target: target.to_string(),
        field: field.map(str::to_string),
        before,
        after,
        timestamp: Utc::now(),
    };

    match step.action {
        action @ (RepairAction::SetEntity
        | RepairAction::SetProperties
        | RepairAction::SetTransform
        | RepairAction::SetCondition
        | RepairAction::SetPortal
        | RepairAction::SetStrategy) => {
            let field = action.field().unwrap_or("value");
            let value = required_param(step, field)?;
            let node = graph
                .node_mut(&step.target)
                .ok_or_else(|| StepError::NodeNotFound(step.target.clone()))?;
            let before = node.data.field(field);
            write_field(&mut node.data, field, value)?;
            let after = node.data.field(field);
            Ok(vec![record(ChangeType::Update, &step.target, Some(field), before, after)])
        }

        RepairAction::AddNode => {
            if graph.contains_node(&step.target) {
                return Err(StepError::DuplicateId(step.target.clone()));
            }
            let kind: NodeKind = param_str(step, "kind")?
                .parse()
                .map_err(|e: ontos_graph::UnknownNodeKind| invalid("kind", e))?;
            let data: NodeData = match step.params.get("data") {
                Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| invalid("data", e))?,
                None => NodeData::default(),
            };
            let node = Node {
                id: step.target.clone(),
                kind,
                data,
            };
            let after = serde_json::to_value(&node).map_err(|e| invalid("data", e))?;
            graph.nodes.push(node);
            Ok(vec![record(ChangeType::Insert, &step.target, None, Value::Null, after)])
        }

        RepairAction::AddEdge => {
            if graph.edge(&step.target).is_some() {
                return Err(StepError::DuplicateId(step.target.clone()));
            }
            let source = param_str(step, "source")?;
            let target = param_str(step, "target")?;
            for end in [source, target] {
                if !graph.contains_node(end) {
                    return Err(StepError::NodeNotFound(end.to_string()));
                }
            }
            let mut edge = Edge::new(step.target.clone(), source, target);
            if let Some(label) = step.param_str("label") {
                edge = edge.with_label(label);
            }
            let after = serde_json::to_value(&edge).map_err(|e| invalid("label", e))?;
            graph.edges.push(edge);
            Ok(vec![record(ChangeType::Insert, &step.target, None, Value::Null, after)])
        }

        RepairAction::RemoveEdge => {
            let edge = graph
                .remove_edge(&step.target)
                .ok_or_else(|| StepError::EdgeNotFound(step.target.clone()))?;
            let before = serde_json::to_value(&edge).unwrap_or(Value::Null);
            Ok(vec![record(ChangeType::Delete, &step.target, None, before, Value::Null)])
        }

        RepairAction::RemoveNode => {
            let (node, edges) = graph
                .remove_node(&step.target)
                .ok_or_else(|| StepError::NodeNotFound(step.target.clone()))?;
            let mut changes = Vec::with_capacity(edges.len() + 1);
            changes.push(record(
                ChangeType::Delete,
                &step.target,
                None,
                serde_json::to_value(&node).unwrap_or(Value::Null),
                Value::Null,
            ));
            for edge in &edges {
                changes.push(record(
                    ChangeType::Delete,
                    &edge.id,
                    None,
                    serde_json::to_value(edge).unwrap_or(Value::Null),
                    Value::Null,
                ));
            }
            Ok(changes)
        }

        RepairAction::Validate => {
            if graph.contains_node(&step.target) || graph.edge(&step.target).is_some() {
                Ok(Vec::new())
            } else {
                Err(StepError::NodeNotFound(step.target.clone()))
            }
        }

        RepairAction::Enhance => {
            let node = graph
                .node_mut(&step.target)
                .ok_or_else(|| StepError::NodeNotFound(step.target.clone()))?;
            let mut staged = node.data.clone();
            let mut changes = Vec::new();
            for field in ["narrative", "status"] {
                if let Some(value) = step.params.get(field) {
                    let before = staged.field(field);
                    write_field(&mut staged, field, value)?;
                    let after = staged.field(field);
                    let target = step.target.as_str();
                    changes.push(record(ChangeType::Update, target, Some(field), before, after));
                }
            }
            node.data = staged;
            Ok(changes)
        }
    }
}

fn invalid(param: &str, reason: impl ToString) -> StepError {
    StepError::InvalidParam {
        param: param.to_string(),
        reason: reason.to_string(),
    }
}

fn required_param<'s>(step: &'s RepairStep, key: &str) -> Result<&'s Value, StepError> {
    step.params.get(key).ok_or_else(|| StepError::MissingParam {
        action: step.action.to_string(),
        param: key.to_string(),
    })
}

fn param_str<'s>(step: &'s RepairStep, key: &str) -> Result<&'s str, StepError> {
    required_param(step, key)?
        .as_str()
        .ok_or_else(|| invalid(key, "expected a string"))
}

/// Write one field; validates the value shape before touching `data`
fn write_field(data: &mut NodeData, field: &str, value: &Value) -> Result<(), StepError> {
    if field == "properties" {
        let Value::Object(map) = value else {
            return Err(invalid(field, "expected an object"));
        };
        data.properties = map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<BTreeMap<_, _>>();
        return Ok(());
    }

    let text = match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        _ => return Err(invalid(field, "expected a string")),
    };
    let slot = match field {
        "entity" => &mut data.entity,
        "transform" => &mut data.transform,
        "condition" => &mut data.condition,
        "portal" => &mut data.portal,
        "strategy" => &mut data.strategy,
        "narrative" => &mut data.narrative,
        "status" => &mut data.status,
        other => {
            data.extra.insert(other.to_string(), value.clone());
            return Ok(());
        }
    };
    *slot = text;
    Ok(())
}
