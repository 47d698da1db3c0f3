//! Phased fix orchestration
//!
//! The orchestrator owns every live [`FixWorkflow`] and drives it through
//! propose, analyze, validate, apply and verify. Each workflow sits behind its
//! own mutex, so operations on one id are serialized while different ids
//! proceed independently.
//!
//! The orchestrator never mutates graphs. Callers apply steps with
//! [`crate::apply_steps`] and report changes and verification back.

use crate::apply::AppliedChange;
use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::impact::{ImpactAnalysis, ImpactAnalyzer};
use crate::phase::{validate_transition, Phase};
use crate::snapshot::WorkflowSnapshot;
use crate::step::RepairStep;
use crate::strength::{Recommendation, StrengthResult, StrengthValidator};
use crate::workflow::{FixWorkflow, RiskLevel, Verification, VerificationStatus, WorkflowId};
use chrono::Utc;
use dashmap::DashMap;
use ontos_graph::{ChecksumError, Graph};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Workflow counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorStats {
    /// Workflows held
    pub total: usize,
    /// Workflows not yet in a terminal phase
    pub active: usize,
    /// Workflows per phase
    pub by_phase: BTreeMap<Phase, usize>,
    /// Audited changes across all workflows
    pub applied_changes: usize,
}

/// Drives fix workflows through their phases
#[derive(Debug, Default)]
pub struct FixOrchestrator {
    config: OrchestratorConfig,
    analyzer: ImpactAnalyzer,
    validator: StrengthValidator,
    workflows: DashMap<WorkflowId, Arc<Mutex<FixWorkflow>>>,
}

impl FixOrchestrator {
    /// Orchestrator with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Orchestrator with explicit configuration
    #[must_use]
    pub fn with_config(config: OrchestratorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Record a proposal; the workflow starts in propose
    ///
    /// Steps with a blank target are stored with `target_id` instead.
    pub fn create_workflow(
        &self,
        target_id: impl Into<String>,
        violation_type: impl Into<String>,
        steps: Vec<RepairStep>,
        confidence: f64,
    ) -> WorkflowId {
        let target_id: String = target_id.into();
        let steps = steps.into_iter().map(|s| s.resolve_target(&target_id)).collect();
        let workflow = FixWorkflow::new(target_id, violation_type, steps, confidence);
        let id = workflow.id;
        tracing::info!(
            workflow = %id,
            target = %workflow.target_id,
            violation = %workflow.violation_type,
            steps = workflow.steps.len(),
            "workflow created"
        );
        self.workflows.insert(id, Arc::new(Mutex::new(workflow)));
        id
    }

    /// Compute and store the impact of the proposal; propose -> analyze
    ///
    /// # Errors
    /// Unknown id, or the workflow is not in propose
    pub fn analyze_impact(
        &self,
        id: WorkflowId,
        graph: &Graph,
    ) -> Result<ImpactAnalysis, OrchestratorError> {
        self.with_workflow(id, |wf| {
            validate_transition(wf.phase, Phase::Analyze)?;
            let impact = self.analyzer.analyze(&wf.target_id, &wf.steps, graph);
            wf.risk_level = Some(RiskLevel::from_score(impact.risk_score));
            wf.impact = Some(impact.clone());
            wf.advance(Phase::Analyze)?;
            Ok(impact)
        })
    }

    /// Grade the proposal against its impact; analyze -> validate
    ///
    /// # Errors
    /// Unknown id, wrong phase, or no stored impact
    pub fn validate_strength(
        &self,
        id: WorkflowId,
        graph: &Graph,
    ) -> Result<StrengthResult, OrchestratorError> {
        self.with_workflow(id, |wf| {
            validate_transition(wf.phase, Phase::Validate)?;
            let impact = wf.impact.as_ref().ok_or(OrchestratorError::MissingImpact(id))?;
            let result = self
                .validator
                .validate(&wf.steps, impact, graph.node(&wf.target_id));
            if result.recommendation == Recommendation::Reject {
                tracing::warn!(workflow = %id, strength = result.strength, "proposal rejected");
            }
            wf.validation = Some(result.clone());
            wf.advance(Phase::Validate)?;
            Ok(result)
        })
    }

    /// Deep copy of `graph` with checksum
    ///
    /// # Errors
    /// Returns error if the graph cannot be serialized
    pub fn create_snapshot(&self, graph: &Graph) -> Result<WorkflowSnapshot, ChecksumError> {
        WorkflowSnapshot::capture(graph)
    }

    /// Store the pre-apply snapshot; validate -> apply
    ///
    /// With `enforce_recommendation` set, only proposals recommended for apply
    /// get through.
    ///
    /// # Errors
    /// Unknown id, wrong phase, no validation, or the gate refused
    pub fn begin_apply(
        &self,
        id: WorkflowId,
        snapshot: WorkflowSnapshot,
    ) -> Result<(), OrchestratorError> {
        let enforce = self.config.enforce_recommendation;
        self.with_workflow(id, |wf| {
            validate_transition(wf.phase, Phase::Apply)?;
            let validation = wf
                .validation
                .as_ref()
                .ok_or(OrchestratorError::MissingValidation(id))?;
            if enforce && validation.recommendation != Recommendation::Apply {
                return Err(OrchestratorError::ProposalRejected {
                    strength: validation.strength,
                    recommendation: validation.recommendation.to_string(),
                });
            }
            tracing::debug!(
                workflow = %id,
                snapshot = %snapshot.id,
                checksum = %snapshot.checksum,
                "snapshot stored"
            );
            wf.snapshot = Some(snapshot);
            wf.advance(Phase::Apply)
        })
    }

    /// Append one audited change
    ///
    /// # Errors
    /// Unknown id, or the workflow is not in apply
    pub fn record_change(
        &self,
        id: WorkflowId,
        change: AppliedChange,
    ) -> Result<(), OrchestratorError> {
        self.with_workflow(id, |wf| {
            if wf.phase != Phase::Apply {
                return Err(OrchestratorError::WrongPhase {
                    id,
                    expected: Phase::Apply,
                    actual: wf.phase,
                });
            }
            wf.applied_changes.push(change);
            Ok(())
        })
    }

    /// Finish a workflow from apply or verify
    ///
    /// Apply passes through verify. The workflow completes on success and
    /// fails otherwise, except that a partial outcome rolls back when
    /// `rollback_on_partial` is set. Returns the final phase.
    ///
    /// # Errors
    /// Unknown id, or the workflow is not in apply or verify
    pub fn complete(
        &self,
        id: WorkflowId,
        verification: Verification,
    ) -> Result<Phase, OrchestratorError> {
        let rollback_on_partial = self.config.rollback_on_partial;
        self.with_workflow(id, |wf| {
            let target = if verification.success {
                Phase::Complete
            } else if rollback_on_partial
                && verification.recommendation == VerificationStatus::Partial
                && wf.snapshot.is_some()
            {
                Phase::RolledBack
            } else {
                Phase::Failed
            };
            match wf.phase {
                Phase::Apply => {
                    wf.advance(Phase::Verify)?;
                }
                Phase::Verify => {}
                actual => {
                    return Err(OrchestratorError::IllegalTransition { from: actual, to: target });
                }
            }
            if !verification.success {
                wf.reason = Some(verification.message.clone());
            }
            tracing::info!(
                workflow = %id,
                applied = verification.applied_count,
                total = verification.total_steps,
                resolved = verification.resolved,
                "workflow verified"
            );
            wf.verification = Some(verification);
            wf.advance(target)?;
            Ok(target)
        })
    }

    /// Abandon an applied workflow; apply or verify -> rolled_back
    ///
    /// Returns the stored snapshot for the caller to restore.
    ///
    /// # Errors
    /// Unknown id, wrong phase, or no snapshot
    pub fn rollback(
        &self,
        id: WorkflowId,
        reason: impl Into<String>,
    ) -> Result<WorkflowSnapshot, OrchestratorError> {
        self.with_workflow(id, |wf| {
            validate_transition(wf.phase, Phase::RolledBack)?;
            let snapshot = wf.snapshot.clone().ok_or(OrchestratorError::MissingSnapshot(id))?;
            wf.reason = Some(reason.into());
            wf.advance(Phase::RolledBack)?;
            Ok(snapshot)
        })
    }

    /// Move any non-terminal workflow to failed
    ///
    /// # Errors
    /// Unknown id, or the workflow is already terminal
    pub fn fail(&self, id: WorkflowId, reason: impl Into<String>) -> Result<(), OrchestratorError> {
        self.with_workflow(id, |wf| {
            validate_transition(wf.phase, Phase::Failed)?;
            let reason = reason.into();
            tracing::warn!(workflow = %id, phase = %wf.phase, reason = %reason, "workflow failed");
            wf.reason = Some(reason);
            wf.advance(Phase::Failed)
        })
    }

    /// Drop workflows finished longer ago than the configured max age
    pub fn cleanup(&self) -> usize {
        self.cleanup_older_than(self.config.max_age())
    }

    /// Drop workflows finished at least `max_age` ago; returns how many
    pub fn cleanup_older_than(&self, max_age: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age));
        let Some(cutoff) = cutoff else {
            return 0;
        };
        let before = self.workflows.len();
        self.workflows.retain(|_, wf| !wf.lock().completed_by(cutoff));
        let removed = before.saturating_sub(self.workflows.len());
        if removed > 0 {
            tracing::debug!(removed, "workflows cleaned up");
        }
        removed
    }

    /// Copy of one workflow
    #[must_use]
    pub fn get(&self, id: WorkflowId) -> Option<FixWorkflow> {
        self.workflows.get(&id).map(|entry| entry.value().lock().clone())
    }

    /// Stored steps, with blank targets already resolved
    ///
    /// # Errors
    /// Unknown id
    pub fn steps(&self, id: WorkflowId) -> Result<Vec<RepairStep>, OrchestratorError> {
        self.with_workflow(id, |wf| Ok(wf.steps.clone()))
    }

    /// Copies of every workflow, oldest first
    #[must_use]
    pub fn list(&self) -> Vec<FixWorkflow> {
        let mut all: Vec<FixWorkflow> = self
            .workflows
            .iter()
            .map(|entry| entry.value().lock().clone())
            .collect();
        all.sort_by_key(|wf| wf.id);
        all
    }

    /// Phase counts
    #[must_use]
    pub fn stats(&self) -> OrchestratorStats {
        let mut stats = OrchestratorStats::default();
        for entry in &self.workflows {
            let wf = entry.value().lock();
            stats.total += 1;
            if !wf.is_terminal() {
                stats.active += 1;
            }
            *stats.by_phase.entry(wf.phase).or_default() += 1;
            stats.applied_changes += wf.applied_changes.len();
        }
        stats
    }

    /// Workflows held
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    /// No workflows held
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    /// Run `f` under the workflow's lock
    ///
    /// The map guard is released before the workflow lock is taken.
    fn with_workflow<T>(
        &self,
        id: WorkflowId,
        f: impl FnOnce(&mut FixWorkflow) -> Result<T, OrchestratorError>,
    ) -> Result<T, OrchestratorError> {
        let slot = self
            .workflows
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(OrchestratorError::WorkflowNotFound(id))?;
        let mut workflow = slot.lock();
        f(&mut *workflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply_steps;
    use crate::step::RepairAction;
    use ontos_graph::Node;
    use pretty_assertions::assert_eq;

    fn graph() -> Graph {
        Graph::new()
            .with_node(Node::begin("a", "e").with_property("n", 1))
            .with_node(Node::become_("b", "e"))
            .with_node(Node::cease("c", "e").with_condition("done"))
            .connect("a", "b")
            .connect("b", "c")
    }

    fn fix() -> Vec<RepairStep> {
        vec![RepairStep::set(RepairAction::SetTransform, "b", "grow")
            .with_postcondition("b has a transform")]
    }

    fn validated(orch: &FixOrchestrator, graph: &Graph, steps: Vec<RepairStep>) -> WorkflowId {
        let id = orch.create_workflow("b", "ontogenetic.become_transform", steps, 0.9);
        orch.analyze_impact(id, graph).unwrap();
        orch.validate_strength(id, graph).unwrap();
        id
    }

    #[test]
    fn full_lifecycle() {
        let orch = FixOrchestrator::new();
        let graph = graph();
        let id = orch.create_workflow("b", "ontogenetic.become_transform", fix(), 0.9);
        assert_eq!(orch.get(id).unwrap().phase, Phase::Propose);

        let impact = orch.analyze_impact(id, &graph).unwrap();
        assert_eq!(impact.risk_score, 23);
        assert_eq!(orch.get(id).unwrap().risk_level, Some(RiskLevel::Low));

        let strength = orch.validate_strength(id, &graph).unwrap();
        assert_eq!(strength.recommendation, Recommendation::Apply);

        orch.begin_apply(id, orch.create_snapshot(&graph).unwrap()).unwrap();
        let outcome = apply_steps(&graph, &fix());
        for change in outcome.changes.iter().cloned() {
            orch.record_change(id, change).unwrap();
        }

        let phase = orch.complete(id, Verification::assess(1, 1, true, Some(100))).unwrap();
        assert_eq!(phase, Phase::Complete);
        let wf = orch.get(id).unwrap();
        assert_eq!(wf.applied_changes.len(), 1);
        assert!(wf.completed_at.is_some());
        assert!(wf.verification.unwrap().success);
    }

    #[test]
    fn blank_target_is_resolved_for_apply() {
        let orch = FixOrchestrator::new();
        let graph = graph();
        let steps = vec![RepairStep::set(RepairAction::SetTransform, "", "grow")];
        let id = validated(&orch, &graph, steps);
        assert_eq!(orch.get(id).unwrap().validation.unwrap().recommendation, Recommendation::Apply);

        let stored = orch.steps(id).unwrap();
        assert_eq!(stored[0].target, "b");

        orch.begin_apply(id, orch.create_snapshot(&graph).unwrap()).unwrap();
        let outcome = apply_steps(&graph, &stored);
        assert!(outcome.is_complete());
        for change in outcome.changes.iter().cloned() {
            orch.record_change(id, change).unwrap();
        }
        let phase = orch.complete(id, Verification::assess(1, 1, true, Some(100))).unwrap();
        assert_eq!(phase, Phase::Complete);
        assert_eq!(
            outcome.graph.node("b").unwrap().data.transform.as_deref(),
            Some("grow")
        );
    }

    #[test]
    fn unknown_id_is_fatal() {
        let orch = FixOrchestrator::new();
        let err = orch.analyze_impact(WorkflowId::new(), &graph()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn out_of_order_calls_are_rejected() {
        let orch = FixOrchestrator::new();
        let graph = graph();
        let id = orch.create_workflow("b", "x", fix(), 0.5);

        assert!(orch.validate_strength(id, &graph).unwrap_err().is_sequencing());
        let snapshot = orch.create_snapshot(&graph).unwrap();
        assert!(orch.begin_apply(id, snapshot).unwrap_err().is_sequencing());
        assert!(orch
            .complete(id, Verification::assess(1, 1, true, None))
            .unwrap_err()
            .is_sequencing());

        orch.analyze_impact(id, &graph).unwrap();
        assert!(orch.analyze_impact(id, &graph).unwrap_err().is_sequencing());
        assert_eq!(orch.get(id).unwrap().phase, Phase::Analyze);
    }

    #[test]
    fn record_change_requires_apply() {
        let orch = FixOrchestrator::new();
        let graph = graph();
        let id = validated(&orch, &graph, fix());
        let change = apply_steps(&graph, &fix()).changes.remove(0);
        let err = orch.record_change(id, change).unwrap_err();
        assert!(matches!(err, OrchestratorError::WrongPhase { expected: Phase::Apply, .. }));
    }

    #[test]
    fn enforced_gate_blocks_review() {
        let config = OrchestratorConfig::new().with_enforce_recommendation(true);
        let orch = FixOrchestrator::with_config(config);
        let graph = graph();
        let steps = vec![
            RepairStep::new(RepairAction::RemoveEdge, "b->c").with_postcondition("gone"),
            RepairStep::new(RepairAction::RemoveNode, "b").with_postcondition("gone"),
        ];
        let id = validated(&orch, &graph, steps);
        let err = orch
            .begin_apply(id, orch.create_snapshot(&graph).unwrap())
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::ProposalRejected { strength: 67, .. }));
        assert_eq!(orch.get(id).unwrap().phase, Phase::Validate);
    }

    #[test]
    fn advisory_gate_lets_review_through() {
        let orch = FixOrchestrator::new();
        let graph = graph();
        let steps = vec![RepairStep::new(RepairAction::RemoveNode, "b")];
        let id = validated(&orch, &graph, steps);
        orch.begin_apply(id, orch.create_snapshot(&graph).unwrap()).unwrap();
        assert_eq!(orch.get(id).unwrap().phase, Phase::Apply);
    }

    #[test]
    fn unsuccessful_verification_fails() {
        let orch = FixOrchestrator::new();
        let graph = graph();
        let id = validated(&orch, &graph, fix());
        orch.begin_apply(id, orch.create_snapshot(&graph).unwrap()).unwrap();
        let phase = orch.complete(id, Verification::assess(0, 1, false, None)).unwrap();
        assert_eq!(phase, Phase::Failed);
        assert!(orch.get(id).unwrap().reason.is_some());
    }

    #[test]
    fn partial_rolls_back_when_configured() {
        let orch =
            FixOrchestrator::with_config(OrchestratorConfig::new().with_rollback_on_partial(true));
        let graph = graph();
        let id = validated(&orch, &graph, fix());
        orch.begin_apply(id, orch.create_snapshot(&graph).unwrap()).unwrap();
        let phase = orch.complete(id, Verification::assess(1, 2, false, None)).unwrap();
        assert_eq!(phase, Phase::RolledBack);
    }

    #[test]
    fn rollback_returns_snapshot() {
        let orch = FixOrchestrator::new();
        let graph = graph();
        let id = validated(&orch, &graph, fix());
        orch.begin_apply(id, orch.create_snapshot(&graph).unwrap()).unwrap();
        let snapshot = orch.rollback(id, "operator abort").unwrap();
        assert_eq!(snapshot.restore(), graph);
        let wf = orch.get(id).unwrap();
        assert_eq!(wf.phase, Phase::RolledBack);
        assert_eq!(wf.reason.as_deref(), Some("operator abort"));
        assert!(orch.rollback(id, "again").unwrap_err().is_sequencing());
    }

    #[test]
    fn fail_from_any_live_phase() {
        let orch = FixOrchestrator::new();
        let id = orch.create_workflow("b", "x", fix(), 0.5);
        orch.fail(id, "proposal withdrawn").unwrap();
        assert_eq!(orch.get(id).unwrap().phase, Phase::Failed);
        assert!(orch.fail(id, "twice").is_err());
    }

    #[test]
    fn cleanup_only_drops_finished() {
        let orch = FixOrchestrator::new();
        let live = orch.create_workflow("b", "x", fix(), 0.5);
        let done = orch.create_workflow("b", "x", fix(), 0.5);
        orch.fail(done, "done").unwrap();

        assert_eq!(orch.cleanup(), 0);
        assert_eq!(orch.cleanup_older_than(Duration::ZERO), 1);
        assert!(orch.get(done).is_none());
        assert!(orch.get(live).is_some());
    }

    #[test]
    fn stats_and_listing() {
        let orch = FixOrchestrator::new();
        let graph = graph();
        let first = orch.create_workflow("b", "x", fix(), 0.5);
        let second = orch.create_workflow("b", "x", fix(), 0.5);
        orch.analyze_impact(second, &graph).unwrap();
        orch.fail(first, "dropped").unwrap();

        let stats = orch.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.by_phase.get(&Phase::Analyze), Some(&1));
        assert_eq!(stats.by_phase.get(&Phase::Failed), Some(&1));

        let ids: Vec<WorkflowId> = orch.list().into_iter().map(|wf| wf.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids[0] <= ids[1]);
    }
}
