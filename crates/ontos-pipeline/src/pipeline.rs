//! Remediation pipeline
//!
//! Drives one violation through detect, propose, analyze, validate, apply and
//! verify. The proposal call is the only suspension point; everything after
//! it is synchronous. Graphs are threaded through by value, so repairs of one
//! graph happen strictly one after another.

use crate::config::{OntosConfig, PipelineConfig};
use crate::error::PipelineError;
use crate::source::ProposalSource;
use ontos_graph::Graph;
use ontos_laws::{ValidationEngine, ValidationReport, Violation};
use ontos_repair::{
    apply_steps, FixOrchestrator, OrchestratorError, Phase, Recommendation, RepairProposal,
    StrengthResult, Verification, WorkflowId,
};
use std::sync::Arc;
use std::time::Instant;

/// Result of remediating one violation
#[derive(Debug, Clone)]
pub struct RemediationOutcome {
    /// Workflow that carried the attempt
    pub workflow_id: WorkflowId,
    /// Phase the workflow ended in
    pub phase: Phase,
    /// Graph after the attempt; the input graph when nothing was applied
    pub graph: Graph,
    /// Present when steps were applied
    pub verification: Option<Verification>,
    /// Strength grading of the proposal
    pub strength: StrengthResult,
}

impl RemediationOutcome {
    /// Steps were applied and kept
    #[inline]
    #[must_use]
    pub fn applied(&self) -> bool {
        self.verification.is_some() && self.phase != Phase::RolledBack
    }
}

/// Result of repairing every blocking violation of a graph
#[derive(Debug, Clone)]
pub struct RepairRun {
    /// Final graph
    pub graph: Graph,
    /// Validation of the input graph
    pub initial: ValidationReport,
    /// Validation of the final graph
    pub report: ValidationReport,
    /// One entry per attempted violation, in order
    pub outcomes: Vec<RemediationOutcome>,
    /// Violations the proposal source could not serve, with the error text
    pub skipped: Vec<(Violation, String)>,
}

/// Async remediation driver
pub struct RemediationPipeline {
    source: Arc<dyn ProposalSource>,
    engine: ValidationEngine,
    orchestrator: FixOrchestrator,
    config: PipelineConfig,
}

impl std::fmt::Debug for RemediationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemediationPipeline")
            .field("engine", &self.engine)
            .field("orchestrator", &self.orchestrator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RemediationPipeline {
    /// Pipeline with default configuration
    #[must_use]
    pub fn new(source: Arc<dyn ProposalSource>) -> Self {
        Self::with_config(source, &OntosConfig::default())
    }

    /// Pipeline with explicit configuration
    #[must_use]
    pub fn with_config(source: Arc<dyn ProposalSource>, config: &OntosConfig) -> Self {
        Self {
            source,
            engine: ValidationEngine::with_config(&config.engine),
            orchestrator: FixOrchestrator::with_config(config.orchestrator),
            config: config.pipeline,
        }
    }

    /// Validation engine in use
    #[inline]
    #[must_use]
    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    /// Workflow store
    #[inline]
    #[must_use]
    pub fn orchestrator(&self) -> &FixOrchestrator {
        &self.orchestrator
    }

    /// Remediation policy
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Remediate one violation of `graph`
    ///
    /// Rejected proposals, and review-graded ones when `apply_on_review` is
    /// off, end in failed with the graph untouched.
    ///
    /// # Errors
    /// Proposal failure or timeout, snapshot failure, or a sequencing error
    pub async fn remediate(
        &self,
        graph: &Graph,
        violation: &Violation,
    ) -> Result<RemediationOutcome, PipelineError> {
        let started = Instant::now();
        let proposal = self.request_proposal(graph, violation).await?;
        let target = violation
            .target()
            .or_else(|| proposal.steps.first().map(|s| s.target.as_str()))
            .unwrap_or_default()
            .to_string();

        let id = self.orchestrator.create_workflow(
            target,
            violation.law_id.clone(),
            proposal.steps.clone(),
            proposal.confidence,
        );
        self.orchestrator.analyze_impact(id, graph)?;
        let strength = self.orchestrator.validate_strength(id, graph)?;

        let declined = match strength.recommendation {
            Recommendation::Reject => Some("proposal rejected"),
            Recommendation::Review if !self.config.apply_on_review => Some("proposal needs review"),
            _ => None,
        };
        if let Some(reason) = declined {
            return self.decline(id, graph, strength, reason);
        }

        let snapshot = self.orchestrator.create_snapshot(graph)?;
        match self.orchestrator.begin_apply(id, snapshot.clone()) {
            Ok(()) => {}
            Err(OrchestratorError::ProposalRejected { .. }) => {
                return self.decline(id, graph, strength, "recommendation gate refused apply");
            }
            Err(e) => return Err(e.into()),
        }

        let steps = self.orchestrator.steps(id)?;
        let outcome = apply_steps(graph, &steps);
        for change in outcome.changes.iter().cloned() {
            self.orchestrator.record_change(id, change)?;
        }
        let after = self.engine.validate(&outcome.graph);
        let verification = Verification::from_outcome(&outcome, &after, violation);
        let phase = self.orchestrator.complete(id, verification.clone())?;

        let graph = if phase == Phase::RolledBack {
            snapshot.restore()
        } else {
            outcome.graph
        };
        tracing::info!(
            workflow = %id,
            law = %violation.law_id,
            phase = %phase,
            score = after.score,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "remediation finished"
        );
        Ok(RemediationOutcome {
            workflow_id: id,
            phase,
            graph,
            verification: Some(verification),
            strength,
        })
    }

    /// Validate `graph` and remediate each blocking violation in order
    ///
    /// A violation that an earlier repair already cleared is skipped silently.
    /// Proposal failures are recorded in `skipped` and do not stop the run.
    ///
    /// # Errors
    /// Snapshot failure or a sequencing error
    pub async fn repair(&self, graph: Graph) -> Result<RepairRun, PipelineError> {
        let initial = self.engine.validate(&graph);
        let mut current = graph;
        let mut outcomes = Vec::new();
        let mut skipped = Vec::new();

        for violation in initial.blocking() {
            if !self.engine.validate(&current).contains_site(violation) {
                tracing::debug!(law = %violation.law_id, "violation already cleared");
                continue;
            }
            match self.remediate(&current, violation).await {
                Ok(outcome) => {
                    current = outcome.graph.clone();
                    outcomes.push(outcome);
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(law = %violation.law_id, error = %e, "violation skipped");
                    skipped.push((violation.clone(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        let report = self.engine.validate(&current);
        tracing::info!(
            before = initial.score,
            after = report.score,
            attempted = outcomes.len(),
            skipped = skipped.len(),
            "repair run finished"
        );
        Ok(RepairRun {
            graph: current,
            initial,
            report,
            outcomes,
            skipped,
        })
    }

    async fn request_proposal(
        &self,
        graph: &Graph,
        violation: &Violation,
    ) -> Result<RepairProposal, PipelineError> {
        let timeout = self.config.proposal_timeout();
        match tokio::time::timeout(timeout, self.source.propose(violation, graph)).await {
            Ok(Ok(proposal)) => {
                tracing::debug!(
                    proposal = %proposal.id,
                    steps = proposal.steps.len(),
                    "proposal received"
                );
                Ok(proposal)
            }
            Ok(Err(e)) => Err(PipelineError::ProposalFailed(e)),
            Err(_) => Err(PipelineError::ProposalTimeout {
                duration_secs: timeout.as_secs(),
            }),
        }
    }

    fn decline(
        &self,
        id: WorkflowId,
        graph: &Graph,
        strength: StrengthResult,
        reason: &str,
    ) -> Result<RemediationOutcome, PipelineError> {
        tracing::warn!(
            workflow = %id,
            strength = strength.strength,
            reason,
            "proposal not applied"
        );
        self.orchestrator.fail(id, reason)?;
        Ok(RemediationOutcome {
            workflow_id: id,
            phase: Phase::Failed,
            graph: graph.clone(),
            verification: None,
            strength,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockProposalSource;
    use ontos_repair::{OrchestratorConfig, RepairAction, RepairStep};
    use ontos_test_utils::{lifecycle_graph, missing_transform_graph, violation_of};

    fn transform_fix() -> RepairProposal {
        RepairProposal::patch(
            "p1",
            vec![RepairStep::set(RepairAction::SetTransform, "grow", "size + 1")
                .with_postcondition("set")],
            0.9,
        )
    }

    fn mock_returning(proposal: RepairProposal) -> Arc<dyn ProposalSource> {
        let mut mock = MockProposalSource::new();
        mock.expect_propose()
            .times(1)
            .returning(move |_, _| Ok(proposal.clone()));
        Arc::new(mock)
    }

    fn transform_violation(pipeline: &RemediationPipeline, graph: &Graph) -> Violation {
        let report = pipeline.engine().validate(graph);
        violation_of(&report, "ontogenetic.become_transform").unwrap().clone()
    }

    #[tokio::test]
    async fn applies_a_good_proposal() {
        let pipeline = RemediationPipeline::new(mock_returning(transform_fix()));
        let graph = missing_transform_graph();
        let violation = transform_violation(&pipeline, &graph);

        let outcome = pipeline.remediate(&graph, &violation).await.unwrap();
        assert_eq!(outcome.phase, Phase::Complete);
        assert!(outcome.applied());
        assert_eq!(outcome.graph, lifecycle_graph());
        assert_eq!(outcome.verification.unwrap().post_score, Some(100));
    }

    #[tokio::test]
    async fn rejected_proposal_leaves_graph_alone() {
        let bad = RepairProposal::patch(
            "p2",
            vec![RepairStep::set(RepairAction::SetCondition, "grow", "never")],
            0.2,
        );
        let pipeline = RemediationPipeline::new(mock_returning(bad));
        let graph = missing_transform_graph();
        let violation = transform_violation(&pipeline, &graph);

        let outcome = pipeline.remediate(&graph, &violation).await.unwrap();
        assert_eq!(outcome.phase, Phase::Failed);
        assert_eq!(outcome.strength.recommendation, Recommendation::Reject);
        assert!(!outcome.applied());
        assert_eq!(outcome.graph, graph);
        assert_eq!(pipeline.orchestrator().get(outcome.workflow_id).unwrap().phase, Phase::Failed);
    }

    #[tokio::test]
    async fn review_respects_policy() {
        let risky = RepairProposal::patch(
            "p3",
            vec![RepairStep::new(RepairAction::RemoveNode, "grow")],
            0.5,
        );
        let config = OntosConfig {
            pipeline: PipelineConfig::new().with_apply_on_review(false),
            ..OntosConfig::default()
        };
        let pipeline = RemediationPipeline::with_config(mock_returning(risky), &config);
        let graph = missing_transform_graph();
        let violation = transform_violation(&pipeline, &graph);

        let outcome = pipeline.remediate(&graph, &violation).await.unwrap();
        assert_eq!(outcome.strength.recommendation, Recommendation::Review);
        assert_eq!(outcome.phase, Phase::Failed);
        assert_eq!(outcome.graph, graph);
    }

    #[tokio::test]
    async fn enforced_gate_declines_review() {
        let risky = RepairProposal::patch(
            "p4",
            vec![RepairStep::new(RepairAction::RemoveNode, "grow")],
            0.5,
        );
        let config = OntosConfig {
            orchestrator: OrchestratorConfig::new().with_enforce_recommendation(true),
            ..OntosConfig::default()
        };
        let pipeline = RemediationPipeline::with_config(mock_returning(risky), &config);
        let graph = missing_transform_graph();
        let violation = transform_violation(&pipeline, &graph);

        let outcome = pipeline.remediate(&graph, &violation).await.unwrap();
        assert_eq!(outcome.phase, Phase::Failed);
        assert_eq!(outcome.graph, graph);
    }

    #[tokio::test]
    async fn source_errors_surface() {
        let mut mock = MockProposalSource::new();
        mock.expect_propose()
            .returning(|_, _| Err(anyhow::anyhow!("model offline")));
        let pipeline = RemediationPipeline::new(Arc::new(mock));
        let graph = missing_transform_graph();
        let violation = transform_violation(&pipeline, &graph);

        let err = pipeline.remediate(&graph, &violation).await.unwrap_err();
        assert!(matches!(err, PipelineError::ProposalFailed(_)));
        assert!(pipeline.orchestrator().is_empty());
    }
}
