//! Error types for repair orchestration
//!
//! - Workflow sequencing failures ([`OrchestratorError`])
//! - Per-step apply failures ([`StepError`])

use crate::phase::Phase;
use crate::workflow::WorkflowId;

/// Sequencing error raised by the orchestrator
///
/// Fatal to the call that raised it; the workflow itself is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    /// No workflow with that id
    #[error("workflow not found: {0}")]
    WorkflowNotFound(WorkflowId),

    /// Transition not in the phase table
    #[error("illegal phase transition: {from} -> {to}")]
    IllegalTransition {
        /// Current phase
        from: Phase,
        /// Requested phase
        to: Phase,
    },

    /// Operation needs the workflow in a specific phase
    #[error("workflow {id} is in phase {actual}, expected {expected}")]
    WrongPhase {
        /// Workflow
        id: WorkflowId,
        /// Phase the operation needs
        expected: Phase,
        /// Phase the workflow is in
        actual: Phase,
    },

    /// Strength validation requested before impact analysis
    #[error("workflow {0} has no impact analysis")]
    MissingImpact(WorkflowId),

    /// Apply requested before strength validation
    #[error("workflow {0} has no strength validation")]
    MissingValidation(WorkflowId),

    /// Rollback requested without a stored snapshot
    #[error("workflow {0} has no snapshot")]
    MissingSnapshot(WorkflowId),

    /// Apply refused because the recommendation gate is enforced
    #[error(
        "proposal not approved for apply (strength {strength}, recommendation {recommendation})"
    )]
    ProposalRejected {
        /// Strength score of the proposal
        strength: u32,
        /// Recommendation that blocked it
        recommendation: String,
    },
}

impl OrchestratorError {
    /// Caller invoked operations out of order
    #[inline]
    #[must_use]
    pub fn is_sequencing(&self) -> bool {
        matches!(
            self,
            Self::IllegalTransition { .. }
                | Self::WrongPhase { .. }
                | Self::MissingImpact(_)
                | Self::MissingValidation(_)
                | Self::MissingSnapshot(_)
        )
    }

    /// Workflow id is unknown (possibly cleaned up)
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::WorkflowNotFound(_))
    }
}

/// Failure of one repair step during apply
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    /// Target node does not exist
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Target edge does not exist
    #[error("edge not found: {0}")]
    EdgeNotFound(String),

    /// Required parameter absent
    #[error("step {action} is missing parameter '{param}'")]
    MissingParam {
        /// Step action
        action: String,
        /// Parameter name
        param: String,
    },

    /// Parameter present but malformed
    #[error("invalid parameter '{param}': {reason}")]
    InvalidParam {
        /// Parameter name
        param: String,
        /// What is wrong with it
        reason: String,
    },

    /// Inserted element collides with an existing id
    #[error("id already exists: {0}")]
    DuplicateId(String),
}
