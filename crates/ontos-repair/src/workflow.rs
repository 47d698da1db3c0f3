//! Fix workflow record
//!
//! A [`FixWorkflow`] accumulates everything one remediation attempt produces:
//! impact, strength, snapshot, applied changes and the final verification.

use crate::apply::{AppliedChange, ApplyOutcome};
use crate::error::OrchestratorError;
use crate::impact::ImpactAnalysis;
use crate::phase::{validate_transition, Phase};
use crate::snapshot::WorkflowSnapshot;
use crate::step::{clamp_confidence, RepairStep};
use crate::strength::StrengthResult;
use chrono::{DateTime, Utc};
use ontos_laws::{ValidationReport, Violation};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique workflow identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkflowId(pub Ulid);

impl WorkflowId {
    /// Generate new workflow ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse risk band derived from the impact risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Below 30
    Low,
    /// 30 to 60
    Medium,
    /// Above 60
    High,
}

impl RiskLevel {
    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Band for a 0-100 risk score
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=29 => RiskLevel::Low,
            30..=60 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

/// Outcome category of a verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// All steps applied and the violation is gone
    Success,
    /// Some steps applied, or the violation persists
    Partial,
    /// Nothing applied
    Failed,
}

/// Post-apply assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    /// Status is success
    pub success: bool,
    /// Steps that applied
    pub applied_count: usize,
    /// Steps attempted
    pub total_steps: usize,
    /// `applied_count / total_steps`, 0 without steps
    pub quality_score: f64,
    /// Outcome category
    pub recommendation: VerificationStatus,
    /// Targeted violation no longer occurs
    pub resolved: bool,
    /// Validation score after apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_score: Option<u32>,
    /// Summary
    pub message: String,
}

impl Verification {
    /// Grade an apply from raw counts
    #[must_use]
    pub fn assess(applied: usize, total: usize, resolved: bool, post_score: Option<u32>) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let quality_score = if total == 0 {
            0.0
        } else {
            applied as f64 / total as f64
        };
        let recommendation = if applied == 0 {
            VerificationStatus::Failed
        } else if applied == total && resolved {
            VerificationStatus::Success
        } else {
            VerificationStatus::Partial
        };
        let message = match recommendation {
            VerificationStatus::Success => {
                format!("applied {applied}/{total} steps; violation resolved")
            }
            VerificationStatus::Partial if resolved => format!("applied {applied}/{total} steps"),
            VerificationStatus::Partial => {
                format!("applied {applied}/{total} steps; violation persists")
            }
            VerificationStatus::Failed => format!("no steps applied out of {total}"),
        };
        Self {
            success: recommendation == VerificationStatus::Success,
            applied_count: applied,
            total_steps: total,
            quality_score,
            recommendation,
            resolved,
            post_score,
            message,
        }
    }

    /// Grade an apply outcome against a re-validation of its graph
    #[must_use]
    pub fn from_outcome(
        outcome: &ApplyOutcome,
        after: &ValidationReport,
        violation: &Violation,
    ) -> Self {
        Self::assess(
            outcome.applied_steps,
            outcome.total_steps(),
            !after.contains_site(violation),
            Some(after.score),
        )
    }
}

/// One remediation attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixWorkflow {
    /// Workflow id
    pub id: WorkflowId,
    /// Current phase
    pub phase: Phase,
    /// Node or edge the repair targets
    pub target_id: String,
    /// Law id of the violation being repaired
    pub violation_type: String,
    /// Proposed steps
    pub steps: Vec<RepairStep>,
    /// Proposer confidence in [0, 1]
    pub confidence: f64,
    /// Set by impact analysis
    #[serde(default)]
    pub impact: Option<ImpactAnalysis>,
    /// Set by impact analysis
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    /// Set by strength validation
    #[serde(default)]
    pub validation: Option<StrengthResult>,
    /// Set on entering apply
    #[serde(default)]
    pub snapshot: Option<WorkflowSnapshot>,
    /// Audit log
    #[serde(default)]
    pub applied_changes: Vec<AppliedChange>,
    /// Set on completion
    #[serde(default)]
    pub verification: Option<Verification>,
    /// Why the workflow failed or was rolled back
    #[serde(default)]
    pub reason: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Set on entering a terminal phase
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl FixWorkflow {
    /// Create workflow in the propose phase
    #[must_use]
    pub fn new(
        target_id: impl Into<String>,
        violation_type: impl Into<String>,
        steps: Vec<RepairStep>,
        confidence: f64,
    ) -> Self {
        Self {
            id: WorkflowId::new(),
            phase: Phase::Propose,
            target_id: target_id.into(),
            violation_type: violation_type.into(),
            steps,
            confidence: clamp_confidence(confidence),
            impact: None,
            risk_level: None,
            validation: None,
            snapshot: None,
            applied_changes: Vec::new(),
            verification: None,
            reason: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Move to `to` if the phase table allows it
    ///
    /// # Errors
    /// Returns `IllegalTransition` and leaves the workflow untouched otherwise
    pub fn advance(&mut self, to: Phase) -> Result<(), OrchestratorError> {
        validate_transition(self.phase, to)?;
        tracing::info!(workflow = %self.id, from = %self.phase, to = %to, "phase transition");
        self.phase = to;
        if to.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// In complete, failed or rolled_back
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Finished at or before `cutoff`
    #[inline]
    #[must_use]
    pub fn completed_by(&self, cutoff: DateTime<Utc>) -> bool {
        self.completed_at.is_some_and(|at| at <= cutoff)
    }
}
