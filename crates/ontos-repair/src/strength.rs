//! Proposal strength scoring
//!
//! Nine checks in four categories grade a step list against its impact
//! analysis. The share of passing checks is the strength; failed checks with
//! error severity force a reject.

use crate::impact::{ConflictPotential, ImpactAnalysis};
use crate::step::RepairStep;
use ontos_graph::Node;
use ontos_laws::Severity;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Risk above which the proposal is rejected
pub const RISK_ERROR_THRESHOLD: u32 = 70;
/// Risk at or above which the proposal draws a warning
pub const RISK_WARNING_THRESHOLD: u32 = 40;
/// Largest affected-node count considered bounded
pub const MAX_BOUNDED_SCOPE: usize = 5;

/// Grouping of strength checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckCategory {
    /// Steps fit the target
    Correctness,
    /// Steps are fully described
    Completeness,
    /// Risk is acceptable
    Safety,
    /// Steps can be undone
    Reversibility,
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthCheck {
    /// Check name
    pub name: String,
    /// Category
    pub category: CheckCategory,
    /// Whether it passed
    pub passed: bool,
    /// Weight of a failure; `Info` for passing or informational checks
    pub severity: Severity,
    /// 0-100 quality of this aspect
    pub score: u32,
    /// Explanation
    pub message: String,
}

impl StrengthCheck {
    fn pass(name: &str, category: CheckCategory, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            category,
            passed: true,
            severity: Severity::Info,
            score: 100,
            message: message.into(),
        }
    }

    fn fail(
        name: &str,
        category: CheckCategory,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            category,
            passed: false,
            severity,
            score: 0,
            message: message.into(),
        }
    }

    fn with_score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }

    /// Failed with error severity
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        !self.passed && self.severity.is_blocking()
    }

    /// Failed with warning severity
    #[inline]
    #[must_use]
    pub fn is_warning(&self) -> bool {
        !self.passed && self.severity == Severity::Warning
    }
}

/// What to do with a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    /// Safe to apply
    Apply,
    /// Needs a closer look
    Review,
    /// Do not apply
    Reject,
}

impl Recommendation {
    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Recommendation::Apply => "apply",
            Recommendation::Review => "review",
            Recommendation::Reject => "reject",
        }
    }
}

impl Display for Recommendation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graded proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthResult {
    /// Recommendation is not reject
    pub passed: bool,
    /// Percentage of passing checks
    pub strength: u32,
    /// Every check, in evaluation order
    pub checks: Vec<StrengthCheck>,
    /// `name: message` of each failed warning check
    #[serde(default)]
    pub warnings: Vec<String>,
    /// `name: message` of each failed error check
    #[serde(default)]
    pub errors: Vec<String>,
    /// Verdict
    pub recommendation: Recommendation,
}

impl StrengthResult {
    /// Check by name
    #[must_use]
    pub fn check(&self, name: &str) -> Option<&StrengthCheck> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// Grades step lists
#[derive(Debug, Clone, Copy, Default)]
pub struct StrengthValidator;

impl StrengthValidator {
    /// Create validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run every check and derive the recommendation
    #[must_use]
    pub fn validate(
        &self,
        steps: &[RepairStep],
        impact: &ImpactAnalysis,
        target: Option<&Node>,
    ) -> StrengthResult {
        let checks = vec![
            action_compatibility(steps, target),
            preconditions_declared(steps),
            steps_present(steps),
            bounded_scope(impact),
            postconditions_declared(steps),
            risk_threshold(impact),
            conflict_potential(impact),
            non_destructive(steps),
            reversible(impact),
        ];

        let passed = checks.iter().filter(|c| c.passed).count();
        let strength = percentage(passed, checks.len());
        let errors = summarize(&checks, StrengthCheck::is_error);
        let warnings = summarize(&checks, StrengthCheck::is_warning);
        let recommendation = recommend(strength, errors.len(), warnings.len());

        tracing::debug!(
            strength,
            errors = errors.len(),
            warnings = warnings.len(),
            recommendation = %recommendation,
            "proposal graded"
        );

        StrengthResult {
            passed: recommendation != Recommendation::Reject,
            strength,
            checks,
            warnings,
            errors,
            recommendation,
        }
    }
}

fn summarize(checks: &[StrengthCheck], keep: fn(&StrengthCheck) -> bool) -> Vec<String> {
    checks
        .iter()
        .filter(|c| keep(c))
        .map(|c| format!("{}: {}", c.name, c.message))
        .collect()
}

/// Reject on any error or strength below 50; review below 75 or with more
/// than two warnings
#[must_use]
pub fn recommend(strength: u32, errors: usize, warnings: usize) -> Recommendation {
    if errors > 0 || strength < 50 {
        Recommendation::Reject
    } else if strength < 75 || warnings > 2 {
        Recommendation::Review
    } else {
        Recommendation::Apply
    }
}

/// `round(100 * part / whole)`, 0 for an empty whole
fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let rounded = (200 * part + whole) / (2 * whole);
    u32::try_from(rounded).unwrap_or(100)
}

fn action_compatibility(steps: &[RepairStep], target: Option<&Node>) -> StrengthCheck {
    const NAME: &str = "action_compatibility";
    let Some(node) = target else {
        return StrengthCheck::pass(
            NAME,
            CheckCategory::Correctness,
            "no target node to check against",
        );
    };
    let mismatch = steps
        .iter()
        .filter(|s| s.target == node.id || s.has_blank_target())
        .find_map(|s| {
            s.action
                .required_kind()
                .filter(|kind| *kind != node.kind)
                .map(|kind| (s.action, kind))
        });
    match mismatch {
        Some((action, kind)) => StrengthCheck::fail(
            NAME,
            CheckCategory::Correctness,
            Severity::Error,
            format!("{action} requires a {kind} node but '{}' is {}", node.id, node.kind),
        ),
        None => StrengthCheck::pass(
            NAME,
            CheckCategory::Correctness,
            format!("actions fit {} node '{}'", node.kind, node.id),
        ),
    }
}

fn preconditions_declared(steps: &[RepairStep]) -> StrengthCheck {
    const NAME: &str = "preconditions_declared";
    let declared = steps.iter().filter(|s| !s.preconditions.is_empty()).count();
    if declared == steps.len() {
        StrengthCheck::pass(NAME, CheckCategory::Correctness, "every step declares preconditions")
    } else {
        StrengthCheck::pass(
            NAME,
            CheckCategory::Correctness,
            format!("{declared}/{} steps declare preconditions", steps.len()),
        )
        .with_score(70)
    }
}

fn steps_present(steps: &[RepairStep]) -> StrengthCheck {
    const NAME: &str = "steps_present";
    if steps.is_empty() {
        StrengthCheck::fail(
            NAME,
            CheckCategory::Completeness,
            Severity::Error,
            "proposal has no steps",
        )
    } else {
        StrengthCheck::pass(NAME, CheckCategory::Completeness, format!("{} step(s)", steps.len()))
    }
}

fn bounded_scope(impact: &ImpactAnalysis) -> StrengthCheck {
    const NAME: &str = "bounded_scope";
    let affected = impact.affected_nodes.len();
    if affected <= MAX_BOUNDED_SCOPE {
        StrengthCheck::pass(
            NAME,
            CheckCategory::Completeness,
            format!("{affected} node(s) affected"),
        )
    } else {
        StrengthCheck::fail(
            NAME,
            CheckCategory::Completeness,
            Severity::Warning,
            format!("{affected} nodes affected (limit {MAX_BOUNDED_SCOPE})"),
        )
    }
}

fn postconditions_declared(steps: &[RepairStep]) -> StrengthCheck {
    const NAME: &str = "postconditions_declared";
    if steps.iter().all(|s| !s.postconditions.is_empty()) {
        StrengthCheck::pass(NAME, CheckCategory::Completeness, "every step declares postconditions")
    } else {
        StrengthCheck::fail(
            NAME,
            CheckCategory::Completeness,
            Severity::Warning,
            "some steps declare no postconditions",
        )
    }
}

fn risk_threshold(impact: &ImpactAnalysis) -> StrengthCheck {
    const NAME: &str = "risk_threshold";
    let risk = impact.risk_score;
    let check = if risk > RISK_ERROR_THRESHOLD {
        StrengthCheck::fail(
            NAME,
            CheckCategory::Safety,
            Severity::Error,
            format!("risk {risk} exceeds {RISK_ERROR_THRESHOLD}"),
        )
    } else if risk >= RISK_WARNING_THRESHOLD {
        StrengthCheck::fail(
            NAME,
            CheckCategory::Safety,
            Severity::Warning,
            format!("risk {risk} is elevated"),
        )
    } else {
        StrengthCheck::pass(NAME, CheckCategory::Safety, format!("risk {risk}"))
    };
    check.with_score(100 - risk.min(100))
}

fn conflict_potential(impact: &ImpactAnalysis) -> StrengthCheck {
    const NAME: &str = "conflict_potential";
    if impact.conflict_potential == ConflictPotential::High {
        StrengthCheck::fail(
            NAME,
            CheckCategory::Safety,
            Severity::Warning,
            "high conflict potential",
        )
    } else {
        StrengthCheck::pass(
            NAME,
            CheckCategory::Safety,
            format!("{:?} conflict potential", impact.conflict_potential).to_lowercase(),
        )
    }
}

fn non_destructive(steps: &[RepairStep]) -> StrengthCheck {
    const NAME: &str = "non_destructive";
    let removals = steps.iter().filter(|s| s.action.is_destructive()).count();
    if removals == 0 {
        StrengthCheck::pass(NAME, CheckCategory::Safety, "no elements removed")
    } else {
        StrengthCheck::fail(
            NAME,
            CheckCategory::Safety,
            Severity::Info,
            format!("{removals} step(s) remove elements"),
        )
    }
}

fn reversible(impact: &ImpactAnalysis) -> StrengthCheck {
    const NAME: &str = "reversible";
    if impact.reversible {
        StrengthCheck::pass(NAME, CheckCategory::Reversibility, "changes can be undone")
    } else {
        StrengthCheck::fail(
            NAME,
            CheckCategory::Reversibility,
            Severity::Warning,
            "changes cannot be undone without a snapshot",
        )
    }
}
