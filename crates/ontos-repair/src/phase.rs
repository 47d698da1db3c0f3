//! Workflow phase machine
//!
//! Phases move strictly forward through the table in [`allowed_transitions`].
//! Terminal phases accept nothing.

use crate::error::OrchestratorError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Lifecycle phase of a fix workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Proposal recorded
    Propose,
    /// Impact computed
    Analyze,
    /// Strength computed
    Validate,
    /// Steps being applied
    Apply,
    /// Outcome being checked
    Verify,
    /// Done, repair verified
    Complete,
    /// Done, repair abandoned or unsuccessful
    Failed,
    /// Done, graph restored from snapshot
    RolledBack,
}

impl Phase {
    /// Every phase, in lifecycle order
    pub const ALL: [Phase; 8] = [
        Phase::Propose,
        Phase::Analyze,
        Phase::Validate,
        Phase::Apply,
        Phase::Verify,
        Phase::Complete,
        Phase::Failed,
        Phase::RolledBack,
    ];

    /// Stable snake_case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Propose => "propose",
            Phase::Analyze => "analyze",
            Phase::Validate => "validate",
            Phase::Apply => "apply",
            Phase::Verify => "verify",
            Phase::Complete => "complete",
            Phase::Failed => "failed",
            Phase::RolledBack => "rolled_back",
        }
    }

    /// No further transitions
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phases reachable in one step from `from`
#[must_use]
pub fn allowed_transitions(from: Phase) -> &'static [Phase] {
    use Phase::{Analyze, Apply, Complete, Failed, Propose, RolledBack, Validate, Verify};
    match from {
        Propose => &[Analyze, Failed],
        Analyze => &[Validate, Failed],
        Validate => &[Apply, Failed],
        Apply => &[Verify, Failed, RolledBack],
        Verify => &[Complete, Failed, RolledBack],
        Complete | Failed | RolledBack => &[],
    }
}

/// Check a transition against the table
///
/// # Errors
/// Returns `IllegalTransition` if `to` is not reachable from `from`
pub fn validate_transition(from: Phase, to: Phase) -> Result<(), OrchestratorError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(OrchestratorError::IllegalTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn happy_path_is_allowed() {
        let path = [
            Phase::Propose,
            Phase::Analyze,
            Phase::Validate,
            Phase::Apply,
            Phase::Verify,
            Phase::Complete,
        ];
        for pair in path.windows(2) {
            assert!(validate_transition(pair[0], pair[1]).is_ok());
        }
    }

    #[test]
    fn terminal_phases() {
        assert!(Phase::Complete.is_terminal());
        assert!(Phase::Failed.is_terminal());
        assert!(Phase::RolledBack.is_terminal());
        assert!(!Phase::Verify.is_terminal());
    }

    #[test]
    fn rollback_only_after_apply() {
        assert!(!allowed_transitions(Phase::Validate).contains(&Phase::RolledBack));
        assert!(allowed_transitions(Phase::Apply).contains(&Phase::RolledBack));
    }

    #[test]
    fn serde_names() {
        assert_eq!(
            serde_json::to_string(&Phase::RolledBack).unwrap(),
            "\"rolled_back\""
        );
    }

    proptest! {
        #[test]
        fn prop_transitions_never_go_backwards(from in 0usize..8, to in 0usize..8) {
            let (from, to) = (Phase::ALL[from], Phase::ALL[to]);
            match validate_transition(from, to) {
                Ok(()) => prop_assert!(to > from),
                Err(e) => prop_assert!(e.is_sequencing()),
            }
        }

        #[test]
        fn prop_every_non_terminal_phase_can_fail(from in 0usize..5) {
            prop_assert!(validate_transition(Phase::ALL[from], Phase::Failed).is_ok());
        }
    }
}
