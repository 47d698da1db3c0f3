//! Orchestrator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Workflow retention and apply policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorConfig {
    /// Seconds a finished workflow is kept before `cleanup` drops it
    pub max_age_secs: u64,
    /// Refuse to enter apply unless the recommendation is apply
    pub enforce_recommendation: bool,
    /// Roll back instead of failing when an apply is only partial
    pub rollback_on_partial: bool,
}

impl OrchestratorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retention
    #[inline]
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age_secs = max_age.as_secs();
        self
    }

    /// With recommendation gate
    #[inline]
    #[must_use]
    pub fn with_enforce_recommendation(mut self, enforce: bool) -> Self {
        self.enforce_recommendation = enforce;
        self
    }

    /// With partial-apply rollback
    #[inline]
    #[must_use]
    pub fn with_rollback_on_partial(mut self, rollback: bool) -> Self {
        self.rollback_on_partial = rollback;
        self
    }

    /// Retention as a duration
    #[inline]
    #[must_use]
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 3600,
            enforce_recommendation: false,
            rollback_on_partial: false,
        }
    }
}
