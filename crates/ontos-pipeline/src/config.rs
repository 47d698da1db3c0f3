//! Pipeline and workspace configuration
//!
//! [`OntosConfig`] gathers every component's settings and loads from TOML.
//! Missing sections and keys keep their defaults.

use crate::error::PipelineError;
use ontos_laws::EngineConfig;
use ontos_repair::OrchestratorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Remediation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Seconds to wait for a proposal
    pub proposal_timeout_secs: u64,
    /// Apply proposals graded review
    pub apply_on_review: bool,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With proposal timeout
    #[inline]
    #[must_use]
    pub fn with_proposal_timeout(mut self, timeout: Duration) -> Self {
        self.proposal_timeout_secs = timeout.as_secs();
        self
    }

    /// With review policy
    #[inline]
    #[must_use]
    pub fn with_apply_on_review(mut self, apply: bool) -> Self {
        self.apply_on_review = apply;
        self
    }

    /// Timeout as a duration
    #[inline]
    #[must_use]
    pub fn proposal_timeout(&self) -> Duration {
        Duration::from_secs(self.proposal_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            proposal_timeout_secs: 30,
            apply_on_review: true,
        }
    }
}

/// Settings for every component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OntosConfig {
    /// Validation limits
    pub engine: EngineConfig,
    /// Workflow policy
    pub orchestrator: OrchestratorConfig,
    /// Remediation policy
    pub pipeline: PipelineConfig,
}

impl OntosConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Returns `Config` if the text is not valid TOML for this shape
    pub fn from_toml_str(text: &str) -> Result<Self, PipelineError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read, `Config` if it does not parse
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = OntosConfig::default();
        assert_eq!(config.engine.max_nodes, 100);
        assert_eq!(config.orchestrator.max_age_secs, 3600);
        assert!(!config.orchestrator.enforce_recommendation);
        assert_eq!(config.pipeline.proposal_timeout(), Duration::from_secs(30));
        assert!(config.pipeline.apply_on_review);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = OntosConfig::from_toml_str(
            r"
            [engine]
            maxOutDegree = 4

            [pipeline]
            applyOnReview = false
            ",
        )
        .unwrap();
        assert_eq!(config.engine.max_out_degree, 4);
        assert_eq!(config.engine.max_nodes, 100);
        assert!(!config.pipeline.apply_on_review);
        assert_eq!(config.pipeline.proposal_timeout_secs, 30);
        assert_eq!(config.orchestrator, OrchestratorConfig::default());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = OntosConfig::from_toml_str("[engine\nmaxNodes = ").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[tokio::test]
    async fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[orchestrator]\nenforceRecommendation = true\nmaxAgeSecs = 60").unwrap();
        let config = OntosConfig::load(file.path()).await.unwrap();
        assert!(config.orchestrator.enforce_recommendation);
        assert_eq!(config.orchestrator.max_age_secs, 60);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = OntosConfig::load(dir.path().join("absent.toml")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
