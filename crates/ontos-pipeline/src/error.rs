//! Pipeline error types

use ontos_graph::ChecksumError;
use ontos_repair::OrchestratorError;

/// Remediation pipeline error
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Proposal source returned an error
    #[error("proposal source failed: {0}")]
    ProposalFailed(#[source] anyhow::Error),

    /// Proposal source did not answer in time
    #[error("proposal timed out after {duration_secs}s")]
    ProposalTimeout {
        /// Configured timeout
        duration_secs: u64,
    },

    /// Workflow sequencing failed
    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    /// Snapshot could not be taken
    #[error("snapshot failed: {0}")]
    Snapshot(#[from] ChecksumError),

    /// Configuration could not be parsed
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Failure of the external proposer; another attempt may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ProposalFailed(_) | Self::ProposalTimeout { .. })
    }
}
