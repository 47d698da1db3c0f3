//! Proposal source seam

use async_trait::async_trait;
use ontos_graph::Graph;
use ontos_laws::Violation;
use ontos_repair::RepairProposal;

/// External producer of repair proposals
///
/// Implementations typically call out to a model or a human reviewer. The
/// pipeline wraps every call in the configured timeout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProposalSource: Send + Sync {
    /// Propose a repair for `violation` in `graph`
    async fn propose(&self, violation: &Violation, graph: &Graph) -> anyhow::Result<RepairProposal>;
}
