//! Ontos Repair
//!
//! Decides whether a proposed graph repair is safe and carries it through a
//! phased, auditable workflow.
//!
//! # Core Concepts
//!
//! - [`ImpactAnalyzer`]: affected subgraph, ripples, dependency chain and risk
//! - [`StrengthValidator`]: nine checks and an apply/review/reject verdict
//! - [`apply_steps`]: pure step application returning a new graph and an audit log
//! - [`FixOrchestrator`]: propose -> analyze -> validate -> apply -> verify
//!
//! # Example
//!
//! ```rust
//! use ontos_graph::{Graph, Node};
//! use ontos_repair::{apply_steps, FixOrchestrator, Phase, RepairAction, RepairStep, Verification};
//!
//! let graph = Graph::new()
//!     .with_node(Node::begin("start", "seed").with_property("size", 1))
//!     .with_node(Node::become_("grow", "seed"))
//!     .connect("start", "grow");
//! let steps = vec![RepairStep::set(RepairAction::SetTransform, "grow", "size + 1")];
//!
//! let orch = FixOrchestrator::new();
//! let id = orch.create_workflow("grow", "ontogenetic.become_transform", steps.clone(), 0.9);
//! orch.analyze_impact(id, &graph).unwrap();
//! orch.validate_strength(id, &graph).unwrap();
//! orch.begin_apply(id, orch.create_snapshot(&graph).unwrap()).unwrap();
//!
//! let outcome = apply_steps(&graph, &steps);
//! let verification = Verification::assess(outcome.applied_steps, steps.len(), true, None);
//! assert_eq!(orch.complete(id, verification).unwrap(), Phase::Complete);
//! ```

#![warn(unreachable_pub)]

mod apply;
mod config;
mod error;
mod impact;
mod orchestrator;
mod phase;
mod report;
mod snapshot;
mod step;
mod strength;
mod workflow;

pub use apply::{apply_steps, AppliedChange, ApplyOutcome, ChangeType, StepFailure};
pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, StepError};
pub use impact::{
    conflict_potential, risk_score, ConflictPotential, DependencyLink, ImpactAnalysis,
    ImpactAnalyzer, Relationship, RippleEffect, RippleKind, RippleSeverity, EDGE_DEPENDENCY,
    FIELD_DEPENDENCY, STRONG_DEPENDENCY,
};
pub use orchestrator::{FixOrchestrator, OrchestratorStats};
pub use phase::{allowed_transitions, validate_transition, Phase};
pub use snapshot::{create_snapshot, SnapshotId, WorkflowSnapshot};
pub use step::{clamp_confidence, ProposalKind, RepairAction, RepairProposal, RepairStep};
pub use strength::{
    recommend, CheckCategory, Recommendation, StrengthCheck, StrengthResult, StrengthValidator,
    MAX_BOUNDED_SCOPE, RISK_ERROR_THRESHOLD, RISK_WARNING_THRESHOLD,
};
pub use workflow::{FixWorkflow, RiskLevel, Verification, VerificationStatus, WorkflowId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
