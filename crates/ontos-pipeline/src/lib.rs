//! Ontos Pipeline
//!
//! Async caller layer that takes a graph from detection to verified repair.
//!
//! # Core Concepts
//!
//! - [`ProposalSource`]: external producer of repair proposals
//! - [`RemediationPipeline`]: propose, analyze, validate, apply and verify one violation,
//!   or every blocking violation of a graph
//! - [`OntosConfig`]: engine, orchestrator and pipeline settings loaded from TOML

#![warn(unreachable_pub)]

mod config;
mod error;
mod pipeline;
mod source;

pub use config::{OntosConfig, PipelineConfig};
pub use error::PipelineError;
pub use pipeline::{RemediationOutcome, RemediationPipeline, RepairRun};
pub use source::ProposalSource;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
