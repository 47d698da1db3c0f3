//! Ontos Laws
//!
//! Rule engine that validates workflow graphs and scores the result.
//!
//! # Core Concepts
//!
//! - [`Law`]: id, category, severity and a pure check function
//! - [`LawRegistry`]: ordered, editable table of laws
//! - [`ValidationEngine`]: runs the registry, isolates failing laws, scores the graph
//! - [`ValidationReport`]: violations, per-severity counts and a 0-100 score
//!
//! # Example
//!
//! ```rust
//! use ontos_graph::{Graph, Node};
//! use ontos_laws::ValidationEngine;
//!
//! let graph = Graph::new()
//!     .with_node(Node::begin("start", "seed").with_property("size", 1))
//!     .with_node(Node::become_("grow", "seed"))
//!     .connect("start", "grow");
//!
//! let report = ValidationEngine::new().validate(&graph);
//! assert!(!report.passed);
//! assert_eq!(report.score, 90);
//! ```

#![warn(unreachable_pub)]

mod builtin;
mod config;
mod engine;
mod error;
mod law;
mod registry;
mod report;
mod violation;

pub use config::EngineConfig;
pub use engine::{score, SeverityCounts, ValidationEngine, ValidationReport, MAX_SCORE};
pub use error::{LawError, RegistryError};
pub use law::{Law, LawCheck, LawMeta};
pub use registry::LawRegistry;
pub use report::write_section;
pub use violation::{LawCategory, Severity, Violation};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
