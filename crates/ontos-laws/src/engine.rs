//! Validation engine
//!
//! Walks the registry in order, collects violations and scores the graph.
//! A failing law never aborts validation: its error is recorded as a
//! warning-level "law execution error" and the remaining laws still run.

use crate::config::EngineConfig;
use crate::law::Law;
use crate::registry::LawRegistry;
use crate::violation::{LawCategory, Severity, Violation};
use ontos_graph::Graph;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Score a graph starts from
pub const MAX_SCORE: u32 = 100;

/// Violation counts per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Critical violations
    pub critical: usize,
    /// Error violations
    pub error: usize,
    /// Warning violations
    pub warning: usize,
    /// Info violations
    pub info: usize,
}

impl SeverityCounts {
    /// Tally a list of violations
    #[must_use]
    pub fn tally(violations: &[Violation]) -> Self {
        let mut counts = Self::default();
        for v in violations {
            match v.severity {
                Severity::Critical => counts.critical += 1,
                Severity::Error => counts.error += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }

    /// Critical plus error
    #[inline]
    #[must_use]
    pub fn blocking(&self) -> usize {
        self.critical + self.error
    }

    /// All violations
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.critical + self.error + self.warning + self.info
    }
}

/// Scored outcome of validating one graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// No critical and no error violations
    pub passed: bool,
    /// 0-100
    pub score: u32,
    /// Violations in law order
    pub violations: Vec<Violation>,
    /// Per-severity counts
    pub counts: SeverityCounts,
    /// Number of laws run
    pub laws_evaluated: usize,
    /// Nodes in the validated graph
    pub node_count: usize,
    /// Edges in the validated graph
    pub edge_count: usize,
}

impl ValidationReport {
    /// Build a report from collected violations
    #[must_use]
    pub fn from_violations(
        violations: Vec<Violation>,
        laws_evaluated: usize,
        graph: &Graph,
    ) -> Self {
        let counts = SeverityCounts::tally(&violations);
        Self {
            passed: counts.blocking() == 0,
            score: score(&violations),
            violations,
            counts,
            laws_evaluated,
            node_count: graph.nodes.len(),
            edge_count: graph.edges.len(),
        }
    }

    /// Violations that fail validation
    pub fn blocking(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.severity.is_blocking())
    }

    /// Violations of one severity
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.severity == severity)
    }

    /// Whether a violation of the same law at the same place is present
    #[must_use]
    pub fn contains_site(&self, violation: &Violation) -> bool {
        self.violations.iter().any(|v| v.same_site(violation))
    }
}

/// 100 minus severity penalties, floored at zero
#[must_use]
pub fn score(violations: &[Violation]) -> u32 {
    let penalty: u32 = violations.iter().map(|v| v.severity.penalty()).sum();
    MAX_SCORE.saturating_sub(penalty)
}

/// Runs a law registry against graphs
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    registry: LawRegistry,
}

impl ValidationEngine {
    /// Engine with built-in laws and default limits
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(LawRegistry::with_defaults())
    }

    /// Engine with built-in laws and the given limits
    #[must_use]
    pub fn with_config(config: &EngineConfig) -> Self {
        Self::with_registry(LawRegistry::with_config(config))
    }

    /// Engine over an explicit registry
    #[inline]
    #[must_use]
    pub fn with_registry(registry: LawRegistry) -> Self {
        Self { registry }
    }

    /// The law table
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &LawRegistry {
        &self.registry
    }

    /// Mutable law table
    #[inline]
    pub fn registry_mut(&mut self) -> &mut LawRegistry {
        &mut self.registry
    }

    /// Validate a graph against every registered law
    #[must_use]
    pub fn validate(&self, graph: &Graph) -> ValidationReport {
        self.run(graph, self.registry.iter())
    }

    /// Validate against the laws of some categories only
    #[must_use]
    pub fn validate_categories(
        &self,
        graph: &Graph,
        categories: &[LawCategory],
    ) -> ValidationReport {
        self.run(
            graph,
            self.registry
                .iter()
                .filter(|law| categories.contains(&law.category())),
        )
    }

    fn run<'a>(&self, graph: &Graph, laws: impl Iterator<Item = &'a Law>) -> ValidationReport {
        let started = Instant::now();
        let mut violations = Vec::new();
        let mut evaluated = 0;

        for law in laws {
            evaluated += 1;
            match law.evaluate(graph) {
                Ok(found) => {
                    tracing::trace!(law = law.id(), count = found.len(), "law evaluated");
                    violations.extend(found);
                }
                Err(e) => {
                    tracing::warn!(law = law.id(), error = %e, "law execution error");
                    violations.push(
                        Violation::new(
                            law.id(),
                            Severity::Warning,
                            format!("Law execution error: {e}"),
                        )
                        .suggest("Fix or unregister the failing law"),
                    );
                }
            }
        }

        let report = ValidationReport::from_violations(violations, evaluated, graph);
        tracing::debug!(
            laws = evaluated,
            violations = report.violations.len(),
            score = report.score,
            passed = report.passed,
            elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            "graph validated"
        );
        report
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}
