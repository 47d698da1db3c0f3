//! Violations, severities and law categories

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// How badly a violation counts against a graph
///
/// Ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Graph is unusable
    Critical,
    /// Graph is invalid
    Error,
    /// Suspicious but allowed
    Warning,
    /// Hint only
    Info,
}

impl Severity {
    /// Score deduction per violation
    #[inline]
    #[must_use]
    pub const fn penalty(self) -> u32 {
        match self {
            Severity::Critical => 20,
            Severity::Error => 10,
            Severity::Warning => 5,
            Severity::Info => 1,
        }
    }

    /// Whether a violation of this severity fails validation
    #[inline]
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Severity::Critical | Severity::Error)
    }

    /// Upper-case label used in text reports
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(s)
    }
}

/// Law grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LawCategory {
    /// Graph shape: endpoints, entry points, cycles, reachability
    Structural,
    /// Meaning of optional fields
    Semantic,
    /// Kind-specific required fields
    Ontogenetic,
    /// Size and branching limits
    Operational,
    /// Presentation and hygiene
    Quality,
}

impl Display for LawCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            LawCategory::Structural => "structural",
            LawCategory::Semantic => "semantic",
            LawCategory::Ontogenetic => "ontogenetic",
            LawCategory::Operational => "operational",
            LawCategory::Quality => "quality",
        };
        f.write_str(s)
    }
}

/// One failure of a law against a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Id of the law that produced this violation
    pub law_id: String,
    /// Severity
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Offending node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Offending edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
    /// Suggested remedy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Violation {
    /// Create violation without location
    #[must_use]
    pub fn new(law_id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            law_id: law_id.into(),
            severity,
            message: message.into(),
            node_id: None,
            edge_id: None,
            suggestion: None,
        }
    }

    /// Attach node location
    #[inline]
    #[must_use]
    pub fn at_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Attach edge location
    #[inline]
    #[must_use]
    pub fn at_edge(mut self, edge_id: impl Into<String>) -> Self {
        self.edge_id = Some(edge_id.into());
        self
    }

    /// Attach suggestion
    #[inline]
    #[must_use]
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// The element this violation points at, node before edge
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.node_id.as_deref().or(self.edge_id.as_deref())
    }

    /// Whether `other` reports the same law at the same place
    #[must_use]
    pub fn same_site(&self, other: &Violation) -> bool {
        self.law_id == other.law_id
            && self.node_id == other.node_id
            && self.edge_id == other.edge_id
    }
}
