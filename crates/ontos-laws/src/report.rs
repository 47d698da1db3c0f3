//! Plain-text validation reports
//!
//! Output is deterministic: sections always appear in the same order and
//! violations keep their law order.

use crate::engine::ValidationReport;
use crate::violation::Violation;
use std::fmt::{self, Display, Formatter, Write};

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation Report")?;
        writeln!(f, "=================")?;
        writeln!(f, "Status: {}", if self.passed { "PASSED" } else { "FAILED" })?;
        writeln!(f, "Score: {}/100", self.score)?;
        writeln!(f)?;
        writeln!(f, "Metrics:")?;
        writeln!(f, "  Nodes: {}", self.node_count)?;
        writeln!(f, "  Edges: {}", self.edge_count)?;
        writeln!(f, "  Laws evaluated: {}", self.laws_evaluated)?;
        writeln!(f, "  Critical: {}", self.counts.critical)?;
        writeln!(f, "  Errors: {}", self.counts.error)?;
        writeln!(f, "  Warnings: {}", self.counts.warning)?;
        writeln!(f, "  Info: {}", self.counts.info)?;
        writeln!(f)?;
        write_section(f, "Violations", self.blocking())?;
        writeln!(f)?;
        write_section(
            f,
            "Warnings",
            self.violations.iter().filter(|v| !v.severity.is_blocking()),
        )
    }
}

/// Render a list of violations under a heading
///
/// Shared by every report that lists violations.
pub fn write_section<'a, W: Write>(
    out: &mut W,
    heading: &str,
    violations: impl Iterator<Item = &'a Violation>,
) -> fmt::Result {
    writeln!(out, "{heading}:")?;
    let mut any = false;
    for v in violations {
        any = true;
        writeln!(out, "  [{}] {}: {}", v.severity.label(), v.law_id, v.message)?;
        if let Some(node) = &v.node_id {
            writeln!(out, "    Node: {node}")?;
        }
        if let Some(edge) = &v.edge_id {
            writeln!(out, "    Edge: {edge}")?;
        }
        if let Some(suggestion) = &v.suggestion {
            writeln!(out, "    Suggestion: {suggestion}")?;
        }
    }
    if !any {
        writeln!(out, "  (none)")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::engine::ValidationEngine;
    use ontos_graph::{Graph, Node};
    use pretty_assertions::assert_eq;

    #[test]
    fn report_text_layout() {
        let graph = Graph::new()
            .with_node(Node::begin("a", "seed").with_property("size", 1))
            .with_node(Node::become_("b", "seed"))
            .connect("a", "b");
        let text = ValidationEngine::new().validate(&graph).to_string();
        let expected = "\
Validation Report
=================
Status: FAILED
Score: 90/100

Metrics:
  Nodes: 2
  Edges: 1
  Laws evaluated: 14
  Critical: 0
  Errors: 1
  Warnings: 0
  Info: 0

Violations:
  [ERROR] ontogenetic.become_transform: Become node 'b' has no transform
    Node: b
    Suggestion: Set a transform describing how the entity changes

Warnings:
  (none)
";
        assert_eq!(text, expected);
    }
}
