//! Plain-text workflow reports
//!
//! Same layout as the validation report: status, score, metrics, then the
//! failed strength checks split into violations and warnings.

use crate::strength::StrengthCheck;
use crate::workflow::{FixWorkflow, RiskLevel};
use std::fmt::{self, Display, Formatter, Write};

impl Display for FixWorkflow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fix Workflow Report")?;
        writeln!(f, "===================")?;
        writeln!(f, "Workflow: {}", self.id)?;
        writeln!(f, "Target: {} ({})", self.target_id, self.violation_type)?;
        writeln!(f, "Status: {}", self.phase.as_str().to_uppercase())?;
        match &self.validation {
            Some(v) => writeln!(f, "Score: {}/100 ({})", v.strength, v.recommendation)?,
            None => writeln!(f, "Score: n/a")?,
        }
        writeln!(f)?;

        writeln!(f, "Metrics:")?;
        match &self.impact {
            Some(impact) => {
                let level = self.risk_level.map_or("n/a", RiskLevel::as_str);
                writeln!(f, "  Risk: {} ({level})", impact.risk_score)?;
                writeln!(f, "  Affected nodes: {}", impact.affected_nodes.len())?;
                writeln!(f, "  Affected edges: {}", impact.affected_edges.len())?;
                writeln!(f, "  Reversible: {}", if impact.reversible { "yes" } else { "no" })?;
            }
            None => writeln!(f, "  Risk: n/a")?,
        }
        writeln!(f, "  Steps: {}", self.steps.len())?;
        writeln!(f, "  Applied changes: {}", self.applied_changes.len())?;
        match &self.verification {
            Some(v) => writeln!(f, "  Quality: {:.2}", v.quality_score)?,
            None => writeln!(f, "  Quality: n/a")?,
        }
        writeln!(f)?;

        let checks = self.validation.as_ref().map(|v| v.checks.as_slice()).unwrap_or_default();
        write_checks(f, "Violations", checks.iter().filter(|c| c.is_error()))?;
        writeln!(f)?;
        write_checks(f, "Warnings", checks.iter().filter(|c| c.is_warning()))?;

        if let Some(reason) = &self.reason {
            writeln!(f)?;
            writeln!(f, "Reason: {reason}")?;
        }
        Ok(())
    }
}

fn write_checks<'a, W: Write>(
    out: &mut W,
    heading: &str,
    checks: impl Iterator<Item = &'a StrengthCheck>,
) -> fmt::Result {
    writeln!(out, "{heading}:")?;
    let mut any = false;
    for c in checks {
        any = true;
        writeln!(out, "  [{}] {}: {}", c.severity.label(), c.name, c.message)?;
    }
    if !any {
        writeln!(out, "  (none)")?;
    }
    Ok(())
}
