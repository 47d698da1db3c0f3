//! Laws as data
//!
//! A [`Law`] is metadata plus a shared, pure check function. There is no law
//! trait to implement: new rules are built with [`Law::new`] or
//! [`Law::infallible`] and dropped into a [`crate::LawRegistry`].

use crate::error::LawError;
use crate::violation::{LawCategory, Severity, Violation};
use ontos_graph::Graph;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Check function signature
pub type LawCheck = dyn Fn(&Graph, &LawMeta) -> Result<Vec<Violation>, LawError> + Send + Sync;

/// Serializable identity of a law
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawMeta {
    /// Unique id, `category.name`
    pub id: String,
    /// Grouping
    pub category: LawCategory,
    /// Severity stamped on produced violations
    pub severity: Severity,
    /// One-line description
    pub description: String,
}

impl LawMeta {
    /// Start a violation carrying this law's id and severity
    #[inline]
    #[must_use]
    pub fn violation(&self, message: impl Into<String>) -> Violation {
        Violation::new(self.id.clone(), self.severity, message)
    }
}

/// A named rule over graphs
#[derive(Clone)]
pub struct Law {
    meta: LawMeta,
    check: Arc<LawCheck>,
}

impl Law {
    /// Create a law whose check may fail
    pub fn new<F>(
        id: impl Into<String>,
        category: LawCategory,
        severity: Severity,
        description: impl Into<String>,
        check: F,
    ) -> Self
    where
        F: Fn(&Graph, &LawMeta) -> Result<Vec<Violation>, LawError> + Send + Sync + 'static,
    {
        Self {
            meta: LawMeta {
                id: id.into(),
                category,
                severity,
                description: description.into(),
            },
            check: Arc::new(check),
        }
    }

    /// Create a law whose check always produces a result
    pub fn infallible<F>(
        id: impl Into<String>,
        category: LawCategory,
        severity: Severity,
        description: impl Into<String>,
        check: F,
    ) -> Self
    where
        F: Fn(&Graph, &LawMeta) -> Vec<Violation> + Send + Sync + 'static,
    {
        Self::new(id, category, severity, description, move |g, m| Ok(check(g, m)))
    }

    /// Metadata
    #[inline]
    #[must_use]
    pub fn meta(&self) -> &LawMeta {
        &self.meta
    }

    /// Id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    /// Category
    #[inline]
    #[must_use]
    pub fn category(&self) -> LawCategory {
        self.meta.category
    }

    /// Severity
    #[inline]
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.meta.severity
    }

    /// Run the check, converting a panic into [`LawError::Panicked`]
    ///
    /// # Errors
    /// Returns the check's own error, or `Panicked` if it unwound
    pub fn evaluate(&self, graph: &Graph) -> Result<Vec<Violation>, LawError> {
        panic::catch_unwind(AssertUnwindSafe(|| (self.check)(graph, &self.meta)))
            .unwrap_or_else(|payload| Err(LawError::Panicked(panic_message(payload.as_ref()))))
    }
}

impl fmt::Debug for Law {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Law").field("meta", &self.meta).finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontos_graph::Node;

    fn count_nodes() -> Law {
        Law::infallible(
            "quality.count",
            LawCategory::Quality,
            Severity::Info,
            "one info per node",
            |g, meta| g.nodes.iter().map(|n| meta.violation("seen").at_node(&n.id)).collect(),
        )
    }

    #[test]
    fn violations_carry_law_identity() {
        let graph = Graph::new().with_node(Node::begin("a", "seed"));
        let out = count_nodes().evaluate(&graph).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].law_id, "quality.count");
        assert_eq!(out[0].severity, Severity::Info);
        assert_eq!(out[0].node_id.as_deref(), Some("a"));
    }

    #[test]
    fn panics_become_errors() {
        let law = Law::infallible(
            "structural.boom",
            LawCategory::Structural,
            Severity::Error,
            "always panics",
            |_, _| panic!("boom"),
        );
        let err = law.evaluate(&Graph::new()).unwrap_err();
        assert_eq!(err, LawError::Panicked("boom".to_string()));
    }

    #[test]
    fn debug_hides_closure() {
        let text = format!("{:?}", count_nodes());
        assert!(text.contains("quality.count"));
    }
}
