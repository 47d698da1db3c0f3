//! Error types for the law engine
//!
//! Law failures never escape [`crate::ValidationEngine::validate`]; they are
//! converted into warning violations. Registry errors are returned to callers
//! editing the law table.

/// Failure raised by a law's check function
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LawError {
    /// Check could not evaluate the graph
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// Check panicked
    #[error("law panicked: {0}")]
    Panicked(String),
}

/// Registry editing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Law id already registered
    #[error("law already registered: {0}")]
    DuplicateLaw(String),

    /// Law id not registered
    #[error("law not found: {0}")]
    LawNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            LawError::Evaluation("bad".into()).to_string(),
            "evaluation failed: bad"
        );
        assert!(RegistryError::DuplicateLaw("x".into())
            .to_string()
            .contains("already registered"));
    }
}
