//! Validation engine configuration

use serde::{Deserialize, Serialize};

/// Soft limits for the operational laws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Node count above which a warning is raised
    pub max_nodes: usize,
    /// Per-node out-degree above which a warning is raised
    pub max_out_degree: usize,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With node limit
    #[inline]
    #[must_use]
    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    /// With branching limit
    #[inline]
    #[must_use]
    pub fn with_max_out_degree(mut self, max: usize) -> Self {
        self.max_out_degree = max;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_nodes: 100,
            max_out_degree: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "maxNodes": 5 }"#).unwrap();
        assert_eq!(config.max_nodes, 5);
        assert_eq!(config.max_out_degree, 10);
    }
}
