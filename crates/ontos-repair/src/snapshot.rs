//! Pre-apply graph snapshots
//!
//! A snapshot is a deep copy of the graph plus a rolling checksum of its
//! JSON encoding, taken before any step is applied.

use chrono::{DateTime, Utc};
use ontos_graph::{Checksum, ChecksumError, Graph};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique snapshot identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub Ulid);

impl SnapshotId {
    /// Generate new snapshot ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deep copy of a graph at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSnapshot {
    /// Snapshot id
    pub id: SnapshotId,
    /// Copied graph
    pub graph: Graph,
    /// Checksum of `graph` at capture time
    pub checksum: Checksum,
    /// Capture time
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl WorkflowSnapshot {
    /// Capture a graph
    ///
    /// # Errors
    /// Returns error if the graph cannot be serialized for checksumming
    pub fn capture(graph: &Graph) -> Result<Self, ChecksumError> {
        let checksum = Checksum::of_graph(graph)?;
        Ok(Self {
            id: SnapshotId::new(),
            graph: graph.clone(),
            checksum,
            created_at: Utc::now(),
        })
    }

    /// Copy of the captured graph
    #[inline]
    #[must_use]
    pub fn restore(&self) -> Graph {
        self.graph.clone()
    }

    /// Stored graph still matches the stored checksum
    #[must_use]
    pub fn verify(&self) -> bool {
        Checksum::of_graph(&self.graph).is_ok_and(|c| c == self.checksum)
    }

    /// `graph` is identical to the captured one, by checksum
    #[must_use]
    pub fn matches(&self, graph: &Graph) -> bool {
        Checksum::of_graph(graph).is_ok_and(|c| c == self.checksum)
    }
}

/// Capture a snapshot of `graph`
///
/// # Errors
/// Returns error if the graph cannot be serialized
pub fn create_snapshot(graph: &Graph) -> Result<WorkflowSnapshot, ChecksumError> {
    WorkflowSnapshot::capture(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply_steps;
    use crate::step::{RepairAction, RepairStep};
    use ontos_graph::Node;
    use pretty_assertions::assert_eq;

    fn graph() -> Graph {
        Graph::new()
            .with_node(Node::begin("a", "e").with_property("n", 1))
            .with_node(Node::become_("b", "e"))
            .connect("a", "b")
    }

    #[test]
    fn restore_after_apply_is_identical() {
        let original = graph();
        let snapshot = create_snapshot(&original).unwrap();
        let outcome = apply_steps(&original, &[RepairStep::new(RepairAction::RemoveNode, "b")]);
        assert!(!snapshot.matches(&outcome.graph));

        let restored = snapshot.restore();
        assert_eq!(restored, original);
        assert!(snapshot.matches(&restored));
        assert_eq!(Checksum::of_graph(&restored).unwrap(), snapshot.checksum);
    }

    #[test]
    fn tampering_is_detected() {
        let mut snapshot = create_snapshot(&graph()).unwrap();
        assert!(snapshot.verify());
        snapshot.graph.nodes.pop();
        assert!(!snapshot.verify());
    }

    #[test]
    fn snapshot_is_a_deep_copy() {
        let mut source = graph();
        let snapshot = create_snapshot(&source).unwrap();
        source.nodes[0].data.entity = Some("changed".into());
        assert_eq!(snapshot.graph.nodes[0].data.entity.as_deref(), Some("e"));
    }
}
