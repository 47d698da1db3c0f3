//! Graph nodes and their ontogenetic kinds
//!
//! A [`Node`] carries a [`NodeKind`] tag and a [`NodeData`] payload. The
//! payload is a typed view over the loosely-shaped data map authored by
//! editing surfaces: well-known keys get fields, everything else is kept in
//! [`NodeData::extra`] so round-trips never lose information.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Ontogenetic node kind
///
/// Begin, Become, Cease, Transcend and Resolve describe the lifecycle of an
/// entity; Generic nodes carry no kind-specific requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Entity comes into existence
    Begin,
    /// Entity transforms
    Become,
    /// Entity ends under a condition
    Cease,
    /// Entity passes through a portal
    Transcend,
    /// Competing transformations are reconciled
    Resolve,
    /// No ontogenetic meaning
    Generic,
}

impl NodeKind {
    /// All kinds in declaration order
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Begin,
        NodeKind::Become,
        NodeKind::Cease,
        NodeKind::Transcend,
        NodeKind::Resolve,
        NodeKind::Generic,
    ];

    /// Stable lowercase name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::Begin => "begin",
            NodeKind::Become => "become",
            NodeKind::Cease => "cease",
            NodeKind::Transcend => "transcend",
            NodeKind::Resolve => "resolve",
            NodeKind::Generic => "generic",
        }
    }

    /// Whether this kind participates in entity lifecycle rules
    #[inline]
    #[must_use]
    pub const fn is_ontogenetic(self) -> bool {
        !matches!(self, NodeKind::Generic)
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`NodeKind`] from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown node kind: {0}")]
pub struct UnknownNodeKind(pub String);

impl FromStr for NodeKind {
    type Err = UnknownNodeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownNodeKind(s.to_string()))
    }
}

/// Node payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Entity this node describes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,

    /// Initial properties (Begin)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,

    /// Transformation expression (Become)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,

    /// Termination condition (Cease)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Portal target (Transcend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal: Option<String>,

    /// Reconciliation strategy (Resolve)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    /// Display text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,

    /// Editor status tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Keys without a dedicated field
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl NodeData {
    /// Read a named field as JSON
    ///
    /// Used by audit logs that record before/after values of a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Value {
        let text = |v: &Option<String>| v.clone().map_or(Value::Null, Value::String);
        match name {
            "entity" => text(&self.entity),
            "properties" => Value::Object(
                self.properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            "transform" => text(&self.transform),
            "condition" => text(&self.condition),
            "portal" => text(&self.portal),
            "strategy" => text(&self.strategy),
            "narrative" => text(&self.narrative),
            "status" => text(&self.status),
            other => self.extra.get(other).cloned().unwrap_or(Value::Null),
        }
    }
}

/// Returns `true` when an optional text field is missing or blank
#[inline]
#[must_use]
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// A graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique id within the graph
    pub id: String,
    /// Ontogenetic kind
    pub kind: NodeKind,
    /// Payload
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    /// Create node with empty data
    #[must_use]
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            data: NodeData::default(),
        }
    }

    /// Begin node for an entity
    #[must_use]
    pub fn begin(id: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Begin).with_entity(entity)
    }

    /// Become node for an entity
    #[must_use]
    pub fn become_(id: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Become).with_entity(entity)
    }

    /// Cease node for an entity
    #[must_use]
    pub fn cease(id: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Cease).with_entity(entity)
    }

    /// Set entity
    #[inline]
    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.data.entity = Some(entity.into());
        self
    }

    /// Add one property
    #[inline]
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.properties.insert(key.into(), value.into());
        self
    }

    /// Set transform
    #[inline]
    #[must_use]
    pub fn with_transform(mut self, transform: impl Into<String>) -> Self {
        self.data.transform = Some(transform.into());
        self
    }

    /// Set condition
    #[inline]
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.data.condition = Some(condition.into());
        self
    }

    /// Set portal
    #[inline]
    #[must_use]
    pub fn with_portal(mut self, portal: impl Into<String>) -> Self {
        self.data.portal = Some(portal.into());
        self
    }

    /// Set strategy
    #[inline]
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.data.strategy = Some(strategy.into());
        self
    }

    /// Set narrative
    #[inline]
    #[must_use]
    pub fn with_narrative(mut self, narrative: impl Into<String>) -> Self {
        self.data.narrative = Some(narrative.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_roundtrips_through_text() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.as_str().parse::<NodeKind>().unwrap(), kind);
        }
        assert!("Teleport".parse::<NodeKind>().is_err());
        assert_eq!("BEGIN".parse::<NodeKind>().unwrap(), NodeKind::Begin);
    }

    #[test]
    fn unknown_data_keys_are_preserved() {
        let raw = json!({
            "id": "n1",
            "kind": "become",
            "data": { "entity": "seed", "transform": "grow", "color": "green" }
        });
        let node: Node = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(node.data.transform.as_deref(), Some("grow"));
        assert_eq!(node.data.extra.get("color"), Some(&json!("green")));
        assert_eq!(serde_json::to_value(&node).unwrap(), raw);
    }

    #[test]
    fn field_reads_named_values() {
        let node = Node::begin("b", "seed").with_property("size", 1);
        assert_eq!(node.data.field("entity"), json!("seed"));
        assert_eq!(node.data.field("properties"), json!({ "size": 1 }));
        assert_eq!(node.data.field("transform"), Value::Null);
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(None));
        assert!(is_blank(Some("   ")));
        assert!(!is_blank(Some("grow")));
    }
}
