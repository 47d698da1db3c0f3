//! Rolling-hash checksums over serialized graphs
//!
//! The checksum is a 32-bit polynomial rolling hash (`h = h * 31 + byte`,
//! wrapping) of the graph's JSON encoding. It detects accidental divergence
//! between a snapshot and the graph it was taken from; it is not a
//! cryptographic digest.

use crate::graph::Graph;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Checksum errors
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// Graph could not be serialized
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Text form is not 8 hex digits
    #[error("invalid checksum text: {0}")]
    InvalidText(String),
}

/// 32-bit rolling checksum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Checksum(u32);

impl Checksum {
    /// Wrap a raw value
    #[inline]
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Rolling hash of arbitrary bytes
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        let hash = data.iter().fold(0u32, |h, &b| {
            h.wrapping_shl(5).wrapping_sub(h).wrapping_add(u32::from(b))
        });
        Self(hash)
    }

    /// Checksum of a graph's JSON encoding
    ///
    /// # Errors
    /// Returns error if the graph cannot be serialized
    pub fn of_graph(graph: &Graph) -> Result<Self, ChecksumError> {
        let bytes = serde_json::to_vec(graph)?;
        Ok(Self::compute(&bytes))
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl FromStr for Checksum {
    type Err = ChecksumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 {
            return Err(ChecksumError::InvalidText(s.to_string()));
        }
        u32::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| ChecksumError::InvalidText(s.to_string()))
    }
}

impl serde::Serialize for Checksum {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Checksum {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use proptest::prelude::*;

    #[test]
    fn known_values() {
        assert_eq!(Checksum::compute(b"").value(), 0);
        assert_eq!(Checksum::compute(b"a").value(), 97);
        assert_eq!(Checksum::compute(b"ab").value(), 97 * 31 + 98);
    }

    #[test]
    fn graph_checksum_tracks_content() {
        let a = Graph::new().with_node(Node::begin("a", "seed"));
        let b = Graph::new().with_node(Node::begin("a", "sprout"));
        assert_eq!(Checksum::of_graph(&a).unwrap(), Checksum::of_graph(&a.clone()).unwrap());
        assert_ne!(Checksum::of_graph(&a).unwrap(), Checksum::of_graph(&b).unwrap());
    }

    #[test]
    fn text_form() {
        let c = Checksum::new(0xdead_beef);
        assert_eq!(c.to_string(), "deadbeef");
        assert_eq!("deadbeef".parse::<Checksum>().unwrap(), c);
        assert!("xyz".parse::<Checksum>().is_err());
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"deadbeef\"");
    }

    proptest! {
        #[test]
        fn prop_text_roundtrip(value in any::<u32>()) {
            let c = Checksum::new(value);
            prop_assert_eq!(c.to_string().parse::<Checksum>().unwrap(), c);
        }
    }
}
