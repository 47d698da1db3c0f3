//! Ontos Graph
//!
//! Data model for directed workflow graphs.
//!
//! # Core Concepts
//!
//! - [`Graph`]: ordered nodes and edges, replaced wholesale rather than edited in place
//! - [`Node`] / [`NodeKind`] / [`NodeData`]: ontogenetic node kinds and their payload
//! - [`Edge`]: directed link referring to node ids
//! - [`GraphIndex`]: ordered adjacency for reachability and cycle search
//! - [`Checksum`]: rolling hash over a graph's serialized form
//!
//! # Example
//!
//! ```rust
//! use ontos_graph::{Graph, GraphIndex, Node};
//!
//! let graph = Graph::new()
//!     .with_node(Node::begin("start", "seed").with_property("size", 1))
//!     .with_node(Node::become_("grow", "seed").with_transform("size + 1"))
//!     .connect("start", "grow");
//!
//! let index = GraphIndex::build(&graph);
//! assert!(index.cycles().is_empty());
//! ```

#![warn(unreachable_pub)]

mod checksum;
mod graph;
mod index;
mod node;

pub use checksum::{Checksum, ChecksumError};
pub use graph::{Edge, Graph};
pub use index::{canonical_cycle, cycle_key, GraphIndex};
pub use node::{is_blank, Node, NodeData, NodeKind, UnknownNodeKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
