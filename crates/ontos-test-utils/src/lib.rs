//! Testing utilities for the Ontos workspace
//!
//! Shared graph fixtures and tracing setup.

#![allow(missing_docs)]

use ontos_graph::{Graph, Node, NodeKind};
use ontos_laws::{ValidationReport, Violation};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber honoring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Begin -> Become -> Cease with every required field set
pub fn lifecycle_graph() -> Graph {
    Graph::new()
        .with_node(Node::begin("start", "seed").with_property("size", 1))
        .with_node(Node::become_("grow", "seed").with_transform("size + 1"))
        .with_node(Node::cease("end", "seed").with_condition("size > 3"))
        .connect("start", "grow")
        .connect("grow", "end")
}

/// Lifecycle graph whose Become node lacks a transform (scores 90)
pub fn missing_transform_graph() -> Graph {
    let mut graph = lifecycle_graph();
    if let Some(node) = graph.node_mut("grow") {
        node.data.transform = None;
    }
    graph
}

/// Begin feeding the three-cycle a -> b -> c -> a
pub fn cyclic_graph() -> Graph {
    Graph::new()
        .with_node(Node::begin("start", "loop").with_property("n", 0))
        .with_node(Node::new("a", NodeKind::Generic))
        .with_node(Node::new("b", NodeKind::Generic))
        .with_node(Node::new("c", NodeKind::Generic))
        .connect("start", "a")
        .connect("a", "b")
        .connect("b", "c")
        .connect("c", "a")
}

/// `layers` ranks of `width` Become nodes under one Begin, fully connected between ranks
pub fn layered_graph(layers: usize, width: usize) -> Graph {
    let mut graph = Graph::new().with_node(Node::begin("root", "flow").with_property("depth", 0));
    let mut previous = vec!["root".to_string()];
    for layer in 0..layers {
        let current: Vec<String> = (0..width).map(|i| format!("n{layer}_{i}")).collect();
        for id in &current {
            graph = graph.with_node(Node::become_(id.as_str(), "flow").with_transform("step"));
        }
        for source in &previous {
            for target in &current {
                graph = graph.connect(source, target);
            }
        }
        previous = current;
    }
    graph
}

/// First violation reported by a law
pub fn violation_of<'r>(report: &'r ValidationReport, law_id: &str) -> Option<&'r Violation> {
    report.violations.iter().find(|v| v.law_id == law_id)
}
