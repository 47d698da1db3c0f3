//! Engine behaviour over shared graph fixtures

use ontos_laws::{EngineConfig, Severity, ValidationEngine};
use ontos_test_utils::{cyclic_graph, init_tracing, layered_graph, violation_of};
use pretty_assertions::assert_eq;

#[test]
fn three_cycle_is_one_error() {
    init_tracing();
    let report = ValidationEngine::new().validate(&cyclic_graph());
    assert!(!report.passed);
    assert_eq!(report.score, 90);
    assert_eq!(report.violations.len(), 1);

    let cycle = violation_of(&report, "structural.acyclic").unwrap();
    assert_eq!(cycle.severity, Severity::Error);
    assert_eq!(cycle.message, "Cycle detected: a -> b -> c -> a");
    assert_eq!(cycle.node_id.as_deref(), Some("a"));
}

#[test]
fn very_long_chain_validates() {
    // 100,000 Become nodes in a single line under one Begin
    let graph = layered_graph(100_000, 1);
    let report = ValidationEngine::new().validate(&graph);
    assert!(report.passed);
    assert_eq!(report.node_count, 100_001);
    assert_eq!(report.violations.len(), 1);
    assert!(violation_of(&report, "operational.node_limit").is_some());
    assert_eq!(report.score, 95);
}

#[test]
fn wide_layers_trip_branching_limit() {
    let engine = ValidationEngine::with_config(
        &EngineConfig::new().with_max_nodes(1_000).with_max_out_degree(3),
    );
    let report = engine.validate(&layered_graph(2, 4));
    // root and each first-rank node fan out to four successors
    assert_eq!(report.counts.warning, 5);
    assert!(report.passed);
    assert!(report
        .violations
        .iter()
        .all(|v| v.law_id == "operational.branching_limit"));
}
