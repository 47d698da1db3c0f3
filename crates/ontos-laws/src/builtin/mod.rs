//! Built-in law table
//!
//! Registration order here is the engine's default evaluation order.

mod ontogenetic;
mod operational;
mod semantic;
mod structural;

use crate::config::EngineConfig;
use crate::law::Law;

/// Every built-in law, in evaluation order
#[must_use]
pub fn all(config: &EngineConfig) -> Vec<Law> {
    vec![
        structural::begin_exists(),
        structural::unique_ids(),
        structural::edge_endpoints(),
        structural::begin_no_inbound(),
        structural::reachability(),
        structural::acyclic(),
        ontogenetic::entity(),
        ontogenetic::begin_properties(),
        ontogenetic::become_transform(),
        ontogenetic::cease_condition(),
        semantic::transcend_portal(),
        semantic::resolve_strategy(),
        operational::node_limit(config.max_nodes),
        operational::branching_limit(config.max_out_degree),
    ]
}
