//! Ordered adjacency index over a [`Graph`]
//!
//! Builds a `petgraph` view for reachability and degree queries plus an
//! ordered successor table so depth-first walks visit neighbors in edge
//! order. Edges whose endpoints are missing are left out of the index; the
//! graph itself still holds them for validators to report.

use crate::graph::Graph;
use crate::node::Node;
use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use petgraph::Direction;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnStack,
    Done,
}

/// Read-only index borrowed from a graph
#[derive(Debug)]
pub struct GraphIndex<'g> {
    graph: &'g Graph,
    /// First occurrence of each id → position
    ids: IndexMap<&'g str, usize>,
    /// Node weight = position in `graph.nodes`, edge weight = position in `graph.edges`
    inner: DiGraph<usize, usize>,
    successors: Vec<Vec<usize>>,
}

impl<'g> GraphIndex<'g> {
    /// Index a graph
    #[must_use]
    pub fn build(graph: &'g Graph) -> Self {
        let mut ids = IndexMap::with_capacity(graph.nodes.len());
        let mut inner = DiGraph::with_capacity(graph.nodes.len(), graph.edges.len());

        for (pos, node) in graph.nodes.iter().enumerate() {
            if !ids.contains_key(node.id.as_str()) {
                let ix = inner.add_node(pos);
                ids.insert(node.id.as_str(), ix.index());
            }
        }

        let mut successors = vec![Vec::new(); ids.len()];
        for (pos, edge) in graph.edges.iter().enumerate() {
            let (Some(&from), Some(&to)) = (
                ids.get(edge.source.as_str()),
                ids.get(edge.target.as_str()),
            ) else {
                continue;
            };
            inner.add_edge(NodeIndex::new(from), NodeIndex::new(to), pos);
            successors[from].push(to);
        }

        Self {
            graph,
            ids,
            inner,
            successors,
        }
    }

    /// Number of distinct node ids
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when the graph has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Index position of a node id
    #[inline]
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.get(id).copied()
    }

    /// Node at an index position
    #[must_use]
    pub fn node_at(&self, pos: usize) -> &'g Node {
        &self.graph.nodes[self.inner[NodeIndex::new(pos)]]
    }

    /// Id at an index position
    #[must_use]
    pub fn id_at(&self, pos: usize) -> &'g str {
        self.node_at(pos).id.as_str()
    }

    /// Number of resolvable edges entering `id`
    #[must_use]
    pub fn in_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Incoming)
    }

    /// Number of resolvable edges leaving `id`
    #[must_use]
    pub fn out_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Outgoing)
    }

    fn degree(&self, id: &str, dir: Direction) -> usize {
        self.position(id).map_or(0, |pos| {
            self.inner
                .edges_directed(NodeIndex::new(pos), dir)
                .count()
        })
    }

    /// Successor positions in edge order
    #[inline]
    #[must_use]
    pub fn successors(&self, pos: usize) -> &[usize] {
        &self.successors[pos]
    }

    /// Forward reachability from a set of start positions
    ///
    /// Returns one flag per index position.
    #[must_use]
    pub fn reachable_from(&self, starts: impl IntoIterator<Item = usize>) -> Vec<bool> {
        let mut reached = vec![false; self.len()];
        for start in starts {
            if reached[start] {
                continue;
            }
            let mut bfs = Bfs::new(&self.inner, NodeIndex::new(start));
            while let Some(ix) = bfs.next(&self.inner) {
                reached[ix.index()] = true;
            }
        }
        reached
    }

    /// Every distinct directed cycle found by depth-first search
    ///
    /// Uses a recursion stack: an edge back into a node still on the stack
    /// closes a cycle. Each cycle is rotated so its smallest id comes first,
    /// and cycles sharing that canonical form are reported once no matter
    /// where the walk started. The walk keeps its own frame stack, so path
    /// length is bounded by memory rather than by the thread's stack.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<&'g str>> {
        let mut state = vec![Visit::New; self.len()];
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for start in 0..self.len() {
            if state[start] == Visit::New {
                self.walk(start, &mut state, &mut seen, &mut found);
            }
        }
        found
    }

    fn walk(
        &self,
        start: usize,
        state: &mut [Visit],
        seen: &mut HashSet<String>,
        found: &mut Vec<Vec<&'g str>>,
    ) {
        // (node, index of the next successor to visit)
        let mut frames: Vec<(usize, usize)> = vec![(start, 0)];
        state[start] = Visit::OnStack;

        while let Some(frame) = frames.last_mut() {
            let (node, cursor) = *frame;
            let Some(&next) = self.successors[node].get(cursor) else {
                state[node] = Visit::Done;
                frames.pop();
                continue;
            };
            frame.1 += 1;

            match state[next] {
                Visit::New => {
                    state[next] = Visit::OnStack;
                    frames.push((next, 0));
                }
                Visit::OnStack => {
                    if let Some(from) = frames.iter().rposition(|&(p, _)| p == next) {
                        let cycle = canonical_cycle(
                            frames[from..].iter().map(|&(p, _)| self.id_at(p)).collect(),
                        );
                        if seen.insert(cycle_key(&cycle)) {
                            found.push(cycle);
                        }
                    }
                }
                Visit::Done => {}
            }
        }
    }
}

/// Rotate a cycle so that its lexicographically smallest id is first
#[must_use]
pub fn canonical_cycle<S: AsRef<str>>(mut cycle: Vec<S>) -> Vec<S> {
    if let Some(min) = (0..cycle.len()).min_by(|&a, &b| cycle[a].as_ref().cmp(cycle[b].as_ref())) {
        cycle.rotate_left(min);
    }
    cycle
}

/// Join a canonical cycle into its dedup key, e.g. `a -> b -> c`
#[must_use]
pub fn cycle_key<S: AsRef<str>>(cycle: &[S]) -> String {
    cycle
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn chain(ids: &[&str]) -> Graph {
        ids.iter()
            .fold(Graph::new(), |g, id| g.with_node(Node::become_(*id, "e")))
    }

    #[test]
    fn rotation_is_canonical() {
        assert_eq!(canonical_cycle(vec!["c", "a", "b"]), vec!["a", "b", "c"]);
        assert_eq!(canonical_cycle(vec!["b", "c", "a"]), vec!["a", "b", "c"]);
        assert_eq!(cycle_key(&["a", "b"]), "a -> b");
        assert!(canonical_cycle(Vec::<&str>::new()).is_empty());
    }

    #[test]
    fn three_cycle_reported_once_from_any_start() {
        for order in [["a", "b", "c"], ["b", "c", "a"], ["c", "a", "b"]] {
            let g = chain(&order).connect("a", "b").connect("b", "c").connect("c", "a");
            let index = GraphIndex::build(&g);
            assert_eq!(index.cycles(), vec![vec!["a", "b", "c"]]);
        }
    }

    #[test]
    fn distinct_cycles_are_all_reported() {
        let g = chain(&["a", "b", "c", "d"])
            .connect("a", "b")
            .connect("b", "a")
            .connect("c", "d")
            .connect("d", "c")
            .connect("d", "d");
        let cycles = GraphIndex::build(&g).cycles();
        assert_eq!(cycles.len(), 3);
        assert!(cycles.contains(&vec!["d"]));
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let g = chain(&["a", "b", "c"]).connect("a", "b").connect("a", "c").connect("b", "c");
        assert!(GraphIndex::build(&g).cycles().is_empty());
    }

    #[test]
    fn reachability_and_degrees() {
        let g = chain(&["a", "b", "c", "d"])
            .connect("a", "b")
            .connect("b", "c")
            .connect("x", "d");
        let index = GraphIndex::build(&g);
        let reached = index.reachable_from([0]);
        assert_eq!(reached, vec![true, true, true, false]);
        assert_eq!(index.out_degree("a"), 1);
        assert_eq!(index.in_degree("d"), 0, "dangling edge is not indexed");
        assert_eq!(index.successors(1), &[2]);
    }

    #[test]
    fn long_chain_does_not_exhaust_the_stack() {
        let n = 100_000;
        let ids: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
        let mut g = ids
            .iter()
            .fold(Graph::new(), |g, id| g.with_node(Node::become_(id.as_str(), "e")));
        for pair in ids.windows(2) {
            g = g.connect(&pair[0], &pair[1]);
        }
        assert!(GraphIndex::build(&g).cycles().is_empty());

        let g = g.connect(&ids[n - 1], &ids[0]);
        let cycles = GraphIndex::build(&g).cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), n);
        assert_eq!(cycles[0][0], "n0");
    }

    #[test]
    fn duplicate_ids_index_first_occurrence() {
        let g = Graph::new()
            .with_node(Node::begin("a", "first"))
            .with_node(Node::begin("a", "second"));
        let index = GraphIndex::build(&g);
        assert_eq!(index.len(), 1);
        assert_eq!(index.node_at(0).data.entity.as_deref(), Some("first"));
    }
}
