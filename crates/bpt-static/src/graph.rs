//! Event flow graph
//!
//! Nodes are event names; an edge `A → B` labelled `H` means event handler
//! `H` handles `A` and registers `B`. Reachability is searched breadth-first
//! up to a hop limit, where each traversed edge is one handler hop.

use crate::descriptor::ArtifactDescriptor;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Directed event graph built from event handler descriptors
#[derive(Debug, Default)]
pub struct EventGraph {
    graph: DiGraph<String, String>,
    nodes: HashMap<String, NodeIndex>,
}

impl EventGraph {
    /// Create empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from every event handler descriptor
    #[must_use]
    pub fn from_handlers<'a, I>(handlers: I) -> Self
    where
        I: IntoIterator<Item = &'a ArtifactDescriptor>,
    {
        let mut graph = Self::new();
        for handler in handlers {
            let name = handler.class_name.clone().unwrap_or_default();
            for handled in &handler.handled_events {
                for registered in &handler.registered_events {
                    graph.add_handler(handled, registered, &name);
                }
            }
        }
        graph
    }

    /// Record that `handler` turns `from` into `to`
    pub fn add_handler(&mut self, from: &str, to: &str, handler: &str) {
        let from = self.node(from);
        let to = self.node(to);
        self.graph.add_edge(from, to, handler.to_string());
    }

    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True if some event in `targets` is one of `sources` or can be reached
    /// from them through at most `max_hops` handlers.
    #[must_use]
    pub fn reaches(
        &self,
        sources: &BTreeSet<String>,
        targets: &BTreeSet<String>,
        max_hops: usize,
    ) -> bool {
        if !sources.is_disjoint(targets) {
            return true;
        }

        let mut seen: BTreeSet<NodeIndex> = BTreeSet::new();
        let mut queue: VecDeque<(NodeIndex, usize)> = sources
            .iter()
            .filter_map(|s| self.nodes.get(s).copied())
            .map(|n| (n, 0))
            .collect();

        while let Some((node, hops)) = queue.pop_front() {
            if !seen.insert(node) {
                continue;
            }
            if targets.contains(&self.graph[node]) {
                return true;
            }
            if hops == max_hops {
                continue;
            }
            for next in self.graph.neighbors(node) {
                queue.push_back((next, hops + 1));
            }
        }
        false
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(index) = self.nodes.get(name) {
            return *index;
        }
        let index = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), index);
        index
    }
}
