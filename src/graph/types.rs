//! Call Graph Data Structures
//!
//! Nodes are keyed by qualified declaration name. Edges are kept in
//! insertion order and never deduplicated: two call sites produce two
//! edges. Each node's `calls` / `called_by` lists mirror the edge list.
//!
//! @module graph/types

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::symbols::SymbolEntry;
use crate::extract::{Declaration, DeclarationKind};

// =============================================================================
// NODE
// =============================================================================

/// A declaration in the call graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallNode {
    pub id: String,
    pub kind: DeclarationKind,
    /// Qualified name of the defining unit
    pub unit: String,
    pub line: u32,
    /// Callee ids, one entry per edge
    pub calls: Vec<String>,
    /// Caller ids, one entry per edge
    pub called_by: Vec<String>,
}

impl CallNode {
    pub fn new(id: impl Into<String>, kind: DeclarationKind, unit: impl Into<String>, line: u32) -> Self {
        Self {
            id: id.into(),
            kind,
            unit: unit.into(),
            line,
            calls: Vec::new(),
            called_by: Vec::new(),
        }
    }

    pub fn from_declaration(decl: &Declaration) -> Self {
        Self::new(decl.name.clone(), decl.kind, decl.unit.clone(), decl.start_line)
    }

    pub fn from_symbol(id: &str, entry: &SymbolEntry) -> Self {
        Self::new(id, entry.kind, entry.unit.clone(), entry.start_line)
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// Directed call relationship (caller -> callee)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: String,
    pub callee: String,
}

impl CallEdge {
    pub fn new(caller: impl Into<String>, callee: impl Into<String>) -> Self {
        Self {
            caller: caller.into(),
            callee: callee.into(),
        }
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// Directed call graph over declarations
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    nodes: BTreeMap<String, CallNode>,
    edges: Vec<CallEdge>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. An existing node with the same id has its metadata
    /// overwritten; its adjacency lists are kept.
    pub fn add_node(&mut self, node: CallNode) {
        match self.nodes.entry(node.id.clone()) {
            Entry::Occupied(mut existing) => {
                let existing = existing.get_mut();
                existing.kind = node.kind;
                existing.unit = node.unit;
                existing.line = node.line;
            }
            Entry::Vacant(slot) => {
                slot.insert(CallNode {
                    calls: Vec::new(),
                    called_by: Vec::new(),
                    ..node
                });
            }
        }
    }

    /// Add an edge if both endpoints are nodes. Returns whether it was added.
    pub fn add_edge(&mut self, caller: &str, callee: &str) -> bool {
        if !self.nodes.contains_key(caller) || !self.nodes.contains_key(callee) {
            return false;
        }
        if let Some(node) = self.nodes.get_mut(caller) {
            node.calls.push(callee.to_string());
        }
        if let Some(node) = self.nodes.get_mut(callee) {
            node.called_by.push(caller.to_string());
        }
        self.edges.push(CallEdge::new(caller, callee));
        true
    }

    /// Merge another graph into this one.
    ///
    /// Node sets are unioned (later metadata wins) and edge lists are
    /// concatenated without deduplication.
    pub fn merge(&mut self, other: CallGraph) {
        for (_, node) in other.nodes {
            self.add_node(node);
        }
        for edge in other.edges {
            self.add_edge(&edge.caller, &edge.callee);
        }
    }

    pub fn node(&self, id: &str) -> Option<&CallNode> {
        self.nodes.get(id)
    }

    /// Existence check, separate from queries that return empty results
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = &CallNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    /// Outgoing callee ids, with one entry per edge
    pub fn callees(&self, id: &str) -> &[String] {
        self.nodes.get(id).map(|n| n.calls.as_slice()).unwrap_or(&[])
    }

    /// Incoming caller ids, with one entry per edge
    pub fn callers(&self, id: &str) -> &[String] {
        self.nodes
            .get(id)
            .map(|n| n.called_by.as_slice())
            .unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, unit: &str, line: u32) -> CallNode {
        CallNode::new(id, DeclarationKind::Function, unit, line)
    }

    fn fragment(ids: &[&str], edges: &[(&str, &str)]) -> CallGraph {
        let mut graph = CallGraph::new();
        for id in ids {
            graph.add_node(node(id, "m", 1));
        }
        for (caller, callee) in edges {
            graph.add_edge(caller, callee);
        }
        graph
    }

    #[test]
    fn test_edge_requires_both_nodes() {
        let mut graph = fragment(&["a"], &[]);
        assert!(!graph.add_edge("a", "missing"));
        assert!(!graph.add_edge("missing", "a"));
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.callees("a").is_empty());
    }

    #[test]
    fn test_duplicate_edges_preserved() {
        let graph = fragment(&["a", "b"], &[("a", "b"), ("a", "b")]);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.callees("a"), ["b", "b"]);
        assert_eq!(graph.callers("b"), ["a", "a"]);
    }

    #[test]
    fn test_merge_disjoint_sums_edges() {
        let mut left = fragment(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("a", "c")]);
        let right = fragment(&["x", "y"], &[("x", "y"), ("y", "x")]);

        left.merge(right);

        assert_eq!(left.node_count(), 5);
        assert_eq!(left.edge_count(), 5);
        assert_eq!(left.callees("y"), ["x"]);
    }

    #[test]
    fn test_merge_overwrites_metadata_keeps_adjacency() {
        let mut left = fragment(&["a", "shared"], &[("a", "shared")]);

        let mut right = CallGraph::new();
        right.add_node(node("shared", "other", 42));
        right.add_node(node("z", "other", 1));
        right.add_edge("z", "shared");

        left.merge(right);

        let shared = left.node("shared").unwrap();
        assert_eq!(shared.unit, "other");
        assert_eq!(shared.line, 42);
        assert_eq!(shared.called_by, vec!["a", "z"]);
        assert_eq!(left.edge_count(), 2);

        // Adjacency lists agree with the edge list
        let total_calls: usize = left.nodes().map(|n| n.calls.len()).sum();
        let total_callers: usize = left.nodes().map(|n| n.called_by.len()).sum();
        assert_eq!(total_calls, left.edge_count());
        assert_eq!(total_callers, left.edge_count());
    }

    #[test]
    fn test_unknown_node_lookups_are_empty() {
        let graph = CallGraph::new();
        assert!(!graph.contains("ghost"));
        assert!(graph.callees("ghost").is_empty());
        assert!(graph.callers("ghost").is_empty());
        assert!(graph.is_empty());
    }
}
