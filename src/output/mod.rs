//! Output formatting
//!
//! Call-graph query results as serializable views, rendered either as
//! JSON or as plain text.
//!
//! @module output

pub mod human;
pub mod json;

use serde::Serialize;

use crate::extract::DeclarationKind;
use crate::graph::{paths_between_limited, reachable, CallEdge, CallGraph};

/// Output format for query commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

// =============================================================================
// VIEWS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: String,
    pub kind: DeclarationKind,
    pub defining_unit: String,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
}

/// Result of a reachability query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachableView {
    pub symbol: String,
    pub max_depth: usize,
    pub found: bool,
    /// Ordered by depth, then id
    pub nodes: Vec<NodeView>,
    /// Edges between reached nodes
    pub edges: Vec<CallEdge>,
}

/// Result of a path query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsView {
    pub start: String,
    pub end: String,
    pub max_depth: usize,
    pub found: bool,
    pub paths: Vec<Vec<String>>,
}

pub fn reachable_view(graph: &CallGraph, symbol: &str, max_depth: usize) -> ReachableView {
    let depths = reachable(graph, symbol, max_depth);

    let mut nodes: Vec<NodeView> = depths
        .iter()
        .filter_map(|(id, depth)| {
            graph.node(id).map(|node| NodeView {
                id: node.id.clone(),
                kind: node.kind,
                defining_unit: node.unit.clone(),
                line: node.line,
                depth: Some(*depth),
            })
        })
        .collect();
    nodes.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.id.cmp(&b.id)));

    let edges = graph
        .edges()
        .iter()
        .filter(|e| depths.contains_key(&e.caller) && depths.contains_key(&e.callee))
        .cloned()
        .collect();

    ReachableView {
        symbol: symbol.to_string(),
        max_depth,
        found: graph.contains(symbol),
        nodes,
        edges,
    }
}

pub fn paths_view(
    graph: &CallGraph,
    start: &str,
    end: &str,
    max_depth: usize,
    max_paths: usize,
) -> PathsView {
    PathsView {
        start: start.to_string(),
        end: end.to_string(),
        max_depth,
        found: graph.contains(start) && graph.contains(end),
        paths: paths_between_limited(graph, start, end, max_depth, max_paths),
    }
}

pub fn format_reachable(view: &ReachableView, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => human::format_reachable(view),
        OutputFormat::Json => json::format(view),
    }
}

pub fn format_paths(view: &PathsView, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => human::format_paths(view),
        OutputFormat::Json => json::format(view),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract_unit_with_calls, SourceUnit};
    use crate::graph::build_unit_graph;

    fn sample_graph() -> CallGraph {
        let code = "def a():\n    b()\n    c()\n\ndef b():\n    c()\n\ndef c():\n    pass\n\ndef lonely():\n    pass\n";
        let unit = extract_unit_with_calls(&SourceUnit::new("m", "m.py", code)).unwrap();
        build_unit_graph(&unit)
    }

    #[test]
    fn test_reachable_view_orders_by_depth() {
        let view = reachable_view(&sample_graph(), "a", 5);

        assert!(view.found);
        let ids: Vec<_> = view.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(view.nodes[2].depth, Some(1));
        assert_eq!(view.edges.len(), 3);
    }

    #[test]
    fn test_reachable_view_json_field_names() {
        let json = serde_json::to_value(reachable_view(&sample_graph(), "b", 1)).unwrap();
        assert_eq!(json["maxDepth"], 1);
        assert_eq!(json["nodes"][0]["definingUnit"], "m");
        assert_eq!(json["nodes"][0]["kind"], "function");
        assert_eq!(json["nodes"][1]["depth"], 1);
        assert_eq!(json["edges"][0]["caller"], "b");
    }

    #[test]
    fn test_unknown_symbol_view() {
        let view = reachable_view(&sample_graph(), "ghost", 5);
        assert!(!view.found);
        assert!(view.nodes.is_empty());
        assert!(view.edges.is_empty());

        let paths = paths_view(&sample_graph(), "a", "ghost", 5, 10);
        assert!(!paths.found);
        assert!(paths.paths.is_empty());
    }

    #[test]
    fn test_paths_view() {
        let view = paths_view(&sample_graph(), "a", "c", 5, 10);
        assert!(view.found);
        assert_eq!(view.paths, vec![vec!["a", "c"], vec!["a", "b", "c"]]);
    }
}
