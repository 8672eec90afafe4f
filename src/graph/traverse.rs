//! Graph Query Engine
//!
//! Breadth-first reachability and simple-path enumeration over a
//! [`CallGraph`]. Unknown start or end nodes yield empty results rather
//! than errors; callers use [`CallGraph::contains`] to tell the cases apart.
//!
//! @module graph/traverse

use std::collections::{BTreeMap, HashSet, VecDeque};

use tracing::debug;

use super::types::CallGraph;

/// Soft cap on the number of nodes `reachable` records. Checked before
/// each expansion, so the result may exceed it by one node's fan-out.
pub const MAX_REACHABLE_NODES: usize = 100;

/// Cap on the number of paths `paths_between` returns
pub const DEFAULT_MAX_PATHS: usize = 1000;

// =============================================================================
// REACHABILITY
// =============================================================================

/// Nodes reachable from `start` within `max_depth` edges, each with its
/// shortest distance from `start`.
///
/// Includes `start` at depth 0. Returns an empty map when `start` is not a
/// node of the graph.
pub fn reachable(graph: &CallGraph, start: &str, max_depth: usize) -> BTreeMap<String, usize> {
    let mut depths = BTreeMap::new();
    if !graph.contains(start) {
        return depths;
    }

    let mut queue = VecDeque::new();
    depths.insert(start.to_string(), 0);
    queue.push_back((start.to_string(), 0usize));

    while let Some((id, depth)) = queue.pop_front() {
        if depths.len() >= MAX_REACHABLE_NODES {
            debug!(start, nodes = depths.len(), "Reachability cap hit");
            break;
        }
        if depth >= max_depth {
            continue;
        }
        for callee in graph.callees(&id) {
            if !depths.contains_key(callee) {
                depths.insert(callee.clone(), depth + 1);
                queue.push_back((callee.clone(), depth + 1));
            }
        }
    }

    depths
}

// =============================================================================
// PATH ENUMERATION
// =============================================================================

/// All simple paths from `start` to `end` of at most `max_depth` edges,
/// capped at [`DEFAULT_MAX_PATHS`].
///
/// Dominated paths are not pruned, so on dense graphs the number of paths
/// grows exponentially with `max_depth`.
pub fn paths_between(
    graph: &CallGraph,
    start: &str,
    end: &str,
    max_depth: usize,
) -> Vec<Vec<String>> {
    paths_between_limited(graph, start, end, max_depth, DEFAULT_MAX_PATHS)
}

/// Like [`paths_between`] with an explicit cap on the number of paths.
///
/// Paths come out shortest first. A path stops at its first arrival at
/// `end`, and parallel edges do not produce duplicate paths. When
/// `start == end` the single path `[start]` is returned.
pub fn paths_between_limited(
    graph: &CallGraph,
    start: &str,
    end: &str,
    max_depth: usize,
    max_paths: usize,
) -> Vec<Vec<String>> {
    let mut paths = Vec::new();
    if !graph.contains(start) || !graph.contains(end) || max_paths == 0 {
        return paths;
    }

    let mut queue: VecDeque<Vec<String>> = VecDeque::new();
    queue.push_back(vec![start.to_string()]);

    while let Some(path) = queue.pop_front() {
        let Some(last) = path.last() else {
            continue;
        };

        if last == end {
            paths.push(path);
            if paths.len() >= max_paths {
                debug!(start, end, paths = paths.len(), "Path cap hit");
                break;
            }
            continue;
        }

        // Edges so far = nodes - 1
        if path.len() > max_depth {
            continue;
        }

        let mut seen = HashSet::new();
        for callee in graph.callees(last) {
            if !seen.insert(callee.as_str()) || path.contains(callee) {
                continue;
            }
            let mut next = path.clone();
            next.push(callee.clone());
            queue.push_back(next);
        }
    }

    paths
}
