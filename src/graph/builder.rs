//! Call Graph Builder
//!
//! Builds one call-graph fragment per unit and merges fragments into a
//! repository-wide graph. Call sites are reduced to bare callee names,
//! attributed to their tightest enclosing function or method, and resolved
//! by name against the unit's own declarations and then the symbol table.
//!
//! @module graph/builder

use rayon::prelude::*;
use tracing::{debug, info};

use super::symbols::SymbolTable;
use super::types::{CallGraph, CallNode};
use crate::extract::{CallSite, Declaration, ExtractedUnit, ModuleFacts};

// =============================================================================
// STATS
// =============================================================================

/// Counters gathered while building a graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub units: usize,
    pub call_sites: usize,
    /// Call sites outside every function/method span
    pub unattributed: usize,
    /// Attributed call sites whose callee is not a known declaration
    pub unresolved: usize,
    pub edges: usize,
}

impl BuildStats {
    fn absorb(&mut self, other: BuildStats) {
        self.units += other.units;
        self.call_sites += other.call_sites;
        self.unattributed += other.unattributed;
        self.unresolved += other.unresolved;
        self.edges += other.edges;
    }
}

impl std::fmt::Display for BuildStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} units, {} call sites, {} edges, {} unresolved",
            self.units, self.call_sites, self.edges, self.unresolved
        )
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builds per-unit call-graph fragments against a shared symbol table
pub struct CallGraphBuilder<'a> {
    symbols: &'a SymbolTable,
}

impl<'a> CallGraphBuilder<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self { symbols }
    }

    /// Build the fragment for one unit.
    ///
    /// The fragment holds a node per declaration of the unit, plus a node
    /// for every other-unit declaration it calls (carrying the symbol
    /// table's metadata).
    pub fn build_fragment(&self, facts: &ModuleFacts, sites: &[CallSite]) -> (CallGraph, BuildStats) {
        let decls = facts.declarations();
        let mut graph = CallGraph::new();
        for decl in &decls {
            graph.add_node(CallNode::from_declaration(decl));
        }

        let lines: Vec<u32> = sites.iter().map(|s| s.line).collect();
        let owners = attribute_call_sites(&decls, &lines);

        let mut stats = BuildStats {
            units: 1,
            call_sites: sites.len(),
            ..Default::default()
        };

        for (site, owner) in sites.iter().zip(owners) {
            let Some(owner) = owner else {
                stats.unattributed += 1;
                continue;
            };

            if !graph.contains(&site.callee) {
                match self.symbols.get(&site.callee) {
                    Some(entry) => graph.add_node(CallNode::from_symbol(&site.callee, entry)),
                    None => {
                        stats.unresolved += 1;
                        continue;
                    }
                }
            }

            if graph.add_edge(&decls[owner].name, &site.callee) {
                stats.edges += 1;
            }
        }

        debug!(
            module = %facts.module,
            call_sites = stats.call_sites,
            edges = stats.edges,
            unresolved = stats.unresolved,
            "Built call graph fragment"
        );

        (graph, stats)
    }
}

/// Build a fragment for a single unit, resolving only against its own
/// declarations.
pub fn build_unit_graph(unit: &ExtractedUnit) -> CallGraph {
    let symbols = SymbolTable::from_modules([&unit.facts]);
    let (graph, _) = CallGraphBuilder::new(&symbols).build_fragment(&unit.facts, &unit.call_sites);
    graph
}

/// Build the repository call graph.
///
/// Fragments are built in parallel and merged in input order, so the
/// result does not depend on scheduling.
pub fn build_call_graph(units: &[ExtractedUnit], symbols: &SymbolTable) -> (CallGraph, BuildStats) {
    info!(units = units.len(), "Building call graph");

    let builder = CallGraphBuilder::new(symbols);
    let fragments: Vec<_> = units
        .par_iter()
        .map(|unit| builder.build_fragment(&unit.facts, &unit.call_sites))
        .collect();

    let mut graph = CallGraph::new();
    let mut stats = BuildStats::default();
    for (fragment, fragment_stats) in fragments {
        graph.merge(fragment);
        stats.absorb(fragment_stats);
    }

    info!(
        %stats,
        nodes = graph.node_count(),
        "Call graph complete"
    );

    (graph, stats)
}

// =============================================================================
// ENCLOSING DECLARATION LOOKUP
// =============================================================================

/// For each call line, the index (into `decls`) of the tightest enclosing
/// function or method, if any.
///
/// Runs as one sweep in line order over declarations sorted by start line,
/// keeping the currently open spans on a stack. Assumes spans nest, which
/// holds for parsed source. On identical spans the first-declared wins.
pub fn attribute_call_sites(decls: &[Declaration], lines: &[u32]) -> Vec<Option<usize>> {
    let mut candidates: Vec<usize> = (0..decls.len())
        .filter(|&i| decls[i].kind.is_callable())
        .collect();
    // Outer spans before inner ones; among identical spans the earliest
    // declaration is pushed last so it ends up on top.
    candidates.sort_by(|&a, &b| {
        decls[a]
            .start_line
            .cmp(&decls[b].start_line)
            .then(decls[b].end_line.cmp(&decls[a].end_line))
            .then(b.cmp(&a))
    });

    let mut order: Vec<usize> = (0..lines.len()).collect();
    order.sort_by_key(|&i| lines[i]);

    let mut owners = vec![None; lines.len()];
    let mut open: Vec<usize> = Vec::new();
    let mut next = 0;

    for i in order {
        let line = lines[i];
        while next < candidates.len() && decls[candidates[next]].start_line <= line {
            open.push(candidates[next]);
            next += 1;
        }
        while let Some(&top) = open.last() {
            if decls[top].end_line < line {
                open.pop();
            } else {
                break;
            }
        }
        owners[i] = open.last().copied();
    }

    owners
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract_unit_with_calls, DeclarationKind, SourceUnit};
    use crate::graph::traverse::{paths_between, reachable};

    fn unit(module: &str, code: &str) -> ExtractedUnit {
        extract_unit_with_calls(&SourceUnit::new(module, format!("{}.py", module), code)).unwrap()
    }

    fn decl(name: &str, kind: DeclarationKind, start: u32, end: u32) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind,
            signature: None,
            decorators: Vec::new(),
            unit: "m".to_string(),
            path: "m.py".to_string(),
            start_line: start,
            end_line: end,
        }
    }

    #[test]
    fn test_simple_call_edge() {
        let graph = build_unit_graph(&unit("m", "def a():\n    b()\n\ndef b():\n    pass\n"));

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges()[0].caller, "a");
        assert_eq!(graph.edges()[0].callee, "b");
    }

    #[test]
    fn test_one_line_definitions_end_to_end() {
        let graph = build_unit_graph(&unit("m", "def a(): b()\ndef b(): pass\n"));

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges()[0].caller, "a");
        assert_eq!(graph.edges()[0].callee, "b");

        let depths = reachable(&graph, "a", 1);
        assert_eq!(depths.len(), 2);
        assert_eq!(depths["a"], 0);
        assert_eq!(depths["b"], 1);

        assert_eq!(paths_between(&graph, "a", "b", 5), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_unknown_callee_adds_no_edge() {
        let graph = build_unit_graph(&unit("m", "def a():\n    unknown_fn()\n"));

        assert!(graph.contains("a"));
        assert_eq!(graph.node_count(), 1);
        assert!(graph.callees("a").is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_module_level_calls_are_dropped() {
        let m = unit("m", "def main():\n    pass\n\nif __name__ == '__main__':\n    main()\n");
        let symbols = SymbolTable::from_modules([&m.facts]);
        let (graph, stats) = CallGraphBuilder::new(&symbols).build_fragment(&m.facts, &m.call_sites);

        assert_eq!(graph.edge_count(), 0);
        assert_eq!(stats.call_sites, 1);
        assert_eq!(stats.unattributed, 1);
    }

    #[test]
    fn test_method_call_resolves_by_bare_name_only() {
        let code = r#"
class User:
    pass

class UserManager:
    def add_user(self, user):
        self.users.append(user)

def create_user():
    return User()

def main():
    manager = UserManager()
    user = create_user()
    manager.add_user(user)
"#;
        let graph = build_unit_graph(&unit("sample", code));

        let mut callees: Vec<_> = graph.callees("main").to_vec();
        callees.sort();
        // `add_user` is not a node (methods are `UserManager.add_user`)
        assert_eq!(callees, vec!["UserManager", "create_user"]);
        assert_eq!(graph.callees("create_user"), ["User"]);
        assert!(graph.callees("UserManager.add_user").is_empty());
    }

    #[test]
    fn test_repeated_calls_make_repeated_edges() {
        let graph = build_unit_graph(&unit("m", "def a():\n    b()\n    b()\n\ndef b():\n    pass\n"));
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.callers("b"), ["a", "a"]);
    }

    #[test]
    fn test_nested_function_calls_attribute_to_outer() {
        let code = "def outer():\n    def inner():\n        helper()\n    return inner\n\ndef helper():\n    pass\n";
        let graph = build_unit_graph(&unit("m", code));
        assert_eq!(graph.callees("outer"), ["helper"]);
    }

    #[test]
    fn test_cross_unit_resolution_through_symbol_table() {
        let units = vec![
            unit("lib", "def helper():\n    pass\n"),
            unit("app", "def main():\n    helper()\n"),
        ];
        let symbols = SymbolTable::from_modules(units.iter().map(|u| &u.facts));

        let (graph, stats) = build_call_graph(&units, &symbols);

        assert_eq!(stats.units, 2);
        assert_eq!(stats.edges, 1);
        assert_eq!(graph.callees("main"), ["helper"]);
        assert_eq!(graph.node("helper").unwrap().unit, "lib");
    }

    #[test]
    fn test_attribution_picks_tightest_span() {
        let decls = vec![
            decl("Outer", DeclarationKind::Class, 1, 20),
            decl("Outer.big", DeclarationKind::Method, 2, 10),
            decl("Outer.small", DeclarationKind::Method, 11, 12),
            decl("wide", DeclarationKind::Function, 30, 50),
            decl("narrow", DeclarationKind::Function, 35, 40),
        ];
        let owners = attribute_call_sites(&decls, &[45, 3, 1, 12, 36, 15, 99]);

        assert_eq!(owners, vec![Some(3), Some(1), None, Some(2), Some(4), None, None]);
    }

    #[test]
    fn test_attribution_equal_spans_first_declared_wins() {
        let decls = vec![
            decl("first", DeclarationKind::Function, 5, 9),
            decl("second", DeclarationKind::Function, 5, 9),
        ];
        assert_eq!(attribute_call_sites(&decls, &[7]), vec![Some(0)]);
    }

    #[test]
    fn test_attribution_matches_brute_force() {
        let decls = vec![
            decl("a", DeclarationKind::Function, 1, 30),
            decl("b", DeclarationKind::Function, 2, 8),
            decl("c", DeclarationKind::Function, 3, 4),
            decl("d", DeclarationKind::Function, 10, 25),
            decl("e", DeclarationKind::Function, 12, 12),
            decl("f", DeclarationKind::Function, 40, 41),
        ];
        let lines: Vec<u32> = (0..45).collect();
        let owners = attribute_call_sites(&decls, &lines);

        for (i, line) in lines.iter().enumerate() {
            let expected = decls
                .iter()
                .enumerate()
                .filter(|(_, d)| d.contains_line(*line))
                .min_by_key(|(idx, d)| (d.span(), *idx))
                .map(|(idx, _)| idx);
            assert_eq!(owners[i], expected, "line {}", line);
        }
    }
}
