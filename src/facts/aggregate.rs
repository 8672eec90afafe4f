//! Fact Aggregator
//!
//! Runs extraction over every unit, then derives the symbol table, call
//! graph, dependency edges, package grouping and summaries. A unit that
//! fails to read or parse is recorded and left out; the run continues.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use rayon::prelude::*;
use tracing::{info, warn};

use super::model::{
    AnalyzeResult, DependencyEdge, Diagnostics, FileInfo, PackageFacts, RepoFacts, UnitFailure,
};
use super::summarize::summarize_repo;
use crate::core::config::ScanConfig;
use crate::core::error::Result;
use crate::extract::{extract_unit_with_calls, ExtractedUnit, ModuleFacts, SourceUnit};
use crate::graph::{build_call_graph, CallGraph, SymbolTable};
use crate::scan::{resolve_root, scan_repository, to_package_name, ScannedFile};

/// One completed analysis run. Immutable once built.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub result: AnalyzeResult,
    pub symbols: SymbolTable,
    pub call_graph: CallGraph,
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Analyze a repository on disk.
///
/// Fails only when `root` is not an existing directory.
pub fn analyze_repository(root: &Path, config: &ScanConfig) -> Result<Analysis> {
    let root = resolve_root(root)?;
    let scanned = scan_repository(&root, config);
    Ok(analyze_scanned(&root, &scanned))
}

/// Analyze an already scanned file list
pub fn analyze_scanned(root: &Path, scanned: &[ScannedFile]) -> Analysis {
    let files: Vec<FileInfo> = scanned.iter().map(FileInfo::from).collect();

    let reads: Vec<std::result::Result<SourceUnit, UnitFailure>> = scanned
        .par_iter()
        .filter_map(|file| file.module.as_ref().map(|module| (file, module)))
        .map(|(file, module)| read_unit(file, module))
        .collect();

    let mut units = Vec::with_capacity(reads.len());
    let mut read_failures = Vec::new();
    for read in reads {
        match read {
            Ok(unit) => units.push(unit),
            Err(failure) => read_failures.push(failure),
        }
    }

    let mut analysis = analyze_units(&root.to_string_lossy(), files, &units);
    if !read_failures.is_empty() {
        analysis.result.diagnostics.units_failed += read_failures.len();
        read_failures.append(&mut analysis.result.failures);
        analysis.result.failures = read_failures;
    }
    analysis
}

/// Analyze an ordered list of source units.
///
/// Output order follows input order regardless of how extraction is
/// scheduled.
pub fn analyze_units(root: &str, files: Vec<FileInfo>, units: &[SourceUnit]) -> Analysis {
    let extracted: Vec<_> = units
        .par_iter()
        .map(|unit| (unit, extract_unit_with_calls(unit)))
        .collect();

    let mut parsed: Vec<ExtractedUnit> = Vec::with_capacity(extracted.len());
    let mut failures = Vec::new();
    for (unit, outcome) in extracted {
        match outcome {
            Ok(extracted) => parsed.push(extracted),
            Err(e) => {
                warn!(module = %unit.module, error = %e, "Parse failed, skipping unit");
                failures.push(UnitFailure::parse(&unit.module, &e));
            }
        }
    }

    let symbols = SymbolTable::from_modules(parsed.iter().map(|unit| &unit.facts));
    let (call_graph, stats) = build_call_graph(&parsed, &symbols);

    let modules: Vec<ModuleFacts> = parsed.into_iter().map(|unit| unit.facts).collect();
    let dependencies = dependency_edges(&modules);
    let packages = group_packages(&modules);

    let facts = RepoFacts {
        root: root.to_string(),
        files,
        modules,
        packages,
        dependencies,
    };
    let summaries = summarize_repo(&facts);

    let diagnostics = Diagnostics {
        units_analyzed: facts.modules.len(),
        units_failed: failures.len(),
        symbol_collisions: symbols.collisions(),
        call_sites: stats.call_sites,
        unresolved_calls: stats.unresolved,
        call_edges: call_graph.edge_count(),
    };

    info!(
        root,
        modules = diagnostics.units_analyzed,
        failed = diagnostics.units_failed,
        dependencies = facts.dependencies.len(),
        call_edges = diagnostics.call_edges,
        collisions = diagnostics.symbol_collisions,
        "Analysis complete"
    );

    Analysis {
        result: AnalyzeResult {
            facts,
            summaries,
            failures,
            diagnostics,
        },
        symbols,
        call_graph,
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn read_unit(file: &ScannedFile, module: &str) -> std::result::Result<SourceUnit, UnitFailure> {
    let path = file.path.to_string_lossy();
    if file.oversized {
        warn!(module, path = %path, size = file.size, "File too large, skipping unit");
        return Err(UnitFailure::too_large(module, &path, file.size));
    }
    match std::fs::read_to_string(&file.path) {
        Ok(text) => Ok(SourceUnit::new(module, &*path, text)),
        Err(e) => {
            warn!(module, path = %path, error = %e, "Read failed, skipping unit");
            Err(UnitFailure::read(module, &path, e.to_string()))
        }
    }
}

/// Import edges between known units, in module then import order
pub fn dependency_edges(modules: &[ModuleFacts]) -> Vec<DependencyEdge> {
    let known: HashSet<&str> = modules.iter().map(|m| m.module.as_str()).collect();

    let mut edges = Vec::new();
    for module in modules {
        for import in &module.imports {
            if known.contains(import.as_str()) {
                edges.push(DependencyEdge {
                    from_module: module.module.clone(),
                    to_module: import.clone(),
                });
            }
        }
    }
    edges
}

/// Group units by package key (`""` for top-level units)
pub fn group_packages(modules: &[ModuleFacts]) -> BTreeMap<String, PackageFacts> {
    let mut packages: BTreeMap<String, PackageFacts> = BTreeMap::new();
    for module in modules {
        let key = to_package_name(&module.module);
        packages
            .entry(key.clone())
            .or_insert_with(|| PackageFacts {
                package: key,
                modules: Vec::new(),
            })
            .modules
            .push(module.clone());
    }
    packages
}
