//! Call Graph Module
//!
//! Symbol table, call-graph construction and graph queries.
//!
//! @module graph

pub mod builder;
pub mod symbols;
pub mod traverse;
pub mod types;

pub use builder::{attribute_call_sites, build_call_graph, build_unit_graph, BuildStats, CallGraphBuilder};
pub use symbols::{SymbolEntry, SymbolTable};
pub use traverse::{
    paths_between, paths_between_limited, reachable, DEFAULT_MAX_PATHS, MAX_REACHABLE_NODES,
};
pub use types::{CallEdge, CallGraph, CallNode};
