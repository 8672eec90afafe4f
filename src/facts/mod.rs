//! Repository Facts
//!
//! Aggregation of per-unit extraction results into repository-wide facts,
//! summaries and the visualization graph.
//!
//! @module facts

pub mod aggregate;
pub mod model;
pub mod summarize;
pub mod visual;

pub use aggregate::{analyze_repository, analyze_scanned, analyze_units, Analysis};
pub use model::{
    AnalyzeResult, DependencyEdge, Diagnostics, FailureKind, FileInfo, PackageFacts, RepoFacts,
    Summaries, UnitFailure,
};
pub use visual::{visual_facts, VisualFacts};
