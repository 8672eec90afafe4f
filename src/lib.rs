//! archviz - Architecture facts and call graphs for Python codebases
//!
//! Scans a repository, extracts declarations and imports from every Python
//! module, aggregates them into repository facts and summaries, and builds
//! a name-resolved call graph with bounded reachability and path queries.

pub mod cache;
pub mod cli;
pub mod core;
pub mod extract;
pub mod facts;
pub mod graph;
pub mod output;
pub mod scan;
pub mod web;

pub use core::config::Config;
pub use core::error::{Error, Result};
