//! CLI command definitions and handlers

pub mod analyze;
pub mod callgraph;
pub mod serve;

use clap::{Parser, Subcommand};

const LONG_ABOUT: &str = r#"
Static architecture facts and call graphs for Python repositories.

Scans a repository, extracts classes, functions, methods and imports from
every Python module, and builds a name-resolved call graph you can query.

COMMANDS:
    archviz analyze <path>            Facts + summaries as JSON
    archviz facts <path>              Module/package graph as JSON
    archviz callgraph <path> -s NAME  What NAME calls, transitively
    archviz paths <path> --start A --end B
                                      Call paths between two declarations
    archviz serve [path]              HTTP API

Methods are addressed as Class.method. Set ARCHVIZ_LOG=debug for logs
(written to stderr).
"#;

/// Architecture facts and call graphs for Python repositories
#[derive(Parser, Debug)]
#[command(name = "archviz")]
#[command(author, version)]
#[command(about = "Architecture facts and call graphs for Python repositories")]
#[command(long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a repository and print facts + summaries JSON
    #[command(visible_alias = "a")]
    Analyze(analyze::AnalyzeArgs),

    /// Print the module/package graph used for visualization
    Facts(analyze::FactsArgs),

    /// Show everything a declaration calls, up to a depth
    #[command(visible_alias = "cg")]
    Callgraph(callgraph::CallgraphArgs),

    /// List call paths between two declarations
    Paths(callgraph::PathsArgs),

    /// Run the HTTP API server
    Serve(serve::ServeArgs),
}
