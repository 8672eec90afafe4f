//! Call graph query commands
//!
//! `archviz callgraph` runs a bounded reachability query from one
//! declaration; `archviz paths` enumerates call paths between two.
//!
//! @module cli/callgraph

use clap::Args;
use std::path::PathBuf;
use tracing::debug;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::facts::analyze_repository;
use crate::output::{format_paths, format_reachable, paths_view, reachable_view, OutputFormat};

/// Arguments for the callgraph command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    archviz callgraph . -s main                 Everything main calls
    archviz callgraph . -s Worker.run -d 2      Two levels down
    archviz callgraph . -s main --json          JSON output")]
pub struct CallgraphArgs {
    /// Repository root
    pub path: PathBuf,

    /// Declaration to start from (functions by name, methods as Class.method)
    #[arg(short, long)]
    pub symbol: String,

    /// Maximum call depth (default from config, 5)
    #[arg(short = 'd', long)]
    pub max_depth: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the paths command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    archviz paths . --start main --end save     How main reaches save
    archviz paths . --start a --end b -d 3 --json")]
pub struct PathsArgs {
    /// Repository root
    pub path: PathBuf,

    /// Caller end of the paths
    #[arg(long)]
    pub start: String,

    /// Callee end of the paths
    #[arg(long)]
    pub end: String,

    /// Maximum number of calls per path (default from config, 5)
    #[arg(short = 'd', long)]
    pub max_depth: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the callgraph command
pub fn run(args: CallgraphArgs) -> Result<()> {
    let config = Config::load()?;
    let max_depth = args.max_depth.unwrap_or(config.query.default_max_depth);
    let analysis = analyze_repository(&args.path, &config.scan)?;

    debug!(symbol = %args.symbol, max_depth, "Reachability query");
    let view = reachable_view(&analysis.call_graph, &args.symbol, max_depth);
    print!("{}", with_newline(format_reachable(&view, OutputFormat::from_json_flag(args.json))));
    Ok(())
}

/// Run the paths command
pub fn run_paths(args: PathsArgs) -> Result<()> {
    let config = Config::load()?;
    let max_depth = args.max_depth.unwrap_or(config.query.default_max_depth);
    let analysis = analyze_repository(&args.path, &config.scan)?;

    debug!(start = %args.start, end = %args.end, max_depth, "Path query");
    let view = paths_view(
        &analysis.call_graph,
        &args.start,
        &args.end,
        max_depth,
        config.query.max_paths,
    );
    print!("{}", with_newline(format_paths(&view, OutputFormat::from_json_flag(args.json))));
    Ok(())
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
