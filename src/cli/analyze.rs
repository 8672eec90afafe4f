//! Analyze and facts commands
//!
//! @module cli/analyze

use clap::Args;
use std::path::PathBuf;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::facts::{analyze_repository, visual_facts};
use crate::output::json;

/// Arguments for the analyze command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    archviz analyze .                 Analyze the current directory
    archviz analyze ~/src/app > out.json")]
pub struct AnalyzeArgs {
    /// Repository root
    pub path: PathBuf,
}

/// Arguments for the facts command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    archviz facts .                   Module/package nodes and edges")]
pub struct FactsArgs {
    /// Repository root
    pub path: PathBuf,
}

/// Run the analyze command
pub fn run(args: AnalyzeArgs) -> Result<()> {
    let config = Config::load()?;
    let analysis = analyze_repository(&args.path, &config.scan)?;
    println!("{}", json::format(&analysis.result));
    Ok(())
}

/// Run the facts command
pub fn run_facts(args: FactsArgs) -> Result<()> {
    let config = Config::load()?;
    let analysis = analyze_repository(&args.path, &config.scan)?;
    println!("{}", json::format(&visual_facts(&analysis.result.facts)));
    Ok(())
}
