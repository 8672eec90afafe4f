//! archviz CLI entry point

use clap::Parser;
use archviz::cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries JSON
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("ARCHVIZ_LOG"))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze(args) => archviz::cli::analyze::run(args),
        Commands::Facts(args) => archviz::cli::analyze::run_facts(args),
        Commands::Callgraph(args) => archviz::cli::callgraph::run(args),
        Commands::Paths(args) => archviz::cli::callgraph::run_paths(args),
        Commands::Serve(args) => archviz::cli::serve::run(args).await,
    };

    if let Err(e) = result {
        eprintln!("\x1b[31m>\x1b[0m {}", e);
        std::process::exit(if e.is_user_error() { 2 } else { 1 });
    }
}
