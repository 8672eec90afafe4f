//! Serve command implementation
//!
//! Starts the HTTP API.
//!
//! @module cli/serve

use clap::Args;
use std::path::PathBuf;

use crate::core::config::Config;
use crate::core::error::Result;

/// Arguments for the serve command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    archviz serve                         Serve on 127.0.0.1:8000
    archviz serve ~/src/app --port 9000   Default root for /callgraph queries
    archviz serve --host 0.0.0.0          Listen on all interfaces")]
pub struct ServeArgs {
    /// Default repository root for call-graph queries without `root`
    pub path: Option<PathBuf>,

    /// Address to bind (default from config, 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to serve on (default from config, 8000)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    crate::web::server::run(config, args.path).await
}
