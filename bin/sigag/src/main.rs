//! sigag - epoch orchestrator and DKG party nodes.

use clap::Parser;
use eyre::Result;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    cli.run()
}
