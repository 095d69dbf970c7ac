//! testhook CLI - console host for the test-runner protocol engine

use std::path::PathBuf;

use clap::Parser;
use testhook::{cli, commands::Commands, common};

#[derive(Parser)]
#[command(name = "testhook", about = "Test runner adapter for native test binaries")]
#[command(version, long_about = None)]
struct Cli {
    /// Workspace directory containing testhook.toml
    #[arg(long, short, default_value = ".")]
    workspace: PathBuf,

    /// Explicit configuration file (defaults to <workspace>/testhook.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    common::logging::init_cli();

    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command, cli.workspace, cli.config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
