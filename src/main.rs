use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use sitewright::{cli::Cli, runtime::Orchestrator, utils::init_logger};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logs go to stderr; RUST_LOG overrides the level
    init_logger(cli.verbose);

    Orchestrator::new(cli)?.run().await
}
