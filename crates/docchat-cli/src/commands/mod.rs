//! Command implementations

mod inspect;
mod query;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli, output: &OutputWriter) -> Result<()> {
    let overrides = cli.overrides();
    let config_path = cli.config.as_deref();

    match &cli.command {
        Commands::Query(args) => query::execute(args, config_path, overrides, output).await,
        Commands::Inspect(args) => inspect::execute(args, config_path, overrides, output).await,
    }
}
