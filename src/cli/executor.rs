//! Command executor for dispatching CLI commands

use super::handlers::{CacheCommandHandler, CheckCommandHandler};
use super::parser::{CacheCommand, Cli, Commands};
use crate::config::settings::Settings;
use crate::error::AppResult;

/// Execute a CLI command with the given settings
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    match &cli.command {
        Commands::Check => CheckCommandHandler::new(settings).execute().await,
        Commands::Cache { action } => {
            let handler = CacheCommandHandler::from_settings(&settings).await?;
            match action {
                CacheCommand::Get { key } => {
                    match handler.get(key).await? {
                        Some(value) => println!("{value}"),
                        None => println!("(absent) {key}"),
                    }
                    Ok(())
                }
                CacheCommand::Invalidate { namespaces } => {
                    let deleted = handler.invalidate(namespaces).await?;
                    println!("Deleted {deleted} cache entries");
                    Ok(())
                }
            }
        }
    }
}
