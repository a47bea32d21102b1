use std::process::ExitCode;

use clap::Parser;

use itemhub::cli::{Cli, execute_command, init_logger_from_settings, load_config};

/// Exit status when a command is refused for a domain reason (not found, forbidden, ...).
const EXIT_REJECTED: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let settings = load_config(&cli)?;
    init_logger_from_settings(&settings, &cli)?;

    tracing::debug!(version = itemhub::pkg_version(), "Starting itemhub");
    match execute_command(&cli, settings).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) if err.is_client_error() => {
            tracing::warn!(error = %err, "Command rejected");
            Ok(ExitCode::from(EXIT_REJECTED))
        }
        Err(err) => Err(err.into()),
    }
}
