//! Command-line interface: argument parsing, configuration loading and
//! command dispatch.

pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use executor::execute_command;
pub use parser::{CacheCommand, Cli, Commands, EnvArg, Namespace};

use crate::config::{ConfigError, ConfigLoader, Settings};
use crate::logger::init_logger;

/// Load settings, applying `--config` and `--env` on top of the environment.
pub fn load_config(cli: &Cli) -> Result<Settings, ConfigError> {
    let mut loader = ConfigLoader::new()?;
    if let Some(env) = cli.env {
        loader = loader.with_environment(env.into());
    }
    if let Some(path) = &cli.config {
        loader = loader.with_config_file(path);
    }
    loader.load()
}

/// Install the global subscriber. `--verbose` / `--quiet` override the configured level.
pub fn init_logger_from_settings(settings: &Settings, cli: &Cli) -> anyhow::Result<()> {
    let mut logger_config = settings.logger.clone().into_logger_config()?;
    if let Some(level) = cli.log_level_override() {
        logger_config = logger_config.with_level(level);
    }
    init_logger(logger_config)?;
    Ok(())
}
