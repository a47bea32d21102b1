//! CLI argument parsing with clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Environment;
use crate::services::cache::keys;

/// Operator tooling for the itemhub store and its cache
#[derive(Parser, Debug)]
#[command(name = "itemhub")]
#[command(about = "Operator tooling for the itemhub store and its cache")]
#[command(long_about = "
itemhub manages users, companies and items in PostgreSQL behind a
cache-aside layer (Redis or in-memory). This binary checks a deployment
and inspects or invalidates cache entries.

EXAMPLES:
    # Validate configuration and ping the database and cache
    itemhub check

    # Show a cached company
    itemhub cache get companies:company_id=7d0c4f0e-5f7a-4f53-9a57-0b1c2e4d9a11

    # Drop every cached company and item entry
    itemhub --env production cache invalidate companies items
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    ///
    /// Read only this TOML file (plus ITEMHUB_* variables) instead of the
    /// layered config/ directory.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection (ITEMHUB_APP_ENV)
    #[arg(short, long, value_enum)]
    pub env: Option<EnvArg>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration, then ping the database and the cache
    Check,
    /// Inspect or invalidate cache entries
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Print the decoded value stored under KEY
    Get {
        /// Full cache key, e.g. user:wile
        #[arg(value_parser = super::validation::validate_cache_key)]
        key: String,
    },
    /// Drop whole namespaces in a single pattern delete
    Invalidate {
        #[arg(required = true, value_enum)]
        namespaces: Vec<Namespace>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvArg {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

impl From<EnvArg> for Environment {
    fn from(env: EnvArg) -> Self {
        match env {
            EnvArg::Development => Environment::Development,
            EnvArg::Test => Environment::Test,
            EnvArg::Staging => Environment::Staging,
            EnvArg::Production => Environment::Production,
        }
    }
}

/// Key namespaces that can be invalidated as a whole.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Namespace {
    /// `user:*` detail entries
    User,
    /// `users:*` pages
    Users,
    Companies,
    Items,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::User => keys::USER,
            Namespace::Users => keys::USER_PAGES,
            Namespace::Companies => keys::COMPANIES,
            Namespace::Items => keys::ITEMS,
        }
    }
}

impl Cli {
    /// Log level forced by `--verbose` or `--quiet`.
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("error")
        } else {
            None
        }
    }
}
