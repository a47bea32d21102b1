//! Errors raised while loading and validating itemhub settings.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// `default.toml`, or the file named by `--config` / `ITEMHUB_CONFIG_FILE`, is missing.
    #[error("Required configuration file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error(
        "ITEMHUB_CONFIG_DIR ({}) and ITEMHUB_CONFIG_FILE ({}) cannot both be set. \
         Use the directory for layered configuration or the file for a single source.",
        dir.display(),
        file.display()
    )]
    ConflictingSources { dir: PathBuf, file: PathBuf },

    /// `ITEMHUB_APP_ENV` or `--env` named no known environment.
    #[error(
        "Invalid environment '{0}'. Valid values are: development, test, staging, production"
    )]
    UnknownEnvironment(String),

    /// The merged sources do not fit the `Settings` shape.
    #[error("Failed to deserialize settings: {0}")]
    Deserialize(#[source] config::ConfigError),

    /// A setting parsed but is out of range. `field` is the dotted key, e.g. `cache.default_ttl_seconds`.
    #[error("Invalid setting {field}: {message}")]
    Invalid { field: String, message: String },

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Dotted key of the offending setting, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}
