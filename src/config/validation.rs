//! Configuration validation logic
//!
//! Validation methods for every configuration section, run by the loader
//! after deserialization.

use crate::cache::MAX_TTL_SECONDS;
use crate::config::error::ConfigError;
use crate::config::settings::{
    CacheBackend, CacheConfig, DatabaseConfig, FileSettings, LoggerSettings, RedisCacheConfig,
    Settings,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// # Validation Rules
    /// - URL must not be empty and must use a PostgreSQL scheme
    /// - Max and min connections must be greater than 0
    /// - Min connections must not exceed max connections
    /// - Connection timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::invalid(
                "database.url",
                "Database URL is required. Please specify a valid database connection string.",
            ));
        }

        if !self.is_valid_database_url() {
            return Err(ConfigError::invalid(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::invalid(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections == 0 {
            return Err(ConfigError::invalid(
                "database.min_connections",
                "Min connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::invalid(
                "database.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }

    fn is_valid_database_url(&self) -> bool {
        ["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
    }
}

impl RedisCacheConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.url.starts_with("redis://") || self.url.starts_with("rediss://")) {
            return Err(ConfigError::invalid(
                "cache.redis.url",
                "Invalid Redis URL. Expected format: redis://[user:password@]host[:port][/db] or rediss://...",
            ));
        }

        if self.pool_size == 0 {
            return Err(ConfigError::invalid(
                "cache.redis.pool_size",
                "Pool size must be greater than 0.",
            ));
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::invalid(
                "cache.redis.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl CacheConfig {
    /// Validate cache configuration
    ///
    /// Redis settings are only checked when Redis is the selected backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_ttl_seconds == 0 {
            return Err(ConfigError::invalid(
                "cache.default_ttl_seconds",
                "Default TTL must be greater than 0 seconds.",
            ));
        }

        if self.default_ttl_seconds > MAX_TTL_SECONDS {
            return Err(ConfigError::Invalid {
                field: "cache.default_ttl_seconds".to_string(),
                message: format!("Default TTL cannot exceed {MAX_TTL_SECONDS} seconds."),
            });
        }

        if self.backend == CacheBackend::Redis {
            self.redis.validate()?;
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::invalid(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::invalid(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()?;

        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.cache.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_database() -> DatabaseConfig {
        DatabaseConfig {
            url: "postgres://localhost/itemhub".to_string(),
            ..Default::default()
        }
    }

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::Invalid { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_database_config_valid() {
        assert!(valid_database().validate().is_ok());
    }

    #[test]
    fn test_database_config_empty_url() {
        let err = DatabaseConfig::default().validate().unwrap_err();
        assert_eq!(field_of(err), "database.url");
    }

    #[test]
    fn test_database_config_rejects_non_postgres() {
        let config = DatabaseConfig {
            url: "mysql://localhost/db".to_string(),
            ..valid_database()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "database.url");
    }

    #[test]
    fn test_database_config_min_exceeds_max() {
        let config = DatabaseConfig {
            max_connections: 2,
            min_connections: 5,
            ..valid_database()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cannot exceed"));
    }

    #[test]
    fn test_cache_config_zero_ttl() {
        let config = CacheConfig {
            default_ttl_seconds: 0,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "cache.default_ttl_seconds"
        );
    }

    #[test]
    fn test_cache_config_ttl_upper_bound() {
        let config = CacheConfig {
            default_ttl_seconds: 10_000_000_000_000_000_000,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "cache.default_ttl_seconds"
        );

        let config = CacheConfig {
            default_ttl_seconds: MAX_TTL_SECONDS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_config_redis_url_checked_only_for_redis() {
        let mut config = CacheConfig::default();
        config.redis.url = "http://localhost".to_string();
        assert_eq!(field_of(config.validate().unwrap_err()), "cache.redis.url");

        config.backend = CacheBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_config_accepts_tls_url() {
        let mut config = CacheConfig::default();
        config.redis.url = "rediss://cache:6380".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logger_settings_invalid_level() {
        let settings = LoggerSettings {
            level: "verbose".to_string(),
            ..Default::default()
        };
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger.level");
    }

    #[test]
    fn test_logger_settings_needs_an_output() {
        let mut settings = LoggerSettings::default();
        settings.console.enabled = false;
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger");
    }

    #[test]
    fn test_logger_settings_enabled_file_needs_path() {
        let mut settings = LoggerSettings::default();
        settings.file.enabled = true;
        settings.file.path = "  ".to_string();
        assert_eq!(
            field_of(settings.validate().unwrap_err()),
            "logger.file.path"
        );
    }

    #[test]
    fn test_settings_validate_reports_first_error() {
        let settings = Settings::default();
        assert_eq!(field_of(settings.validate().unwrap_err()), "database.url");

        let settings = Settings {
            database: valid_database(),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }
}
