//! Layered configuration loader
//!
//! Sources, lowest priority first:
//! 1. `default.toml` (required)
//! 2. `{environment}.toml` (optional)
//! 3. `local.toml` (optional)
//! 4. `ITEMHUB_*` environment variables

use std::path::{Path, PathBuf};

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for configuration directory
const CONFIG_DIR_ENV: &str = "ITEMHUB_CONFIG_DIR";

/// Environment variable for a single configuration file
const CONFIG_FILE_ENV: &str = "ITEMHUB_CONFIG_FILE";

const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "ITEMHUB";

/// Separator for nested keys: `ITEMHUB_CACHE__DEFAULT_TTL_SECONDS` -> `cache.default_ttl_seconds`
const ENV_SEPARATOR: &str = "__";

#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// When set, only this file is read (plus environment variables)
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a loader from `ITEMHUB_CONFIG_DIR`, `ITEMHUB_CONFIG_FILE` and `ITEMHUB_APP_ENV`.
    ///
    /// # Errors
    ///
    /// `ITEMHUB_CONFIG_DIR` and `ITEMHUB_CONFIG_FILE` are mutually exclusive.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from);
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if let (Some(dir), Some(file)) = (&config_dir, &config_file) {
            return Err(ConfigError::ConflictingSources {
                dir: dir.clone(),
                file: file.clone(),
            });
        }

        Ok(Self {
            config_dir: config_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Layered loading from `dir`.
    pub fn from_dir(dir: impl Into<PathBuf>, environment: AppEnvironment) -> Self {
        Self {
            config_dir: dir.into(),
            config_file: None,
            environment,
        }
    }

    /// Switch to single-file mode, e.g. from `--config`.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Override the environment, e.g. from `--env`.
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load, deserialize and validate.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(ConfigError::Deserialize)?;

        settings.validate()?;

        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = match &self.config_file {
            Some(config_file) => Self::add_file_source(builder, config_file, true)?,
            None => self.build_layered_config(builder)?,
        };

        Self::add_env_source(builder)
            .build()
            .map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let default_path = self.config_dir.join("default.toml");
        let builder = Self::add_file_source(builder, &default_path, true)?;

        let env_path = self
            .config_dir
            .join(format!("{}.toml", self.environment.as_str()));
        let builder = Self::add_file_source(builder, &env_path, false)?;

        let local_path = self.config_dir.join("local.toml");
        Self::add_file_source(builder, &local_path, false)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::MissingFile {
                path: path.to_path_buf(),
            });
        }

        let source = File::from(path).format(FileFormat::Toml).required(required);
        Ok(builder.add_source(source))
    }

    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::CacheBackend;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests touching process environment run one at a time.
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    const DEFAULT_TOML: &str = r#"
        [database]
        url = "postgres://localhost/itemhub"

        [cache]
        backend = "redis"
        default_ttl_seconds = 3600
    "#;

    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).expect("Failed to write config file");
        }
        temp_dir
    }

    /// Sets variables for the duration of a test and restores them on drop.
    struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self {
                vars_to_restore: Vec::new(),
            }
        }

        fn set(&mut self, key: &str, value: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        fn remove(&mut self, key: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original_value) in self.vars_to_restore.iter().rev() {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_missing_default_toml() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let dir = setup_config_dir(&[]);
        let result = ConfigLoader::from_dir(dir.path(), AppEnvironment::Development).load();
        match result {
            Err(ConfigError::MissingFile { path }) => {
                assert_eq!(path, dir.path().join("default.toml"));
            }
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn test_load_default_only() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let dir = setup_config_dir(&[("default.toml", DEFAULT_TOML)]);
        let settings = ConfigLoader::from_dir(dir.path(), AppEnvironment::Development)
            .load()
            .unwrap();
        assert_eq!(settings.database.url, "postgres://localhost/itemhub");
        assert_eq!(settings.cache.default_ttl_seconds, 3600);
        assert_eq!(settings.logger.level, "info");
    }

    #[test]
    fn test_environment_and_local_layers() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let dir = setup_config_dir(&[
            ("default.toml", DEFAULT_TOML),
            (
                "test.toml",
                "[cache]\nbackend = \"memory\"\ndefault_ttl_seconds = 60\n",
            ),
            ("local.toml", "[cache]\ndefault_ttl_seconds = 5\n"),
        ]);

        let settings = ConfigLoader::from_dir(dir.path(), AppEnvironment::Test)
            .load()
            .unwrap();
        assert_eq!(settings.cache.backend, CacheBackend::Memory);
        assert_eq!(settings.cache.default_ttl_seconds, 5);

        // The production layer does not exist, so only default + local apply.
        let settings = ConfigLoader::from_dir(dir.path(), AppEnvironment::Production)
            .load()
            .unwrap();
        assert_eq!(settings.cache.backend, CacheBackend::Redis);
        assert_eq!(settings.cache.default_ttl_seconds, 5);
    }

    #[test]
    fn test_env_var_overrides_files() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.set("ITEMHUB_CACHE__DEFAULT_TTL_SECONDS", "120");
        env.set("ITEMHUB_LOGGER__LEVEL", "debug");

        let dir = setup_config_dir(&[("default.toml", DEFAULT_TOML)]);
        let settings = ConfigLoader::from_dir(dir.path(), AppEnvironment::Development)
            .load()
            .unwrap();
        assert_eq!(settings.cache.default_ttl_seconds, 120);
        assert_eq!(settings.logger.level, "debug");
    }

    #[test]
    fn test_single_file_mode_skips_layers() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let dir = setup_config_dir(&[
            ("default.toml", DEFAULT_TOML),
            (
                "single.toml",
                "[database]\nurl = \"postgres://other/db\"\n[cache]\nbackend = \"memory\"\n",
            ),
        ]);

        let settings = ConfigLoader::from_dir(dir.path(), AppEnvironment::Development)
            .with_config_file(dir.path().join("single.toml"))
            .load()
            .unwrap();
        assert_eq!(settings.database.url, "postgres://other/db");
        assert_eq!(settings.cache.backend, CacheBackend::Memory);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let dir = setup_config_dir(&[(
            "default.toml",
            "[database]\nurl = \"postgres://localhost/db\"\n[cache]\ndefault_ttl_seconds = 0\n",
        )]);
        let result = ConfigLoader::from_dir(dir.path(), AppEnvironment::Development).load();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { ref field, .. }) if field == "cache.default_ttl_seconds"
        ));
    }

    #[test]
    fn test_new_rejects_dir_and_file_together() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.set(CONFIG_DIR_ENV, "/tmp/itemhub");
        env.set(CONFIG_FILE_ENV, "/tmp/itemhub.toml");
        assert!(matches!(
            ConfigLoader::new(),
            Err(ConfigError::ConflictingSources { ref dir, ref file })
                if dir == Path::new("/tmp/itemhub") && file == Path::new("/tmp/itemhub.toml")
        ));
    }

    #[test]
    fn test_new_reads_environment() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.remove(CONFIG_DIR_ENV);
        env.remove(CONFIG_FILE_ENV);
        env.set(AppEnvironment::ENV_VAR, "staging");

        let loader = ConfigLoader::new().unwrap();
        assert_eq!(loader.environment(), AppEnvironment::Staging);
        assert_eq!(loader.config_dir(), Path::new("config"));
    }
}
