//! CLI argument validation functions

use std::fs;
use std::path::PathBuf;

/// Validate that a file path is accessible (exists and is readable)
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }

    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!(
            "Cannot read configuration file '{}': {}",
            path_str, e
        )),
    }
}

/// Validate a cache key given on the command line.
pub fn validate_cache_key(key: &str) -> Result<String, String> {
    if key.trim().is_empty() {
        return Err("Cache key cannot be empty".to_string());
    }
    if key.contains(['*', '?', '[']) {
        return Err(format!(
            "Cache key '{}' contains glob characters; use `cache invalidate` for patterns",
            key
        ));
    }
    Ok(key.to_string())
}
