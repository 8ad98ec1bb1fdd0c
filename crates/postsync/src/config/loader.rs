use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.remote.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::Validation {
            message: "remote.base_url must not be empty".to_string(),
        });
    }

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation {
            message: format!(
                "remote.base_url must start with http:// or https://, got '{}'",
                base_url
            ),
        });
    }

    if config.remote.timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "remote.timeout_secs must be greater than 0".to_string(),
        });
    }

    if let Some(path) = &config.database.path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                message: "database.path must not be empty".to_string(),
            });
        }
    }

    Ok(())
}
