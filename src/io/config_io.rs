use std::fs;
use std::path::{Path, PathBuf};

use crate::model::AppConfig;

pub const CONFIG_FILE: &str = "tasktrack.toml";

/// Error type for configuration I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse tasktrack.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not serialize tasktrack.toml: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Read the store's tasktrack.toml. A missing file yields the defaults.
pub fn read_config(store_dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = store_dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(AppConfig::default());
        }
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    Ok(toml::from_str(&text)?)
}

/// Write a config file with every section spelled out.
pub fn write_config(store_dir: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let text = toml::to_string_pretty(config)?;
    fs::write(store_dir.join(CONFIG_FILE), text)?;
    Ok(())
}
