//! Configuration loading from file system

use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use super::defaults::CONFIG_PATH;
use super::types::HostConfig;
use crate::error::{HostError, Result};

/// Default config file location (`~/.tms-host/config.json`).
pub fn default_config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(CONFIG_PATH).as_ref())
}

/// Parse a config document. Missing fields take their defaults.
pub fn parse_config(json: &str) -> Result<HostConfig> {
    serde_json::from_str(json).map_err(|e| HostError::Config(e.to_string()))
}

/// Load configuration from `path`, or the default location.
///
/// Returns `HostConfig::default()` if the file is missing, unreadable or
/// malformed; the latter two are logged.
#[instrument(name = "load_config")]
pub fn load_config(path: Option<&Path>) -> HostConfig {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if !config_path.exists() {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        return HostConfig::default();
    }

    let contents = match std::fs::read_to_string(&config_path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path = %config_path.display(), error = %e, "Failed to read config, using defaults");
            return HostConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            info!(path = %config_path.display(), "Successfully loaded config");
            config
        }
        Err(e) => {
            warn!(
                path = %config_path.display(),
                error = %e,
                "Failed to parse config JSON, using defaults"
            );
            HostConfig::default()
        }
    }
}
