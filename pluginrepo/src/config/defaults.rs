//! Default values and constants for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;

/// Default repository base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "pluginrepo.log";

/// Default plugin root (`~/.pluginrepo/plugins`).
pub fn default_plugin_root() -> PathBuf {
    config_directory().join("plugins")
}

/// Default archive download directory.
pub fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("pluginrepo")
}

/// Default log directory (`~/.pluginrepo/logs`).
pub fn default_log_dir() -> PathBuf {
    config_directory().join("logs")
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            plugin_root: default_plugin_root(),
            temp_dir: default_temp_dir(),
            timeout_secs: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            repository: RepositorySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}
