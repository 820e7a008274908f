//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Repository settings
    pub repository: RepositorySettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Repository endpoint and on-disk locations.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositorySettings {
    /// Base URL serving `pluginmaster.json` and `plugins/{name}/latest.zip`.
    pub base_url: String,
    /// Root of the `InternalName/Version/` installation tree.
    pub plugin_root: PathBuf,
    /// Directory for downloaded archives.
    pub temp_dir: PathBuf,
    /// HTTP request timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

/// Log output location.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log directory
    pub directory: PathBuf,
    /// Log file name inside the directory
    pub file: String,
}
