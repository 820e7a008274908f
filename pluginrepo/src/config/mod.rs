//! Configuration for the plugin repository client.
//!
//! Settings are read from `~/.pluginrepo/config.ini`. Missing files and
//! missing keys fall back to defaults.
//!
//! ```ini
//! [repository]
//! base_url = https://plugins.example.com
//! plugin_root = ~/.pluginrepo/plugins
//! temp_dir =
//! timeout_secs =
//!
//! [logging]
//! directory = ~/.pluginrepo/logs
//! file = pluginrepo.log
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, LoggingSettings, RepositorySettings};
