//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use pluginrepo::config::ConfigFileError;
use pluginrepo::manager::{ErrorKind, ManagerError};

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigFileError),
    /// Failed to set up the repository or the async runtime
    Setup(String),
    /// Catalog fetch did not succeed
    CatalogUnavailable(String),
    /// Plugin is not in the catalog
    NotInCatalog(String),
    /// Repository operation failed
    Repository(ManagerError),
    /// One or more plugins failed to update
    UpdateFailed { failed: usize, warnings: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::CatalogUnavailable(_) => {
                eprintln!();
                eprintln!("Check that the repository is reachable:");
                eprintln!("  1. base_url in ~/.pluginrepo/config.ini (or --base-url)");
                eprintln!("  2. {{base_url}}/pluginmaster.json serves a JSON array");
            }
            CliError::Repository(e) if e.kind() == ErrorKind::FilesystemFailure => {
                eprintln!();
                eprintln!("Check permissions on the plugin root (or pass --plugin-root).");
            }
            CliError::UpdateFailed { .. } => {
                eprintln!();
                eprintln!("See the log file for details. Re-running update retries failed plugins.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Setup(msg) => write!(f, "Setup failed: {}", msg),
            CliError::CatalogUnavailable(reason) => {
                write!(f, "Plugin catalog unavailable: {}", reason)
            }
            CliError::NotInCatalog(name) => {
                write!(f, "Plugin '{}' is not in the catalog", name)
            }
            CliError::Repository(e) => write!(f, "{}", e),
            CliError::UpdateFailed { failed, warnings } => write!(
                f,
                "Update finished with {} failed plugin(s) and {} warning(s)",
                failed, warnings
            ),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Repository(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<ManagerError> for CliError {
    fn from(e: ManagerError) -> Self {
        CliError::Repository(e)
    }
}
