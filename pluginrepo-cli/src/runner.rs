//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and repository
//! creation so command handlers only deal with their own logic.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pluginrepo::config::{ConfigFile, RepositorySettings};
use pluginrepo::logging::{init_logging, LoggingGuard};
use pluginrepo::manager::{DetachedLoader, FetchState};
use pluginrepo::plugin::Catalog;
use pluginrepo::repository::PluginRepository;
use tracing::info;

use crate::error::CliError;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub plugin_root: Option<PathBuf>,
    pub base_url: Option<String>,
}

impl Overrides {
    /// Apply the overrides onto loaded repository settings.
    pub fn apply(&self, settings: &mut RepositorySettings) {
        if let Some(root) = &self.plugin_root {
            settings.plugin_root = root.clone();
        }
        if let Some(url) = &self.base_url {
            settings.base_url = url.trim_end_matches('/').to_string();
        }
    }
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    _logging_guard: LoggingGuard,
    /// Loaded configuration with overrides applied
    config: ConfigFile,
}

impl CliRunner {
    /// Load config, apply overrides and initialize logging.
    pub fn new(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self, CliError> {
        let mut config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };
        overrides.apply(&mut config.repository);

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("pluginrepo v{}", pluginrepo::VERSION);
        info!(
            command,
            base_url = %self.config.repository.base_url,
            plugin_root = %self.config.repository.plugin_root.display(),
            "pluginrepo CLI starting"
        );
    }

    /// Open the configured repository. This starts the catalog fetch.
    pub fn open_repository(&self) -> Result<PluginRepository, CliError> {
        PluginRepository::new(&self.config.repository, Arc::new(DetachedLoader))
            .map_err(|e| CliError::Setup(e.to_string()))
    }

    /// Block until the catalog fetch finishes.
    ///
    /// Returns the catalog when the fetch succeeded.
    pub fn wait_for_catalog(
        &self,
        repo: &PluginRepository,
    ) -> Result<Option<Arc<Catalog>>, CliError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| CliError::Setup(format!("failed to start runtime: {}", e)))?;

        let state = runtime.block_on(repo.wait_for_catalog());
        info!(state = %state, "Catalog fetch finished");

        match state {
            FetchState::Success => Ok(repo.catalog()),
            _ => Ok(None),
        }
    }

    /// Like [`wait_for_catalog`](Self::wait_for_catalog) but fails when no
    /// catalog is available.
    pub fn require_catalog(&self, repo: &PluginRepository) -> Result<Arc<Catalog>, CliError> {
        self.wait_for_catalog(repo)?.ok_or_else(|| {
            CliError::CatalogUnavailable(
                repo.fetch_error()
                    .unwrap_or_else(|| format!("fetch {}", repo.fetch_state())),
            )
        })
    }
}
