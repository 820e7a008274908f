//! Plugin installer: download, extract, and enable/disable one version.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::plugin::PluginDefinition;

use super::client::archive_url;
use super::loader::PluginLoader;
use super::local::{InstalledPlugin, LocalPluginStore};
use super::traits::{ArchiveExtractor, PackageDownloader};
use super::{ManagerError, ManagerResult};

/// How an install request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Binary already present; nothing was done.
    AlreadyInstalled,
    /// Binary already present; marker cleared and loader asked to load it.
    Enabled,
    /// Freshly installed and left disabled.
    InstalledDisabled,
    /// Freshly installed and loaded.
    InstalledAndLoaded,
}

/// Installs plugin versions into a [`LocalPluginStore`].
pub struct PluginInstaller {
    store: LocalPluginStore,
    base_url: String,
    temp_dir: PathBuf,
    downloader: Arc<dyn PackageDownloader>,
    extractor: Arc<dyn ArchiveExtractor>,
    loader: Arc<dyn PluginLoader>,
}

impl PluginInstaller {
    /// Create an installer.
    ///
    /// # Arguments
    ///
    /// * `store` - Installation tree to write into
    /// * `base_url` - Repository base URL archives are fetched from
    /// * `temp_dir` - Directory for downloaded archives
    /// * `downloader` - Archive downloader
    /// * `extractor` - Archive extractor
    /// * `loader` - External plugin loader
    pub fn new(
        store: LocalPluginStore,
        base_url: impl Into<String>,
        temp_dir: impl Into<PathBuf>,
        downloader: Arc<dyn PackageDownloader>,
        extractor: Arc<dyn ArchiveExtractor>,
        loader: Arc<dyn PluginLoader>,
    ) -> Self {
        Self {
            store,
            base_url: base_url.into(),
            temp_dir: temp_dir.into(),
            downloader,
            extractor,
            loader,
        }
    }

    pub fn store(&self) -> &LocalPluginStore {
        &self.store
    }

    pub fn loader(&self) -> &Arc<dyn PluginLoader> {
        &self.loader
    }

    /// Install `definition`, reporting only success.
    ///
    /// Every failure is logged and turned into `false`. Partially extracted
    /// files are left in place; the next call recreates the directory.
    pub fn install(&self, definition: &PluginDefinition, enable_after_install: bool) -> bool {
        match self.try_install(definition, enable_after_install) {
            Ok(outcome) => {
                tracing::info!(
                    plugin = %definition.internal_name,
                    version = %definition.assembly_version,
                    ?outcome,
                    "Plugin install finished"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    plugin = %definition.internal_name,
                    version = %definition.assembly_version,
                    error = %e,
                    kind = ?e.kind(),
                    "Plugin install failed"
                );
                false
            }
        }
    }

    /// Install `definition` into `root/InternalName/AssemblyVersion/`.
    ///
    /// The fresh install stays disabled when `enable_after_install` is false
    /// or the target directory already carried the disabled marker.
    pub fn try_install(
        &self,
        definition: &PluginDefinition,
        enable_after_install: bool,
    ) -> ManagerResult<InstallOutcome> {
        let name = &definition.internal_name;
        let dir = self.store.checked_install_dir(definition)?;
        let binary = self.store.binary_path(&dir, name);

        if binary.exists() {
            if !enable_after_install {
                tracing::debug!(plugin = %name, path = %dir.display(), "Already installed");
                return Ok(InstallOutcome::AlreadyInstalled);
            }
            self.store.clear_disabled(&dir)?;
            self.loader.load(&binary, false)?;
            return Ok(InstallOutcome::Enabled);
        }

        // A marker left in the target (e.g. by an interrupted update) keeps
        // the fresh install disabled.
        let was_disabled = self.store.is_disabled(&dir);
        recreate_dir(&dir)?;

        let url = archive_url(&self.base_url, name);
        fs::create_dir_all(&self.temp_dir).map_err(|e| ManagerError::WriteFailed {
            path: self.temp_dir.clone(),
            source: e,
        })?;
        let archive = tempfile::Builder::new()
            .prefix(&format!("{}-", name))
            .suffix(".zip")
            .tempfile_in(&self.temp_dir)
            .map_err(|e| ManagerError::WriteFailed {
                path: self.temp_dir.clone(),
                source: e,
            })?;

        tracing::info!(plugin = %name, url = %url, "Downloading plugin archive");
        self.downloader.download(&url, archive.path())?;
        let files = self.extractor.extract(archive.path(), &dir)?;
        tracing::debug!(plugin = %name, files, path = %dir.display(), "Archive extracted");

        if was_disabled || !enable_after_install {
            self.store.mark_disabled(&dir)?;
            return Ok(InstallOutcome::InstalledDisabled);
        }

        self.loader.load(&binary, false)?;
        Ok(InstallOutcome::InstalledAndLoaded)
    }

    /// Enable or disable the latest installed version of a plugin.
    ///
    /// Enabling clears the marker and asks the loader to load the binary.
    /// Disabling writes the marker and, if the plugin is loaded, asks the
    /// loader to disable it.
    pub fn set_enabled(&self, internal_name: &str, enabled: bool) -> ManagerResult<InstalledPlugin> {
        let mut plugin = self.store.get(internal_name)?;

        if enabled {
            self.store.clear_disabled(&plugin.path)?;
            let binary = self.store.binary_path(&plugin.path, internal_name);
            self.loader.load(&binary, false)?;
        } else {
            self.store.mark_disabled(&plugin.path)?;
            let loaded = self
                .loader
                .loaded_plugins()
                .into_iter()
                .find(|d| d.internal_name == internal_name);
            if let Some(definition) = loaded {
                self.loader.disable(&definition)?;
            }
        }

        plugin.disabled = !enabled;
        Ok(plugin)
    }
}

/// Delete and recreate `dir`. A failed delete is tolerated because the
/// directory may be held open by a loaded version.
fn recreate_dir(dir: &Path) -> ManagerResult<()> {
    if dir.exists() {
        if let Err(e) = fs::remove_dir_all(dir) {
            tracing::warn!(path = %dir.display(), error = %e, "Could not clear install directory");
        }
    }
    fs::create_dir_all(dir).map_err(|e| ManagerError::WriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}
