//! Repository facade tying the catalog fetch, installer and updater together.
//!
//! A [`PluginRepository`] owns one plugin root and one catalog endpoint.
//! Installs and updates on the same root are serialized across every
//! repository instance in the process.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::RepositorySettings;
use crate::manager::{
    catalog_url, ArchiveExtractor, CatalogClient, CatalogFetcher, FetchState,
    HttpRepositoryClient, InstallOutcome, InstalledPlugin, LocalPluginStore, ManagerResult,
    PackageDownloader, PluginInfo, PluginInstaller, PluginLoader, UpdateCoordinator,
    UpdateReport, UpdateStep, ZipExtractor,
};
use crate::plugin::{Catalog, PluginDefinition};

/// Install/update guards keyed by plugin root.
static ROOT_LOCKS: Mutex<BTreeMap<PathBuf, Arc<Mutex<()>>>> =
    parking_lot::const_mutex(BTreeMap::new());

fn root_lock(root: &Path) -> Arc<Mutex<()>> {
    let key = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    ROOT_LOCKS.lock().entry(key).or_default().clone()
}

/// Plugin repository bound to one root and one catalog endpoint.
pub struct PluginRepository {
    base_url: String,
    client: Arc<dyn CatalogClient>,
    installer: PluginInstaller,
    fetcher: Mutex<Arc<CatalogFetcher>>,
    last_catalog: Mutex<Option<Arc<Catalog>>>,
    lock: Arc<Mutex<()>>,
}

impl PluginRepository {
    /// Create a repository using HTTP and zip extraction, and start the
    /// first catalog fetch.
    pub fn new(settings: &RepositorySettings, loader: Arc<dyn PluginLoader>) -> ManagerResult<Self> {
        let client = Arc::new(HttpRepositoryClient::with_timeout(
            settings.timeout_secs.map(Duration::from_secs),
        )?);

        Ok(Self::with_components(
            settings.base_url.clone(),
            &settings.plugin_root,
            &settings.temp_dir,
            client.clone(),
            client,
            Arc::new(ZipExtractor::new()),
            loader,
        ))
    }

    /// Create a repository from explicit collaborators and start the first
    /// catalog fetch.
    pub fn with_components(
        base_url: impl Into<String>,
        plugin_root: &Path,
        temp_dir: &Path,
        client: Arc<dyn CatalogClient>,
        downloader: Arc<dyn PackageDownloader>,
        extractor: Arc<dyn ArchiveExtractor>,
        loader: Arc<dyn PluginLoader>,
    ) -> Self {
        let base_url = base_url.into();
        let installer = PluginInstaller::new(
            LocalPluginStore::new(plugin_root),
            base_url.clone(),
            temp_dir,
            downloader,
            extractor,
            loader,
        );
        let fetcher = CatalogFetcher::start(client.clone(), catalog_url(&base_url));

        Self {
            base_url,
            client,
            installer,
            fetcher: Mutex::new(Arc::new(fetcher)),
            last_catalog: Mutex::new(None),
            lock: root_lock(plugin_root),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &LocalPluginStore {
        self.installer.store()
    }

    /// Readiness of the current catalog fetch.
    pub fn fetch_state(&self) -> FetchState {
        self.fetcher.lock().state()
    }

    /// Failure description of the current fetch, if it failed.
    pub fn fetch_error(&self) -> Option<String> {
        self.fetcher.lock().error()
    }

    /// Wait for the current catalog fetch to finish.
    pub async fn wait_for_catalog(&self) -> FetchState {
        let fetcher = self.fetcher.lock().clone();
        fetcher.wait().await
    }

    /// Start a new fetch cycle.
    ///
    /// The previous snapshot stays available through [`catalog`](Self::catalog)
    /// until the new fetch succeeds.
    pub fn refresh_catalog(&self) {
        let next = Arc::new(CatalogFetcher::start(
            self.client.clone(),
            catalog_url(&self.base_url),
        ));
        let previous = std::mem::replace(&mut *self.fetcher.lock(), next);

        match previous.catalog() {
            Some(catalog) => *self.last_catalog.lock() = Some(catalog),
            None => previous.cancel(),
        }
    }

    /// Latest successfully fetched catalog.
    pub fn catalog(&self) -> Option<Arc<Catalog>> {
        self.fetcher
            .lock()
            .catalog()
            .or_else(|| self.last_catalog.lock().clone())
    }

    /// Catalog entry for an internal name.
    pub fn catalog_entry(&self, internal_name: &str) -> Option<PluginDefinition> {
        self.catalog()?.find_by_internal_name(internal_name).cloned()
    }

    /// Install one plugin version. See [`PluginInstaller::install`].
    pub fn install(&self, definition: &PluginDefinition, enable_after_install: bool) -> bool {
        let _guard = self.lock.lock();
        self.installer.install(definition, enable_after_install)
    }

    /// Install one plugin version, reporting how it was satisfied.
    pub fn try_install(
        &self,
        definition: &PluginDefinition,
        enable_after_install: bool,
    ) -> ManagerResult<InstallOutcome> {
        let _guard = self.lock.lock();
        self.installer.try_install(definition, enable_after_install)
    }

    /// Update every installed plugin against the latest catalog.
    ///
    /// Fails without touching anything when no catalog has been fetched.
    pub fn update(&self, dry_run: bool) -> UpdateReport {
        let Some(catalog) = self.catalog() else {
            return UpdateReport::failed(
                dry_run,
                UpdateStep::Scan,
                format!("catalog not available (fetch {})", self.fetch_state()),
            );
        };

        let _guard = self.lock.lock();
        UpdateCoordinator::new(&self.installer).update(&catalog, dry_run)
    }

    /// Status of every installed plugin against the latest catalog.
    ///
    /// Without a catalog every plugin with a cached definition reads as orphaned.
    pub fn check(&self) -> ManagerResult<Vec<PluginInfo>> {
        let catalog = self.catalog().unwrap_or_default();
        UpdateCoordinator::new(&self.installer).check(&catalog)
    }

    /// Every installed plugin's latest version.
    pub fn installed(&self) -> ManagerResult<Vec<InstalledPlugin>> {
        self.store().list()
    }

    /// Enable or disable the latest installed version of a plugin.
    pub fn set_enabled(&self, internal_name: &str, enabled: bool) -> ManagerResult<InstalledPlugin> {
        let _guard = self.lock.lock();
        self.installer.set_enabled(internal_name, enabled)
    }
}
