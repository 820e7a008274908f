//! Plugin manager: fetching the catalog, installing and updating plugins.
//!
//! # Overview
//!
//! The manager handles:
//! - Fetching the plugin catalog in the background ([`CatalogFetcher`])
//! - Downloading and extracting plugin archives ([`PluginInstaller`])
//! - Discovering installed versions on disk ([`LocalPluginStore`])
//! - Comparing installs against the catalog and updating them ([`UpdateCoordinator`])
//!
//! # Architecture
//!
//! The manager uses trait-based abstractions for testability:
//!
//! - [`CatalogClient`] - Fetches the catalog
//! - [`PackageDownloader`] - Downloads plugin archives
//! - [`ArchiveExtractor`] - Unpacks plugin archives
//! - [`PluginLoader`] - The external loader running in the host process
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pluginrepo::manager::{
//!     catalog_url, CatalogFetcher, DetachedLoader, HttpRepositoryClient, LocalPluginStore,
//!     PluginInstaller, UpdateCoordinator, ZipExtractor,
//! };
//!
//! let client = Arc::new(HttpRepositoryClient::new()?);
//! let fetcher = CatalogFetcher::start(client.clone(), catalog_url(base_url));
//! fetcher.wait().await;
//!
//! let installer = PluginInstaller::new(
//!     LocalPluginStore::new(root),
//!     base_url,
//!     temp_dir,
//!     client,
//!     Arc::new(ZipExtractor::new()),
//!     Arc::new(DetachedLoader),
//! );
//! let report = UpdateCoordinator::new(&installer).update(&fetcher.catalog().unwrap(), false);
//! ```

mod client;
mod error;
mod extractor;
mod fetcher;
mod installer;
mod loader;
mod local;
mod traits;
mod updates;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{archive_url, catalog_url, HttpRepositoryClient};
pub use error::{ErrorKind, ManagerError, ManagerResult};
pub use extractor::ZipExtractor;
pub use fetcher::{CatalogFetcher, FetchState};
pub use installer::{InstallOutcome, PluginInstaller};
pub use loader::{DetachedLoader, LoaderError, PluginLoader};
pub use local::{InstalledPlugin, LocalPluginStore};
pub use traits::{ArchiveExtractor, CatalogClient, PackageDownloader};
pub use updates::{
    PluginInfo, PluginStatus, PluginUpdateStatus, UpdateCoordinator, UpdateReport, UpdateStep,
    UpdateWarning,
};
