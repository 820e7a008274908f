//! Trait definitions for the repository's I/O seams.
//!
//! These traits enable dependency injection and testing of the manager
//! components without network access.

use std::path::Path;

use crate::plugin::Catalog;

use super::ManagerResult;

/// Client for fetching the plugin catalog.
pub trait CatalogClient: Send + Sync {
    /// Fetch and parse the catalog at `url`.
    fn fetch_catalog(&self, url: &str) -> ManagerResult<Catalog>;
}

/// Downloader for plugin archives.
pub trait PackageDownloader: Send + Sync {
    /// Download `url` into the file at `dest`, truncating it first.
    ///
    /// Returns the number of bytes written.
    fn download(&self, url: &str, dest: &Path) -> ManagerResult<u64>;
}

/// Extractor for plugin archives.
pub trait ArchiveExtractor: Send + Sync {
    /// Extract every entry of `archive_path` into `dest_dir`.
    ///
    /// Returns the number of files written.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> ManagerResult<usize>;
}
