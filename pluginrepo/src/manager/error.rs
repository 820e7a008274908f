//! Error types for the plugin manager.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::loader::LoaderError;

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Broad failure class of a [`ManagerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Catalog or archive could not be fetched.
    NetworkFailure,
    /// Catalog or cached definition is malformed.
    ParseFailure,
    /// Directory create/delete, file write or archive extraction failed.
    FilesystemFailure,
    /// The external loader rejected a load or disable.
    LoaderFailure,
}

/// Errors that can occur while fetching, installing or updating plugins.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Transport-level HTTP failure.
    #[error("HTTP request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    /// Server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Request did not complete within the configured timeout.
    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// Catalog body could not be parsed.
    #[error("Failed to parse catalog from {url}: {reason}")]
    CatalogParseFailed { url: String, reason: String },

    /// Cached definition file could not be parsed.
    #[error("Failed to parse plugin definition {path}: {reason}")]
    DefinitionParseFailed { path: PathBuf, reason: String },

    /// Reading from disk failed.
    #[error("Failed to read {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Writing, creating or deleting on disk failed.
    #[error("Failed to write {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Archive is corrupt or could not be unpacked.
    #[error("Failed to extract {archive}: {reason}")]
    ExtractionFailed { archive: PathBuf, reason: String },

    /// Catalog value cannot be used as a single path component.
    #[error("Invalid {field} '{value}': must be a single path component")]
    InvalidPathComponent { field: &'static str, value: String },

    /// No installed version exists for the plugin.
    #[error("Plugin not installed: {internal_name}")]
    PluginNotInstalled { internal_name: String },

    /// The external loader refused an operation.
    #[error("Plugin loader error: {0}")]
    Loader(#[from] LoaderError),

    /// Fetch was cancelled before it completed.
    #[error("Catalog fetch cancelled")]
    Cancelled,
}

impl ManagerError {
    /// Map this error onto its failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http { .. } | Self::HttpStatus { .. } | Self::Timeout { .. } | Self::Cancelled => {
                ErrorKind::NetworkFailure
            }
            Self::CatalogParseFailed { .. }
            | Self::DefinitionParseFailed { .. }
            | Self::InvalidPathComponent { .. } => {
                ErrorKind::ParseFailure
            }
            Self::ReadFailed { .. }
            | Self::WriteFailed { .. }
            | Self::ExtractionFailed { .. }
            | Self::PluginNotInstalled { .. } => ErrorKind::FilesystemFailure,
            Self::Loader(_) => ErrorKind::LoaderFailure,
        }
    }
}
