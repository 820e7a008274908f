//! Contract with the external plugin loader.
//!
//! The loader lives in the host process and actually loads plugin binaries.
//! This crate only asks it to load or disable plugins and queries which
//! plugins it currently has loaded.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::plugin::PluginDefinition;

/// Errors reported by a [`PluginLoader`].
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The loader refused to load a binary.
    #[error("Loader rejected {path}: {reason}")]
    Rejected { path: PathBuf, reason: String },

    /// The loader could not disable a plugin.
    #[error("Failed to disable {internal_name}: {reason}")]
    DisableFailed {
        internal_name: String,
        reason: String,
    },
}

/// External plugin loader collaborator.
pub trait PluginLoader: Send + Sync {
    /// Load the plugin binary at `binary`.
    ///
    /// With `reload == false` an already-loaded instance must not be replaced.
    fn load(&self, binary: &Path, reload: bool) -> Result<(), LoaderError>;

    /// Disable a currently loaded plugin.
    fn disable(&self, definition: &PluginDefinition) -> Result<(), LoaderError>;

    /// Definitions of every plugin currently loaded.
    fn loaded_plugins(&self) -> Vec<PluginDefinition>;

    /// Whether a plugin with this internal name is currently loaded.
    fn is_loaded(&self, internal_name: &str) -> bool {
        self.loaded_plugins()
            .iter()
            .any(|d| d.internal_name == internal_name)
    }
}

/// Loader used when no host process is attached.
///
/// Every load succeeds and nothing is ever reported as loaded, so updates
/// driven through it leave plugins disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedLoader;

impl PluginLoader for DetachedLoader {
    fn load(&self, binary: &Path, _reload: bool) -> Result<(), LoaderError> {
        tracing::debug!(path = %binary.display(), "No host attached, skipping load");
        Ok(())
    }

    fn disable(&self, _definition: &PluginDefinition) -> Result<(), LoaderError> {
        Ok(())
    }

    fn loaded_plugins(&self) -> Vec<PluginDefinition> {
        Vec::new()
    }
}
