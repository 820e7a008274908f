//! pluginrepo - plugin repository client
//!
//! Fetches a remote catalog of plugin definitions, installs plugin packages
//! into a versioned directory tree and keeps installed plugins up to date,
//! coordinating enable/disable state with an external plugin loader.
//!
//! # High-Level API
//!
//! The [`repository`] module wires everything together around one plugin root:
//!
//! ```ignore
//! use std::sync::Arc;
//! use pluginrepo::config::ConfigFile;
//! use pluginrepo::manager::DetachedLoader;
//! use pluginrepo::repository::PluginRepository;
//!
//! let config = ConfigFile::load()?;
//! let repo = PluginRepository::new(&config.repository, Arc::new(DetachedLoader))?;
//!
//! repo.wait_for_catalog().await;
//! let report = repo.update(false);
//! ```

pub mod config;
pub mod logging;
pub mod manager;
pub mod plugin;
pub mod repository;

/// Version of the pluginrepo library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
