//! Plugin definitions, the remote catalog, and version directory ordering.
//!
//! # Overview
//!
//! A plugin is identified by its `InternalName` everywhere on disk and in the
//! catalog. The catalog is a JSON array of [`PluginDefinition`] objects; each
//! installed version keeps a copy of the definition it was installed from.
//!
//! # File Layout
//!
//! ```text
//! {plugin_root}/
//! └── {InternalName}/
//!     ├── 1.0.0.0/
//!     │   ├── {InternalName}.dll
//!     │   ├── {InternalName}.json
//!     │   └── .disabled          (optional marker)
//!     └── 1.0.1.0/
//!         └── ...
//! ```

mod catalog;
mod definition;
mod version;

pub use catalog::{parse_catalog, Catalog, CatalogParseError};
pub use definition::{
    binary_file_name, definition_file_name, parse_definition, PluginDefinition, DISABLED_MARKER,
};
pub use version::{latest_version, version_key};
