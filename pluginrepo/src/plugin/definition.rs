//! Plugin definition record shared by the catalog and installed versions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the zero-byte marker that keeps a version from auto-loading.
pub const DISABLED_MARKER: &str = ".disabled";

/// Plugin definition as published in the catalog.
///
/// Keys are PascalCase on the wire. Fields this client does not interpret
/// are kept in [`extra`](Self::extra) so a definition survives a round trip
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginDefinition {
    /// Display name. Used to match a cached definition back to the catalog.
    pub name: String,

    /// Unique identity key, also the plugin's directory and file stem.
    pub internal_name: String,

    /// Opaque build version string.
    pub assembly_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,

    /// Any other catalog fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PluginDefinition {
    /// Create a definition with only the identity fields set.
    pub fn new(
        name: impl Into<String>,
        internal_name: impl Into<String>,
        assembly_version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            internal_name: internal_name.into(),
            assembly_version: assembly_version.into(),
            author: None,
            description: None,
            repo_url: None,
            extra: BTreeMap::new(),
        }
    }

    /// File name of the plugin binary inside a version directory.
    pub fn binary_file_name(&self) -> String {
        binary_file_name(&self.internal_name)
    }

    /// File name of the cached definition inside a version directory.
    pub fn definition_file_name(&self) -> String {
        definition_file_name(&self.internal_name)
    }
}

/// Binary file name for a plugin internal name.
pub fn binary_file_name(internal_name: &str) -> String {
    format!("{}.dll", internal_name)
}

/// Cached definition file name for a plugin internal name.
pub fn definition_file_name(internal_name: &str) -> String {
    format!("{}.json", internal_name)
}

/// Parse a single cached definition file.
pub fn parse_definition(content: &str) -> Result<PluginDefinition, serde_json::Error> {
    serde_json::from_str(content)
}
