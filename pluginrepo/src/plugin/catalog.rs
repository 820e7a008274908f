//! Catalog snapshot parsed from `pluginmaster.json`.

use thiserror::Error;

use super::definition::PluginDefinition;

/// Ordered list of plugin definitions from one successful fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    definitions: Vec<PluginDefinition>,
}

impl Catalog {
    /// Create a catalog from definitions in catalog order.
    pub fn new(definitions: Vec<PluginDefinition>) -> Self {
        Self { definitions }
    }

    /// Find the entry whose display name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Option<&PluginDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Find the entry with the given internal name.
    pub fn find_by_internal_name(&self, internal_name: &str) -> Option<&PluginDefinition> {
        self.definitions
            .iter()
            .find(|d| d.internal_name == internal_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Error parsing the catalog body.
#[derive(Debug, Error)]
#[error("malformed catalog: {0}")]
pub struct CatalogParseError(#[source] serde_json::Error);

/// Parse a catalog body (a JSON array of definitions).
pub fn parse_catalog(content: &str) -> Result<Catalog, CatalogParseError> {
    let definitions: Vec<PluginDefinition> =
        serde_json::from_str(content).map_err(CatalogParseError)?;
    Ok(Catalog::new(definitions))
}
