//! Local plugin store for the versioned installation tree.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::plugin::{
    binary_file_name, definition_file_name, latest_version, parse_definition, PluginDefinition,
    DISABLED_MARKER,
};

use super::{ManagerError, ManagerResult};

/// Information about the latest installed version of a plugin.
#[derive(Debug, Clone)]
pub struct InstalledPlugin {
    /// Plugin directory name, which is its internal name.
    pub internal_name: String,
    /// Latest version directory name.
    pub version: String,
    /// Path to the version directory.
    pub path: PathBuf,
    /// Cached definition, if the file exists and parses.
    pub definition: Option<PluginDefinition>,
    /// Whether the disabled marker is present.
    pub disabled: bool,
}

/// Store for the `root/InternalName/Version/` tree.
///
/// All path knowledge about installed plugins lives here.
#[derive(Debug, Clone)]
pub struct LocalPluginStore {
    root: PathBuf,
}

impl LocalPluginStore {
    /// Create a store rooted at `root`. The directory need not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every version of a plugin.
    pub fn plugin_dir(&self, internal_name: &str) -> PathBuf {
        self.root.join(internal_name)
    }

    /// Directory of one installed version.
    pub fn version_dir(&self, internal_name: &str, version: &str) -> PathBuf {
        self.plugin_dir(internal_name).join(version)
    }

    /// Target directory for installing `definition`.
    pub fn install_dir(&self, definition: &PluginDefinition) -> PathBuf {
        self.version_dir(&definition.internal_name, &definition.assembly_version)
    }

    /// Like [`install_dir`](Self::install_dir), but fails when either name
    /// would not resolve to a directory two levels below the root.
    pub fn checked_install_dir(&self, definition: &PluginDefinition) -> ManagerResult<PathBuf> {
        check_component("InternalName", &definition.internal_name)?;
        check_component("AssemblyVersion", &definition.assembly_version)?;
        Ok(self.install_dir(definition))
    }

    /// Plugin binary path inside a version directory.
    pub fn binary_path(&self, version_dir: &Path, internal_name: &str) -> PathBuf {
        version_dir.join(binary_file_name(internal_name))
    }

    /// Cached definition path inside a version directory.
    pub fn definition_path(&self, version_dir: &Path, internal_name: &str) -> PathBuf {
        version_dir.join(definition_file_name(internal_name))
    }

    /// Disabled marker path inside a version directory.
    pub fn marker_path(&self, version_dir: &Path) -> PathBuf {
        version_dir.join(DISABLED_MARKER)
    }

    /// Names of every plugin directory under the root, sorted.
    ///
    /// A missing root yields an empty list.
    pub fn plugin_names(&self) -> ManagerResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        list_subdirs(&self.root)
    }

    /// Names of every version directory of a plugin, sorted.
    pub fn version_names(&self, internal_name: &str) -> ManagerResult<Vec<String>> {
        let dir = self.plugin_dir(internal_name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        list_subdirs(&dir)
    }

    /// Latest installed version under the digit-stream ordering.
    pub fn latest_version(&self, internal_name: &str) -> ManagerResult<Option<String>> {
        let names = self.version_names(internal_name)?;
        Ok(latest_version(names.iter().map(String::as_str)).map(str::to_string))
    }

    /// Read the cached definition of one installed version.
    ///
    /// Returns `Ok(None)` when the definition file does not exist.
    pub fn read_definition(
        &self,
        internal_name: &str,
        version: &str,
    ) -> ManagerResult<Option<PluginDefinition>> {
        let path = self.definition_path(&self.version_dir(internal_name, version), internal_name);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ManagerError::ReadFailed { path, source: e }),
        };

        parse_definition(&content)
            .map(Some)
            .map_err(|e| ManagerError::DefinitionParseFailed {
                path,
                reason: e.to_string(),
            })
    }

    /// Whether the version directory carries the disabled marker.
    pub fn is_disabled(&self, version_dir: &Path) -> bool {
        self.marker_path(version_dir).exists()
    }

    /// Create the disabled marker. An existing marker is left alone.
    pub fn mark_disabled(&self, version_dir: &Path) -> ManagerResult<()> {
        let marker = self.marker_path(version_dir);
        match OpenOptions::new().write(true).create_new(true).open(&marker) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(ManagerError::WriteFailed {
                path: marker,
                source: e,
            }),
        }
    }

    /// Remove the disabled marker if present.
    pub fn clear_disabled(&self, version_dir: &Path) -> ManagerResult<()> {
        let marker = self.marker_path(version_dir);
        match fs::remove_file(&marker) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ManagerError::WriteFailed {
                path: marker,
                source: e,
            }),
        }
    }

    /// Describe the latest installed version of a plugin.
    pub fn get(&self, internal_name: &str) -> ManagerResult<InstalledPlugin> {
        check_component("InternalName", internal_name)?;
        let version = self.latest_version(internal_name)?.ok_or_else(|| {
            ManagerError::PluginNotInstalled {
                internal_name: internal_name.to_string(),
            }
        })?;

        let path = self.version_dir(internal_name, &version);
        let definition = match self.read_definition(internal_name, &version) {
            Ok(definition) => definition,
            Err(e) => {
                tracing::warn!(plugin = internal_name, error = %e, "Unreadable cached definition");
                None
            }
        };
        let disabled = self.is_disabled(&path);

        Ok(InstalledPlugin {
            internal_name: internal_name.to_string(),
            version,
            path,
            definition,
            disabled,
        })
    }

    /// Describe every installed plugin, sorted by internal name.
    ///
    /// Plugin directories without any version directory are left out.
    pub fn list(&self) -> ManagerResult<Vec<InstalledPlugin>> {
        let mut plugins = Vec::new();
        for name in self.plugin_names()? {
            match self.get(&name) {
                Ok(plugin) => plugins.push(plugin),
                Err(ManagerError::PluginNotInstalled { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(plugins)
    }
}

/// Accept only a plain file name: not empty, not `.` or `..`, no separators.
fn check_component(field: &'static str, value: &str) -> ManagerResult<()> {
    let mut components = Path::new(value).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if single && !value.contains(['/', '\\']) {
        return Ok(());
    }
    Err(ManagerError::InvalidPathComponent {
        field,
        value: value.to_string(),
    })
}

fn list_subdirs(dir: &Path) -> ManagerResult<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| ManagerError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    Ok(names)
}
