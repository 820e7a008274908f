//! Update detection and the update run over every installed plugin.

use std::fmt;

use crate::plugin::{Catalog, PluginDefinition};

use super::installer::PluginInstaller;
use super::local::LocalPluginStore;
use super::ManagerResult;

/// Status of an installed plugin compared with the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginStatus {
    /// Cached definition matches the catalog version.
    UpToDate,
    /// Catalog carries a different version.
    UpdateAvailable {
        /// Version of the cached definition.
        installed: String,
        /// Version in the catalog.
        available: String,
    },
    /// Installed but not in the catalog (local-only or withdrawn).
    Orphaned {
        /// Version of the cached definition.
        installed: String,
    },
    /// Latest version directory has no cached definition file.
    MissingDefinition,
}

impl PluginStatus {
    /// Returns true if an update is available.
    pub fn has_update(&self) -> bool {
        matches!(self, Self::UpdateAvailable { .. })
    }
}

/// Information about an installed plugin's update status.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    /// Plugin internal name (its directory name).
    pub internal_name: String,
    /// Latest version directory name.
    pub version_dir: String,
    /// Current status.
    pub status: PluginStatus,
    /// Matching catalog entry, if any.
    pub catalog_entry: Option<PluginDefinition>,
}

/// Outcome for one update-eligible plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginUpdateStatus {
    pub internal_name: String,
    /// For a dry run, always true. Otherwise whether the install succeeded.
    pub was_updated: bool,
}

/// Step of the update run a warning was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStep {
    /// Listing the plugin root.
    Scan,
    /// Reading version directories or the cached definition.
    Inspect,
    /// Asking the loader to disable the running instance.
    DisableLoaded,
    /// Writing disabled markers into existing versions.
    MarkDisabled,
    /// Installing the catalog version.
    Install,
}

impl fmt::Display for UpdateStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scan => "scan",
            Self::Inspect => "inspect",
            Self::DisableLoaded => "disable loaded plugin",
            Self::MarkDisabled => "mark disabled",
            Self::Install => "install",
        };
        write!(f, "{}", name)
    }
}

/// A step that failed without stopping the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateWarning {
    /// Plugin the step ran for, `None` for root-level steps.
    pub internal_name: Option<String>,
    pub step: UpdateStep,
    pub message: String,
}

/// Aggregated result of an update run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// False if any install failed or the scan itself failed.
    pub success: bool,
    /// Whether the run only reported eligibility.
    pub dry_run: bool,
    /// One entry per update-eligible plugin, in scan order.
    pub statuses: Vec<PluginUpdateStatus>,
    /// Failed best-effort steps.
    pub warnings: Vec<UpdateWarning>,
}

impl UpdateReport {
    fn new(dry_run: bool) -> Self {
        Self {
            success: true,
            dry_run,
            statuses: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Report for a run that could not start.
    pub fn failed(dry_run: bool, step: UpdateStep, message: impl Into<String>) -> Self {
        let mut report = Self::new(dry_run);
        report.success = false;
        report.warn(None, step, message);
        report
    }

    fn warn(&mut self, internal_name: Option<&str>, step: UpdateStep, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(plugin = ?internal_name, %step, %message, "Update step failed");
        self.warnings.push(UpdateWarning {
            internal_name: internal_name.map(str::to_string),
            step,
            message,
        });
    }

    /// Internal names of plugins that were (or would be) updated.
    pub fn updated(&self) -> impl Iterator<Item = &str> {
        self.statuses
            .iter()
            .filter(|s| s.was_updated)
            .map(|s| s.internal_name.as_str())
    }

    /// Internal names of plugins whose install failed.
    pub fn failed_plugins(&self) -> impl Iterator<Item = &str> {
        self.statuses
            .iter()
            .filter(|s| !s.was_updated)
            .map(|s| s.internal_name.as_str())
    }
}

/// Where one installed plugin stands against the catalog.
enum Resolution<'c> {
    NoVersions,
    MissingDefinition { version: String },
    Resolved {
        version: String,
        cached: PluginDefinition,
        entry: Option<&'c PluginDefinition>,
    },
}

/// Compares installed plugins against a catalog and drives the installer.
pub struct UpdateCoordinator<'a> {
    installer: &'a PluginInstaller,
}

impl<'a> UpdateCoordinator<'a> {
    /// Create a coordinator over the installer's store and loader.
    pub fn new(installer: &'a PluginInstaller) -> Self {
        Self { installer }
    }

    fn store(&self) -> &LocalPluginStore {
        self.installer.store()
    }

    fn resolve<'c>(&self, internal_name: &str, catalog: &'c Catalog) -> ManagerResult<Resolution<'c>> {
        let Some(version) = self.store().latest_version(internal_name)? else {
            return Ok(Resolution::NoVersions);
        };
        let Some(cached) = self.store().read_definition(internal_name, &version)? else {
            return Ok(Resolution::MissingDefinition { version });
        };
        let entry = catalog.find_by_name(&cached.name);
        Ok(Resolution::Resolved {
            version,
            cached,
            entry,
        })
    }

    /// Status of one installed plugin.
    ///
    /// Returns `Ok(None)` when the plugin has no version directories.
    pub fn check_plugin(
        &self,
        internal_name: &str,
        catalog: &Catalog,
    ) -> ManagerResult<Option<PluginInfo>> {
        let info = match self.resolve(internal_name, catalog)? {
            Resolution::NoVersions => return Ok(None),
            Resolution::MissingDefinition { version } => PluginInfo {
                internal_name: internal_name.to_string(),
                version_dir: version,
                status: PluginStatus::MissingDefinition,
                catalog_entry: None,
            },
            Resolution::Resolved {
                version,
                cached,
                entry,
            } => {
                let status = match entry {
                    None => PluginStatus::Orphaned {
                        installed: cached.assembly_version,
                    },
                    Some(entry) if entry.assembly_version == cached.assembly_version => {
                        PluginStatus::UpToDate
                    }
                    Some(entry) => PluginStatus::UpdateAvailable {
                        installed: cached.assembly_version,
                        available: entry.assembly_version.clone(),
                    },
                };
                PluginInfo {
                    internal_name: internal_name.to_string(),
                    version_dir: version,
                    status,
                    catalog_entry: entry.cloned(),
                }
            }
        };
        Ok(Some(info))
    }

    /// Status of every installed plugin, sorted by internal name.
    pub fn check(&self, catalog: &Catalog) -> ManagerResult<Vec<PluginInfo>> {
        let mut results = Vec::new();
        for name in self.store().plugin_names()? {
            if let Some(info) = self.check_plugin(&name, catalog)? {
                results.push(info);
            }
        }
        Ok(results)
    }

    /// Update every installed plugin whose cached version differs from the
    /// catalog's.
    ///
    /// Plugins with no version directories, no cached definition, or no
    /// catalog entry are skipped without a status record. With `dry_run`
    /// nothing on disk or in the loader is touched.
    pub fn update(&self, catalog: &Catalog, dry_run: bool) -> UpdateReport {
        let mut report = UpdateReport::new(dry_run);

        let names = match self.store().plugin_names() {
            Ok(names) => names,
            Err(e) => {
                report.success = false;
                report.warn(None, UpdateStep::Scan, e.to_string());
                return report;
            }
        };

        for name in names {
            let (cached, entry) = match self.resolve(&name, catalog) {
                Ok(Resolution::Resolved {
                    cached,
                    entry: Some(entry),
                    ..
                }) => (cached, entry),
                Ok(Resolution::MissingDefinition { version }) => {
                    tracing::debug!(plugin = %name, %version, "No cached definition, skipping");
                    continue;
                }
                Ok(_) => continue,
                Err(e) => {
                    report.success = false;
                    report.warn(Some(&name), UpdateStep::Inspect, e.to_string());
                    continue;
                }
            };

            if cached.assembly_version == entry.assembly_version {
                continue;
            }

            tracing::info!(
                plugin = %name,
                installed = %cached.assembly_version,
                available = %entry.assembly_version,
                dry_run,
                "Update available"
            );

            let was_updated = if dry_run {
                true
            } else {
                self.update_plugin(&name, entry, &mut report)
            };

            if !was_updated {
                report.success = false;
            }
            report.statuses.push(PluginUpdateStatus {
                internal_name: name,
                was_updated,
            });
        }

        report
    }

    fn update_plugin(
        &self,
        internal_name: &str,
        entry: &PluginDefinition,
        report: &mut UpdateReport,
    ) -> bool {
        let loader = self.installer.loader();

        let was_enabled = loader.is_loaded(internal_name);
        if was_enabled {
            let loaded = loader
                .loaded_plugins()
                .into_iter()
                .find(|d| d.internal_name == internal_name);
            if let Some(definition) = loaded {
                if let Err(e) = loader.disable(&definition) {
                    report.warn(Some(internal_name), UpdateStep::DisableLoaded, e.to_string());
                }
            }
        }

        match self.store().version_names(internal_name) {
            Ok(versions) => {
                for version in versions {
                    let dir = self.store().version_dir(internal_name, &version);
                    if let Err(e) = self.store().mark_disabled(&dir) {
                        report.warn(Some(internal_name), UpdateStep::MarkDisabled, e.to_string());
                    }
                }
            }
            Err(e) => report.warn(Some(internal_name), UpdateStep::MarkDisabled, e.to_string()),
        }

        let installed = self.installer.install(entry, was_enabled);
        if !installed {
            report.warn(
                Some(internal_name),
                UpdateStep::Install,
                format!("install of {} failed", entry.assembly_version),
            );
        }
        installed
    }
}
