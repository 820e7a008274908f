//! CLI command implementations.
//!
//! Each handler takes an opened [`PluginRepository`] and an [`Output`].
//! Formatting lives in free functions so it can be tested without a
//! repository.

mod output;

pub use output::{ConsoleOutput, Output};

use pluginrepo::manager::{InstallOutcome, PluginInfo, PluginStatus, UpdateReport};
use pluginrepo::plugin::Catalog;
use pluginrepo::repository::PluginRepository;

use crate::error::CliError;
use crate::runner::CliRunner;

// ============================================================================
// catalog
// ============================================================================

/// Fetch the catalog and print every entry.
pub fn catalog(runner: &CliRunner, repo: &PluginRepository, out: &dyn Output) -> Result<(), CliError> {
    let catalog = runner.require_catalog(repo)?;
    print_catalog(&catalog, out);
    Ok(())
}

fn print_catalog(catalog: &Catalog, out: &dyn Output) {
    if catalog.is_empty() {
        out.println("The catalog is empty.");
        return;
    }

    out.header(&format!("Available Plugins ({})", catalog.len()));
    out.newline();
    for def in catalog.iter() {
        out.println(&format!(
            "{} ({}) v{}",
            def.name, def.internal_name, def.assembly_version
        ));
        if let Some(author) = &def.author {
            out.indented(&format!("Author: {}", author));
        }
        if let Some(description) = &def.description {
            out.indented(description);
        }
    }
}

// ============================================================================
// list
// ============================================================================

/// List installed plugins with their update status.
///
/// Works without a catalog; statuses are then reported as unknown.
pub fn list(runner: &CliRunner, repo: &PluginRepository, out: &dyn Output) -> Result<(), CliError> {
    let has_catalog = runner.wait_for_catalog(repo)?.is_some();
    let installed = repo.installed()?;
    let infos = repo.check()?;

    if installed.is_empty() {
        out.println("No plugins installed.");
        out.newline();
        out.println("Use 'pluginrepo install <InternalName>' to install plugins.");
        return Ok(());
    }

    out.header(&format!("Installed Plugins ({})", installed.len()));
    out.newline();
    for plugin in &installed {
        let status = infos
            .iter()
            .find(|info| info.internal_name == plugin.internal_name)
            .map(|info| describe_status(info, has_catalog))
            .unwrap_or_else(|| "unknown".to_string());
        let state = if plugin.disabled { "disabled" } else { "enabled" };
        out.println(&format!(
            "  {} v{} [{}] - {}",
            plugin.internal_name, plugin.version, state, status
        ));
    }

    if !has_catalog {
        out.newline();
        out.println("Catalog unavailable; update status could not be determined.");
    }
    Ok(())
}

fn describe_status(info: &PluginInfo, has_catalog: bool) -> String {
    match &info.status {
        PluginStatus::MissingDefinition => "no cached definition".to_string(),
        _ if !has_catalog => "unknown".to_string(),
        PluginStatus::UpToDate => "up to date".to_string(),
        PluginStatus::UpdateAvailable {
            installed,
            available,
        } => format!("update available ({} -> {})", installed, available),
        PluginStatus::Orphaned { .. } => "not in catalog".to_string(),
    }
}

// ============================================================================
// install
// ============================================================================

/// Install the catalog's current version of a plugin.
pub fn install(
    runner: &CliRunner,
    repo: &PluginRepository,
    internal_name: &str,
    disabled: bool,
    out: &dyn Output,
) -> Result<(), CliError> {
    let catalog = runner.require_catalog(repo)?;
    let definition = catalog
        .find_by_internal_name(internal_name)
        .ok_or_else(|| CliError::NotInCatalog(internal_name.to_string()))?;

    let outcome = repo.try_install(definition, !disabled)?;
    out.println(&describe_outcome(
        &definition.internal_name,
        &definition.assembly_version,
        outcome,
    ));
    Ok(())
}

fn describe_outcome(internal_name: &str, version: &str, outcome: InstallOutcome) -> String {
    match outcome {
        InstallOutcome::AlreadyInstalled => {
            format!("{} v{} is already installed.", internal_name, version)
        }
        InstallOutcome::Enabled => {
            format!("{} v{} was already installed and is now enabled.", internal_name, version)
        }
        InstallOutcome::InstalledDisabled => {
            format!("Installed {} v{} (disabled).", internal_name, version)
        }
        InstallOutcome::InstalledAndLoaded => {
            format!("Installed {} v{}.", internal_name, version)
        }
    }
}

// ============================================================================
// update
// ============================================================================

/// Update every installed plugin that has a newer catalog version.
pub fn update(
    runner: &CliRunner,
    repo: &PluginRepository,
    dry_run: bool,
    out: &dyn Output,
) -> Result<(), CliError> {
    runner.require_catalog(repo)?;
    let report = repo.update(dry_run);
    print_report(&report, out);

    if report.success {
        Ok(())
    } else {
        Err(CliError::UpdateFailed {
            failed: report.failed_plugins().count(),
            warnings: report.warnings.len(),
        })
    }
}

fn print_report(report: &UpdateReport, out: &dyn Output) {
    if report.statuses.is_empty() && report.warnings.is_empty() {
        out.println("All plugins are up to date.");
        return;
    }

    if !report.statuses.is_empty() {
        let title = if report.dry_run {
            "Updates Available"
        } else {
            "Updated Plugins"
        };
        out.header(title);
        for status in &report.statuses {
            let mark = match (report.dry_run, status.was_updated) {
                (true, _) => "would update",
                (false, true) => "updated",
                (false, false) => "FAILED",
            };
            out.indented(&format!("{} - {}", status.internal_name, mark));
        }
    }

    if !report.warnings.is_empty() {
        out.newline();
        out.header("Warnings");
        for warning in &report.warnings {
            let subject = warning.internal_name.as_deref().unwrap_or("(repository)");
            out.indented(&format!("{} [{}]: {}", subject, warning.step, warning.message));
        }
    }
}

// ============================================================================
// enable / disable
// ============================================================================

/// Enable or disable the latest installed version of a plugin.
pub fn set_enabled(
    repo: &PluginRepository,
    internal_name: &str,
    enabled: bool,
    out: &dyn Output,
) -> Result<(), CliError> {
    let plugin = repo.set_enabled(internal_name, enabled)?;
    let verb = if enabled { "Enabled" } else { "Disabled" };
    out.println(&format!("{} {} v{}.", verb, plugin.internal_name, plugin.version));
    Ok(())
}
