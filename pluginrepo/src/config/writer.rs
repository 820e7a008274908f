//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let timeout_secs = config
        .repository
        .timeout_secs
        .map(|s| s.to_string())
        .unwrap_or_default();

    format!(
        r#"[repository]
; Base URL of the plugin repository. The catalog is read from
; {{base_url}}/pluginmaster.json and archives from
; {{base_url}}/plugins/{{InternalName}}/latest.zip
base_url = {}
; Root of the installed plugin tree (InternalName/Version/)
plugin_root = {}
; Directory for downloaded archives
temp_dir = {}
; HTTP request timeout in seconds (empty = wait indefinitely)
timeout_secs = {}

[logging]
; Log directory and file name
directory = {}
file = {}
"#,
        config.repository.base_url,
        path_to_string(&config.repository.plugin_root),
        path_to_string(&config.repository.temp_dir),
        timeout_secs,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
