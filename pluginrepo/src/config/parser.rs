//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [repository] section
    if let Some(section) = ini.section(Some("repository")) {
        if let Some(v) = section.get("base_url") {
            let v = v.trim();
            if !v.is_empty() {
                if !(v.starts_with("http://") || v.starts_with("https://")) {
                    return Err(invalid("repository", "base_url", v, "must be an http(s) URL"));
                }
                config.repository.base_url = v.trim_end_matches('/').to_string();
            }
        }
        if let Some(v) = non_empty(section.get("plugin_root")) {
            config.repository.plugin_root = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("temp_dir")) {
            config.repository.temp_dir = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("timeout_secs")) {
            let secs: u64 = v.parse().map_err(|_| {
                invalid("repository", "timeout_secs", v, "must be a whole number of seconds")
            })?;
            if secs == 0 {
                return Err(invalid(
                    "repository",
                    "timeout_secs",
                    v,
                    "must be greater than 0 (leave empty for no timeout)",
                ));
            }
            config.repository.timeout_secs = Some(secs);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("directory")) {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
