//! Mock collaborators shared by the manager unit tests.

use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::plugin::PluginDefinition;

use super::client::archive_url;
use super::loader::{LoaderError, PluginLoader};
use super::traits::PackageDownloader;
use super::{ManagerError, ManagerResult};

pub const BASE_URL: &str = "http://repo.test";

/// Build the zip archive the repository would serve for `definition`.
pub fn plugin_zip(definition: &PluginDefinition) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(definition.binary_file_name(), SimpleFileOptions::default())
        .unwrap();
    writer
        .write_all(format!("binary {}", definition.assembly_version).as_bytes())
        .unwrap();
    writer
        .start_file(definition.definition_file_name(), SimpleFileOptions::default())
        .unwrap();
    writer
        .write_all(serde_json::to_string(definition).unwrap().as_bytes())
        .unwrap();
    writer.finish().unwrap().into_inner()
}

/// Downloader serving in-memory archives keyed by URL.
#[derive(Default)]
pub struct MockDownloader {
    archives: Mutex<HashMap<String, Vec<u8>>>,
    pub calls: AtomicUsize,
    fail_mid_transfer: AtomicBool,
}

impl MockDownloader {
    pub fn serving(definitions: &[&PluginDefinition]) -> Self {
        let downloader = Self::default();
        for definition in definitions {
            downloader.serve(definition);
        }
        downloader
    }

    pub fn serve(&self, definition: &PluginDefinition) {
        self.archives.lock().unwrap().insert(
            archive_url(BASE_URL, &definition.internal_name),
            plugin_zip(definition),
        );
    }

    /// Make the next download write half the archive and then fail.
    pub fn fail_next(&self) {
        self.fail_mid_transfer.store(true, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PackageDownloader for MockDownloader {
    fn download(&self, url: &str, dest: &Path) -> ManagerResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let data = self
            .archives
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| ManagerError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })?;

        if self.fail_mid_transfer.swap(false, Ordering::SeqCst) {
            fs::write(dest, &data[..data.len() / 2]).unwrap();
            return Err(ManagerError::Http {
                url: url.to_string(),
                reason: "connection reset".to_string(),
            });
        }

        fs::write(dest, &data).unwrap();
        Ok(data.len() as u64)
    }
}

/// Loader recording every request it receives.
#[derive(Default)]
pub struct MockLoader {
    pub loaded: Mutex<Vec<PluginDefinition>>,
    pub loads: Mutex<Vec<(PathBuf, bool)>>,
    pub disables: Mutex<Vec<String>>,
    reject_loads: AtomicBool,
    fail_disables: AtomicBool,
}

impl MockLoader {
    pub fn with_loaded(definitions: Vec<PluginDefinition>) -> Self {
        Self {
            loaded: Mutex::new(definitions),
            ..Self::default()
        }
    }

    pub fn reject_loads(&self) {
        self.reject_loads.store(true, Ordering::SeqCst);
    }

    pub fn fail_disables(&self) {
        self.fail_disables.store(true, Ordering::SeqCst);
    }

    pub fn load_calls(&self) -> Vec<(PathBuf, bool)> {
        self.loads.lock().unwrap().clone()
    }

    pub fn disable_calls(&self) -> Vec<String> {
        self.disables.lock().unwrap().clone()
    }
}

impl PluginLoader for MockLoader {
    fn load(&self, binary: &Path, reload: bool) -> Result<(), LoaderError> {
        self.loads
            .lock()
            .unwrap()
            .push((binary.to_path_buf(), reload));
        if self.reject_loads.load(Ordering::SeqCst) {
            return Err(LoaderError::Rejected {
                path: binary.to_path_buf(),
                reason: "mock rejection".to_string(),
            });
        }
        Ok(())
    }

    fn disable(&self, definition: &PluginDefinition) -> Result<(), LoaderError> {
        self.disables
            .lock()
            .unwrap()
            .push(definition.internal_name.clone());
        if self.fail_disables.load(Ordering::SeqCst) {
            return Err(LoaderError::DisableFailed {
                internal_name: definition.internal_name.clone(),
                reason: "mock failure".to_string(),
            });
        }
        self.loaded
            .lock()
            .unwrap()
            .retain(|d| d.internal_name != definition.internal_name);
        Ok(())
    }

    fn loaded_plugins(&self) -> Vec<PluginDefinition> {
        self.loaded.lock().unwrap().clone()
    }
}

/// Lay out an installed version with binary and cached definition.
pub fn install_fixture(root: &Path, definition: &PluginDefinition) -> PathBuf {
    let dir = root
        .join(&definition.internal_name)
        .join(&definition.assembly_version);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(definition.binary_file_name()), b"binary").unwrap();
    fs::write(
        dir.join(definition.definition_file_name()),
        serde_json::to_string(definition).unwrap(),
    )
    .unwrap();
    dir
}
