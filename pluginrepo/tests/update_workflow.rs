//! Integration tests for the install/update workflow.
//!
//! These drive a [`PluginRepository`] end to end against an in-memory
//! repository server and a recording plugin loader, using real zip
//! extraction and a temporary plugin root.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use pluginrepo::manager::{
    archive_url, CatalogClient, FetchState, LoaderError, ManagerError, ManagerResult,
    PackageDownloader, PluginLoader, ZipExtractor,
};
use pluginrepo::plugin::{parse_definition, Catalog, PluginDefinition, DISABLED_MARKER};
use pluginrepo::repository::PluginRepository;

const BASE_URL: &str = "http://plugins.test";

// ============================================================================
// Test doubles
// ============================================================================

/// Catalog endpoint answering with a fixed catalog.
struct StaticCatalog(Catalog);

impl CatalogClient for StaticCatalog {
    fn fetch_catalog(&self, _url: &str) -> ManagerResult<Catalog> {
        Ok(self.0.clone())
    }
}

/// Archive endpoint serving `plugins/{name}/latest.zip` from memory.
#[derive(Default)]
struct ArchiveServer {
    archives: Mutex<HashMap<String, Vec<u8>>>,
    truncate_next: Mutex<Option<String>>,
    requests: AtomicUsize,
}

impl ArchiveServer {
    fn serving(definitions: &[&PluginDefinition]) -> Self {
        let server = Self::default();
        for definition in definitions {
            server.archives.lock().unwrap().insert(
                archive_url(BASE_URL, &definition.internal_name),
                plugin_zip(definition),
            );
        }
        server
    }

    /// Cut the next transfer of this plugin's archive in half.
    fn truncate_next(&self, internal_name: &str) {
        *self.truncate_next.lock().unwrap() = Some(archive_url(BASE_URL, internal_name));
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PackageDownloader for ArchiveServer {
    fn download(&self, url: &str, dest: &Path) -> ManagerResult<u64> {
        self.requests.fetch_add(1, Ordering::SeqCst);

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

        let mut truncate = self.truncate_next.lock().unwrap();
        if truncate.as_deref() == Some(url) {
            *truncate = None;
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

/// Loader that loads a binary by reading the definition next to it.
#[derive(Default)]
struct RecordingLoader {
    loaded: Mutex<Vec<PluginDefinition>>,
    loads: Mutex<Vec<(PathBuf, bool)>>,
    disables: Mutex<Vec<String>>,
}

impl RecordingLoader {
    fn with_loaded(definitions: &[&PluginDefinition]) -> Self {
        let loader = Self::default();
        loader
            .loaded
            .lock()
            .unwrap()
            .extend(definitions.iter().map(|d| (*d).clone()));
        loader
    }

    fn loads(&self) -> Vec<(PathBuf, bool)> {
        self.loads.lock().unwrap().clone()
    }

    fn disables(&self) -> Vec<String> {
        self.disables.lock().unwrap().clone()
    }
}

impl PluginLoader for RecordingLoader {
    fn load(&self, binary: &Path, reload: bool) -> Result<(), LoaderError> {
        self.loads.lock().unwrap().push((binary.to_path_buf(), reload));

        let json = fs::read_to_string(binary.with_extension("json")).map_err(|e| {
            LoaderError::Rejected {
                path: binary.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        let definition = parse_definition(&json).map_err(|e| LoaderError::Rejected {
            path: binary.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut loaded = self.loaded.lock().unwrap();
        loaded.retain(|d| d.internal_name != definition.internal_name);
        loaded.push(definition);
        Ok(())
    }

    fn disable(&self, definition: &PluginDefinition) -> Result<(), LoaderError> {
        self.disables
            .lock()
            .unwrap()
            .push(definition.internal_name.clone());
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

// ============================================================================
// Fixtures
// ============================================================================

fn plugin_zip(definition: &PluginDefinition) -> Vec<u8> {
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

/// Write an installed version directory as a previous install would have.
fn install_version(root: &Path, definition: &PluginDefinition, with_definition: bool) -> PathBuf {
    let dir = root
        .join(&definition.internal_name)
        .join(&definition.assembly_version);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(definition.binary_file_name()), b"old binary").unwrap();
    if with_definition {
        fs::write(
            dir.join(definition.definition_file_name()),
            serde_json::to_string(definition).unwrap(),
        )
        .unwrap();
    }
    dir
}

/// Every file under `root` with its contents.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(dir: &Path, root: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            let rel = path.strip_prefix(root).unwrap().to_path_buf();
            if path.is_dir() {
                out.insert(rel, Vec::new());
                walk(&path, root, out);
            } else {
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

struct Harness {
    root: TempDir,
    _temp: TempDir,
    server: Arc<ArchiveServer>,
    loader: Arc<RecordingLoader>,
    repo: PluginRepository,
}

impl Harness {
    fn new(catalog: Vec<PluginDefinition>, loader: RecordingLoader) -> Self {
        let refs: Vec<&PluginDefinition> = catalog.iter().collect();
        let server = Arc::new(ArchiveServer::serving(&refs));
        Self::with_server(catalog, server, loader)
    }

    fn with_server(
        catalog: Vec<PluginDefinition>,
        server: Arc<ArchiveServer>,
        loader: RecordingLoader,
    ) -> Self {
        let root = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        let loader = Arc::new(loader);

        let repo = PluginRepository::with_components(
            BASE_URL,
            root.path(),
            temp.path(),
            Arc::new(StaticCatalog(Catalog::new(catalog))),
            server.clone(),
            Arc::new(ZipExtractor::new()),
            loader.clone(),
        );

        Self {
            root,
            _temp: temp,
            server,
            loader,
            repo,
        }
    }

    fn root(&self) -> &Path {
        self.root.path()
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_outdated_enabled_plugin_is_updated_and_reloaded() {
    let installed = PluginDefinition::new("Plugin X", "PluginX", "1.0");
    let available = PluginDefinition::new("Plugin X", "PluginX", "2.0");
    let harness = Harness::new(
        vec![available.clone()],
        RecordingLoader::with_loaded(&[&installed]),
    );
    let old_dir = install_version(harness.root(), &installed, true);

    assert_eq!(harness.repo.wait_for_catalog().await, FetchState::Success);
    let report = harness.repo.update(false);

    assert!(report.success, "warnings: {:?}", report.warnings);
    assert_eq!(report.updated().collect::<Vec<_>>(), vec!["PluginX"]);
    assert_eq!(harness.loader.disables(), vec!["PluginX".to_string()]);

    // Superseded version is kept but marked
    assert!(old_dir.join(DISABLED_MARKER).exists());

    let new_dir = harness.root().join("PluginX").join("2.0");
    assert!(new_dir.join("PluginX.dll").exists());
    assert!(!new_dir.join(DISABLED_MARKER).exists());
    assert_eq!(
        harness.loader.loads(),
        vec![(new_dir.join("PluginX.dll"), false)]
    );
    assert!(harness.loader.is_loaded("PluginX"));
}

#[tokio::test]
async fn test_outdated_disabled_plugin_stays_disabled() {
    let installed = PluginDefinition::new("Plugin X", "PluginX", "1.0");
    let available = PluginDefinition::new("Plugin X", "PluginX", "2.0");
    let harness = Harness::new(vec![available], RecordingLoader::default());
    install_version(harness.root(), &installed, true);

    harness.repo.wait_for_catalog().await;
    let report = harness.repo.update(false);

    assert!(report.success);
    let new_dir = harness.root().join("PluginX").join("2.0");
    assert!(new_dir.join("PluginX.dll").exists());
    assert!(new_dir.join(DISABLED_MARKER).exists());
    assert!(harness.loader.loads().is_empty());
    assert!(harness.loader.disables().is_empty());
}

#[tokio::test]
async fn test_latest_version_without_definition_is_skipped() {
    let harness = Harness::new(
        vec![PluginDefinition::new("Plugin X", "PluginX", "2.0")],
        RecordingLoader::default(),
    );
    for version in ["1.0", "1.1"] {
        install_version(
            harness.root(),
            &PluginDefinition::new("Plugin X", "PluginX", version),
            true,
        );
    }
    install_version(
        harness.root(),
        &PluginDefinition::new("Plugin X", "PluginX", "1.2"),
        false,
    );
    let before = snapshot(harness.root());

    harness.repo.wait_for_catalog().await;
    let report = harness.repo.update(false);

    assert!(report.success);
    assert!(report.statuses.is_empty());
    assert!(report.warnings.is_empty());
    assert_eq!(snapshot(harness.root()), before);
    assert_eq!(harness.server.requests(), 0);
}

#[tokio::test]
async fn test_enabling_installed_plugin_skips_download() {
    let definition = PluginDefinition::new("Plugin X", "PluginX", "1.0");
    let harness = Harness::new(vec![definition.clone()], RecordingLoader::default());
    let dir = install_version(harness.root(), &definition, true);
    fs::write(dir.join(DISABLED_MARKER), b"").unwrap();

    assert!(harness.repo.install(&definition, true));

    assert!(!dir.join(DISABLED_MARKER).exists());
    assert_eq!(harness.loader.loads(), vec![(dir.join("PluginX.dll"), false)]);
    assert_eq!(harness.server.requests(), 0);
    // Existing binary is not replaced
    assert_eq!(fs::read(dir.join("PluginX.dll")).unwrap(), b"old binary");
}

#[tokio::test]
async fn test_interrupted_download_is_retried_from_scratch() {
    let definition = PluginDefinition::new("Plugin X", "PluginX", "1.0");
    let server = Arc::new(ArchiveServer::serving(&[&definition]));
    server.truncate_next("PluginX");
    let harness = Harness::with_server(
        vec![definition.clone()],
        server,
        RecordingLoader::default(),
    );
    let dir = harness.root().join("PluginX").join("1.0");

    assert!(!harness.repo.install(&definition, true));
    assert!(dir.is_dir());
    assert!(!dir.join("PluginX.dll").exists());
    fs::write(dir.join("leftover.tmp"), b"partial").unwrap();

    assert!(harness.repo.install(&definition, true));
    assert!(dir.join("PluginX.dll").exists());
    assert!(dir.join("PluginX.json").exists());
    assert!(!dir.join("leftover.tmp").exists());
    assert_eq!(harness.server.requests(), 2);
    assert!(harness.loader.is_loaded("PluginX"));
}

#[tokio::test]
async fn test_dry_run_matches_real_run_without_mutation() {
    let catalog = vec![
        PluginDefinition::new("Alpha", "Alpha", "2.0"),
        PluginDefinition::new("Beta", "Beta", "1.0"),
        PluginDefinition::new("Gamma", "Gamma", "3.1"),
    ];
    let local = [
        PluginDefinition::new("Alpha", "Alpha", "1.0"),
        PluginDefinition::new("Beta", "Beta", "1.0"),
        PluginDefinition::new("Gamma", "Gamma", "3.0"),
        PluginDefinition::new("Delta", "Delta", "1.0"),
    ];

    let dry = Harness::new(catalog.clone(), RecordingLoader::default());
    let real = Harness::new(catalog, RecordingLoader::default());
    for definition in &local {
        install_version(dry.root(), definition, true);
        install_version(real.root(), definition, true);
    }

    dry.repo.wait_for_catalog().await;
    real.repo.wait_for_catalog().await;

    let before = snapshot(dry.root());
    let dry_report = dry.repo.update(true);
    assert_eq!(snapshot(dry.root()), before);
    assert_eq!(dry.server.requests(), 0);
    assert!(dry.loader.disables().is_empty());

    let real_report = real.repo.update(false);

    assert!(dry_report.dry_run);
    assert!(real_report.success);
    assert_eq!(
        dry_report.updated().collect::<Vec<_>>(),
        real_report.updated().collect::<Vec<_>>()
    );
    assert_eq!(dry_report.updated().collect::<Vec<_>>(), vec!["Alpha", "Gamma"]);
}

#[tokio::test]
async fn test_failed_install_is_reported_and_run_continues() {
    let catalog = vec![
        PluginDefinition::new("Alpha", "Alpha", "2.0"),
        PluginDefinition::new("Beta", "Beta", "2.0"),
    ];
    // Only Beta's archive is published
    let server = Arc::new(ArchiveServer::serving(&[&catalog[1]]));
    let harness = Harness::with_server(catalog, server, RecordingLoader::default());
    install_version(harness.root(), &PluginDefinition::new("Alpha", "Alpha", "1.0"), true);
    install_version(harness.root(), &PluginDefinition::new("Beta", "Beta", "1.0"), true);

    harness.repo.wait_for_catalog().await;
    let report = harness.repo.update(false);

    assert!(!report.success);
    assert_eq!(report.failed_plugins().collect::<Vec<_>>(), vec!["Alpha"]);
    assert_eq!(report.updated().collect::<Vec<_>>(), vec!["Beta"]);
    assert!(harness.root().join("Beta").join("2.0").join("Beta.dll").exists());
}
