//! Zip archive extraction.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use zip::ZipArchive;

use super::traits::ArchiveExtractor;
use super::{ManagerError, ManagerResult};

/// Extracts zip archives verbatim into a directory.
///
/// Entries whose paths would escape the destination, and symlink entries,
/// are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl ZipExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> ManagerResult<usize> {
        let extraction_error = |reason: String| ManagerError::ExtractionFailed {
            archive: archive_path.to_path_buf(),
            reason,
        };
        let write_error = |path: &Path, source: io::Error| ManagerError::WriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(archive_path).map_err(|e| ManagerError::ReadFailed {
            path: archive_path.to_path_buf(),
            source: e,
        })?;
        let mut archive = ZipArchive::new(file).map_err(|e| extraction_error(e.to_string()))?;

        let mut written = 0;
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| extraction_error(e.to_string()))?;

            let Some(relative) = entry.enclosed_name() else {
                tracing::warn!(entry = entry.name(), "Skipping archive entry outside target");
                continue;
            };

            if let Some(mode) = entry.unix_mode() {
                if (mode & 0o170000) == 0o120000 {
                    continue;
                }
            }

            let out_path = dest_dir.join(relative);
            if entry.is_dir() {
                fs::create_dir_all(&out_path).map_err(|e| write_error(&out_path, e))?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
            }
            let mut out = File::create(&out_path).map_err(|e| write_error(&out_path, e))?;
            io::copy(&mut entry, &mut out).map_err(|e| extraction_error(e.to_string()))?;
            written += 1;
        }

        Ok(written)
    }
}
