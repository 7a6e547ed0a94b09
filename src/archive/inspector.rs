//! Downloaded release archives
//!
//! An [`Archive`] owns its downloaded file until [`Archive::delete`] is called.
//! Extraction goes through a scratch directory first, so a broken archive
//! never touches the installation.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::archive::error::ArchiveError;
use crate::archive::manifest::ManifestConfig;
use crate::config::MANIFEST_FILE;

/// Origins whose zipballs wrap the sources in a `{vendor}-{name}-{short sha}` folder
const WRAPPED_ARCHIVE_HOSTS: &[&str] = &["api.github.com", "codeload.github.com"];

/// Length of the abbreviated commit hash in wrapped folder names
const SHORT_REFERENCE_LEN: usize = 7;

/// Compute the folder a source host wraps archive contents in, if any.
///
/// GitHub zipballs contain a single top-level directory such as
/// `acme-app-878ec3c`; other hosts place files at the archive root.
pub fn base_folder(url: &str, package_name: &str, reference: Option<&str>) -> Option<String> {
    if !WRAPPED_ARCHIVE_HOSTS.iter().any(|host| url.contains(host)) {
        return None;
    }

    let short_reference: String = reference?.chars().take(SHORT_REFERENCE_LEN).collect();
    Some(format!(
        "{}-{}",
        package_name.replace('/', "-"),
        short_reference
    ))
}

/// Labels and layout of a downloaded archive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub base_folder: Option<String>,
    pub package: Option<String>,
    pub version: Option<String>,
}

pub struct Archive {
    path: PathBuf,
    zip: Option<ZipArchive<File>>,
    options: ArchiveOptions,
    manifest: Option<ManifestConfig>,
}

impl Archive {
    /// Open a downloaded ZIP file
    pub fn open(path: impl Into<PathBuf>, options: ArchiveOptions) -> Result<Self, ArchiveError> {
        let path = path.into();
        let unreadable = |reason: String| ArchiveError::Unreadable {
            path: path.clone(),
            reason,
        };

        let file = File::open(&path).map_err(|e| unreadable(e.to_string()))?;
        let zip = ZipArchive::new(file).map_err(|e| unreadable(e.to_string()))?;

        debug!(
            "Opened archive {:?} ({} entries, base folder {:?})",
            path,
            zip.len(),
            options.base_folder
        );

        Ok(Self {
            path,
            zip: Some(zip),
            options,
            manifest: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn package(&self) -> Option<&str> {
        self.options.package.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.options.version.as_deref()
    }

    pub fn base_folder(&self) -> Option<&str> {
        self.options.base_folder.as_deref()
    }

    /// Location of `updater.json` inside the archive
    fn manifest_path(&self) -> String {
        match &self.options.base_folder {
            Some(folder) => format!("{}/{}", folder, MANIFEST_FILE),
            None => MANIFEST_FILE.to_string(),
        }
    }

    /// Check whether the archive carries an `updater.json`
    pub fn has_manifest(&self) -> bool {
        let name = self.manifest_path();
        self.zip
            .as_ref()
            .is_some_and(|zip| zip.index_for_name(&name).is_some())
    }

    /// Read and validate the archive's `updater.json`
    pub fn manifest(&mut self) -> Result<ManifestConfig, ArchiveError> {
        if let Some(manifest) = &self.manifest {
            return Ok(manifest.clone());
        }

        let name = self.manifest_path();
        let zip = self
            .zip
            .as_mut()
            .ok_or_else(|| ArchiveError::Closed(self.path.clone()))?;

        let mut content = Vec::new();
        match zip.by_name(&name) {
            Ok(mut entry) => {
                entry
                    .read_to_end(&mut content)
                    .map_err(|e| ArchiveError::Unreadable {
                        path: self.path.clone(),
                        reason: format!("failed to read {name}: {e}"),
                    })?;
            }
            Err(ZipError::FileNotFound) => return Err(ArchiveError::ManifestMissing(name)),
            Err(e) => {
                return Err(ArchiveError::Unreadable {
                    path: self.path.clone(),
                    reason: format!("failed to read {name}: {e}"),
                });
            }
        }

        let manifest = ManifestConfig::from_slice(&content).map_err(ArchiveError::ManifestInvalid)?;
        self.manifest = Some(manifest.clone());
        Ok(manifest)
    }

    /// Extract the archive over `destination`.
    ///
    /// Everything is unpacked into a scratch directory first; only the
    /// (base-folder qualified) subtree is then copied, overwriting existing files.
    pub fn extract(&mut self, destination: &Path) -> Result<(), ArchiveError> {
        let zip = self
            .zip
            .as_mut()
            .ok_or_else(|| ArchiveError::Closed(self.path.clone()))?;

        let scratch = tempfile::Builder::new()
            .prefix("updater-archive-")
            .tempdir()
            .map_err(|e| {
                ArchiveError::ExtractionFailed(format!("failed to create scratch directory: {e}"))
            })?;

        zip.extract(scratch.path())
            .map_err(|e| ArchiveError::ExtractionFailed(e.to_string()))?;

        let source = match &self.options.base_folder {
            Some(folder) => scratch.path().join(folder),
            None => scratch.path().to_path_buf(),
        };
        if !source.is_dir() {
            return Err(ArchiveError::ExtractionFailed(format!(
                "folder {} not found in archive",
                self.options.base_folder.as_deref().unwrap_or_default()
            )));
        }

        let copied = copy_tree(&source, destination)?;
        info!("Extracted {} files to {:?}", copied, destination);

        Ok(())
    }

    /// Release the underlying ZIP reader. Safe to call more than once.
    pub fn close(&mut self) {
        if self.zip.take().is_some() {
            debug!("Closed archive {:?}", self.path);
        }
    }

    /// Close the archive and remove the downloaded file
    pub fn delete(mut self) -> Result<(), ArchiveError> {
        self.close();
        fs::remove_file(&self.path).map_err(|source| ArchiveError::Delete {
            path: self.path.clone(),
            source,
        })?;
        debug!("Deleted archive {:?}", self.path);
        Ok(())
    }
}

/// Copy every file below `source` into `destination`, returning the file count
fn copy_tree(source: &Path, destination: &Path) -> Result<usize, ArchiveError> {
    let failed = |action: &str, path: &Path, e: std::io::Error| {
        ArchiveError::ExtractionFailed(format!("failed to {action} {path:?}: {e}"))
    };

    fs::create_dir_all(destination).map_err(|e| failed("create", destination, e))?;

    let mut copied = 0;
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| {
            ArchiveError::ExtractionFailed(format!("failed to read extracted files: {e}"))
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| ArchiveError::ExtractionFailed(e.to_string()))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| failed("create", &target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| failed("create", parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| failed("copy to", &target, e))?;
            copied += 1;
        }
    }

    Ok(copied)
}
