use std::path::PathBuf;

use thiserror::Error;

use crate::archive::manifest::ManifestError;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to open archive {path:?}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Config file {0} not found in archive")]
    ManifestMissing(String),

    #[error("Invalid updater.json: {0}")]
    ManifestInvalid(#[source] ManifestError),

    #[error("Error extracting archive: {0}")]
    ExtractionFailed(String),

    #[error("Archive {0:?} has been closed")]
    Closed(PathBuf),

    #[error("Failed to delete archive {path:?}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
