use std::path::PathBuf;

use thiserror::Error;

use crate::archive::error::ArchiveError;
use crate::archive::manifest::ManifestError;
use crate::repository::error::{CredentialError, RegistryError};
use crate::state::StateError;
use crate::version::error::VersionError;

#[derive(Debug, Error)]
pub enum UpdaterError {
    #[error("{0}")]
    Version(#[from] VersionError),

    #[error("A version number is required")]
    VersionRequired,

    #[error("Invalid directory {0:?}")]
    InvalidDirectory(PathBuf),

    #[error("Could not find updater.json in {0:?}")]
    ManifestMissing(PathBuf),

    #[error("{0}")]
    Manifest(#[from] ManifestError),

    #[error("This installation has already been initialized ({0:?})")]
    AlreadyInitialized(PathBuf),

    #[error("This installation has not been initialized ({0:?}), run init first")]
    NotInitialized(PathBuf),

    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Credentials(#[from] CredentialError),

    #[error("Release {0} does not contain an updater.json")]
    InvalidPackage(String),

    #[error("{0}")]
    Archive(#[from] ArchiveError),

    #[error("{0}")]
    State(#[from] StateError),

    #[error("Failed to read input: {0}")]
    Prompt(#[source] std::io::Error),
}

impl UpdaterError {
    /// Short label printed in front of the error detail
    pub fn category(&self) -> &'static str {
        match self {
            UpdaterError::Version(_) | UpdaterError::VersionRequired => "InvalidVersion",
            UpdaterError::InvalidDirectory(_) => "InvalidDirectory",
            UpdaterError::ManifestMissing(_) => "ManifestMissing",
            UpdaterError::Manifest(_) => "ManifestInvalid",
            UpdaterError::AlreadyInitialized(_) => "AlreadyInitialized",
            UpdaterError::NotInitialized(_) => "NotInitialized",
            UpdaterError::Registry(e) => match e {
                RegistryError::NotFound(_) => "PackageNotFound",
                RegistryError::Unauthorized(_) => "Unauthorized",
                RegistryError::ReleaseNotFound { .. } => "ReleaseNotFound",
                RegistryError::MissingDistribution { .. } => "InvalidPackage",
                RegistryError::Network(_)
                | RegistryError::InvalidResponse(_)
                | RegistryError::InvalidUrl { .. }
                | RegistryError::Download { .. } => "TransportError",
            },
            UpdaterError::Credentials(e) => match e {
                CredentialError::Write { .. } => "CredentialWriteFailed",
                CredentialError::Read { .. } | CredentialError::Parse { .. } => {
                    "CredentialReadFailed"
                }
            },
            UpdaterError::InvalidPackage(_) => "InvalidPackage",
            UpdaterError::Archive(e) => match e {
                ArchiveError::Unreadable { .. } | ArchiveError::ManifestMissing(_) => {
                    "InvalidPackage"
                }
                ArchiveError::ManifestInvalid(_) => "ManifestInvalid",
                ArchiveError::ExtractionFailed(_)
                | ArchiveError::Closed(_)
                | ArchiveError::Delete { .. } => "ExtractionFailed",
            },
            UpdaterError::State(e) => match e {
                StateError::Write { .. } => "StateWriteFailed",
                StateError::Read { .. } | StateError::Parse { .. } => "StateReadFailed",
            },
            UpdaterError::Prompt(_) => "PromptFailed",
        }
    }

    /// Whether the repository rejected the request for missing or wrong credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, UpdaterError::Registry(RegistryError::Unauthorized(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(VersionError::InvalidVersion("1.0".into()).into(), "InvalidVersion")]
    #[case(UpdaterError::VersionRequired, "InvalidVersion")]
    #[case(RegistryError::NotFound("acme/app".into()).into(), "PackageNotFound")]
    #[case(RegistryError::Unauthorized("http://localhost".into()).into(), "Unauthorized")]
    #[case(RegistryError::InvalidResponse("bad".into()).into(), "TransportError")]
    #[case(
        RegistryError::ReleaseNotFound { package: "acme/app".into(), version: "9.9.9".into() }.into(),
        "ReleaseNotFound"
    )]
    #[case(UpdaterError::ManifestMissing(PathBuf::from("/srv/app")), "ManifestMissing")]
    #[case(ManifestError::MissingField("url").into(), "ManifestInvalid")]
    #[case(UpdaterError::InvalidPackage("0.2.0".into()), "InvalidPackage")]
    #[case(ArchiveError::ManifestMissing("updater.json".into()).into(), "InvalidPackage")]
    #[case(
        ArchiveError::ManifestInvalid(ManifestError::MissingField("package")).into(),
        "ManifestInvalid"
    )]
    #[case(ArchiveError::ExtractionFailed("disk full".into()).into(), "ExtractionFailed")]
    #[case(UpdaterError::AlreadyInitialized(PathBuf::from("/srv/app")), "AlreadyInitialized")]
    #[case(UpdaterError::NotInitialized(PathBuf::from("/srv/app")), "NotInitialized")]
    #[case(
        StateError::Write {
            path: PathBuf::from("/srv/app/updater.lock"),
            source: std::io::Error::other("read-only"),
        }
        .into(),
        "StateWriteFailed"
    )]
    #[case(
        CredentialError::Write {
            path: PathBuf::from("/srv/app/auth.json"),
            source: std::io::Error::other("read-only"),
        }
        .into(),
        "CredentialWriteFailed"
    )]
    fn category_returns_expected(#[case] error: UpdaterError, #[case] expected: &str) {
        assert_eq!(error.category(), expected);
    }

    #[test]
    fn is_unauthorized_only_for_401() {
        assert!(UpdaterError::from(RegistryError::Unauthorized("x".into())).is_unauthorized());
        assert!(!UpdaterError::from(RegistryError::NotFound("x".into())).is_unauthorized());
    }
}
