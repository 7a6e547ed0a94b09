//! Package metadata as served by Composer repositories

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;

use crate::repository::error::RegistryError;

/// `vendor/name` package names, as accepted by Composer
static PACKAGE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([_.-]?[a-z0-9]+)*/[a-z0-9](([_.]?|-{0,2})[a-z0-9]+)*$")
        .expect("valid package name pattern")
});

/// Development branches tried in order of preference
const DEV_BRANCHES: &[&str] = &["dev-main", "dev-master"];

/// Check whether a package name has the `vendor/name` shape
pub fn is_valid_package_name(name: &str) -> bool {
    PACKAGE_NAME_RE.is_match(name)
}

/// Distribution information for a release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Dist {
    /// Archive download URL
    pub url: String,
    /// VCS reference the archive was built from (commit hash for GitHub)
    #[serde(default)]
    pub reference: Option<String>,
}

/// Metadata for a single release of a package
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseMeta {
    /// Package name as declared by the release itself
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dist: Option<Dist>,
}

/// A package and every release the repository knows about
///
/// Releases keep the order the repository served them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    name: String,
    releases: IndexMap<String, ReleaseMeta>,
}

impl PackageDescriptor {
    pub fn new(name: impl Into<String>, releases: IndexMap<String, ReleaseMeta>) -> Self {
        Self {
            name: name.into(),
            releases,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the package has a release
    pub fn has(&self, version: &str) -> bool {
        self.releases.contains_key(version)
    }

    /// All release names in wire order
    pub fn releases(&self) -> Vec<String> {
        self.releases.keys().cloned().collect()
    }

    /// Gets the metadata for a release
    pub fn release(&self, version: &str) -> Result<&ReleaseMeta, RegistryError> {
        self.releases
            .get(version)
            .ok_or_else(|| RegistryError::ReleaseNotFound {
                package: self.name.clone(),
                version: version.to_string(),
            })
    }

    /// Gets the distribution of a release
    pub fn dist(&self, version: &str) -> Result<&Dist, RegistryError> {
        self.release(version)?
            .dist
            .as_ref()
            .ok_or_else(|| RegistryError::MissingDistribution {
                package: self.name.clone(),
                version: version.to_string(),
            })
    }

    /// The development branch pseudo-release, `dev-main` preferred over `dev-master`
    pub fn dev_release(&self) -> Option<&str> {
        DEV_BRANCHES
            .iter()
            .copied()
            .find(|branch| self.has(branch))
    }
}
