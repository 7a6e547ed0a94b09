//! Repository trait for resolving packages and downloading release archives

use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;

use crate::repository::credentials::Credentials;
use crate::repository::error::RegistryError;
use crate::repository::types::PackageDescriptor;

/// Trait for talking to a package repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    /// Host of the repository, used as the key for stored credentials
    fn host(&self) -> Option<String>;

    /// Replace the HTTP basic credentials attached to every request
    fn set_credentials(&mut self, credentials: Option<Credentials>);

    /// Fetch a package and all of its releases
    ///
    /// # Returns
    /// * `Ok(PackageDescriptor)` - Releases in the order the repository lists them
    /// * `Err(RegistryError::NotFound)` - The package is not in this repository
    /// * `Err(RegistryError::Unauthorized)` - Credentials are missing or wrong
    async fn resolve(&self, package_name: &str) -> Result<PackageDescriptor, RegistryError>;

    /// Download an archive to a new temporary file and return its path
    ///
    /// The caller owns the returned file and is responsible for deleting it.
    async fn download_archive(&self, url: &str) -> Result<PathBuf, RegistryError>;
}
