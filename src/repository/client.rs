//! HTTP client for Composer repositories
//!
//! Two metadata layouts are supported:
//! - **Direct** (packagist.org): `GET {base}/p/{package}.json`
//! - **Indexed** (Satis and other private repositories): `GET {base}/packages.json`,
//!   then every file listed under `includes` until one contains the package

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{DEFAULT_REGISTRY_HOST, USER_AGENT};
use crate::repository::credentials::Credentials;
use crate::repository::error::RegistryError;
use crate::repository::registry::Repository;
use crate::repository::types::{PackageDescriptor, ReleaseMeta};

/// Metadata layout served by a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Single file per package, used by the public registry
    Direct,
    /// Root index pointing at secondary files through `includes`
    Indexed,
}

impl Protocol {
    /// Select the protocol from the repository host
    pub fn for_host(host: Option<&str>) -> Self {
        match host {
            Some(DEFAULT_REGISTRY_HOST) => Protocol::Direct,
            _ => Protocol::Indexed,
        }
    }
}

type ReleaseMap = IndexMap<String, ReleaseMeta>;

/// `{"packages": {name: {version: meta}}}`
#[derive(Debug, Deserialize)]
struct PackagesResponse {
    #[serde(default, deserialize_with = "map_or_empty_list")]
    packages: HashMap<String, ReleaseMap>,
}

/// Root `packages.json` of an indexed repository
#[derive(Debug, Deserialize)]
struct RootIndex {
    #[serde(default)]
    includes: IndexMap<String, IgnoredAny>,
}

/// Composer repositories written by PHP serialise an empty map as `[]`
fn map_or_empty_list<'de, D>(deserializer: D) -> Result<HashMap<String, ReleaseMap>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PackagesVisitor;

    impl<'de> Visitor<'de> for PackagesVisitor {
        type Value = HashMap<String, ReleaseMap>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of packages or an empty list")
        }

        fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
            Deserialize::deserialize(de::value::MapAccessDeserializer::new(map))
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(HashMap::new())
        }
    }

    deserializer.deserialize_any(PackagesVisitor)
}

/// Repository client over HTTP
pub struct RepositoryClient {
    client: reqwest::Client,
    base_url: String,
    host: Option<String>,
    protocol: Protocol,
    credentials: Option<Credentials>,
}

impl RepositoryClient {
    /// Creates a client for the repository at `base_url`
    pub fn new(base_url: &str, credentials: Option<Credentials>) -> Result<Self, RegistryError> {
        let parsed = url::Url::parse(base_url).map_err(|e| RegistryError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let host = parsed.host_str().map(str::to_string);
        let protocol = Protocol::for_host(host.as_deref());

        debug!("Using {:?} protocol for {}", protocol, base_url);

        Ok(Self {
            client: reqwest::Client::builder().user_agent(USER_AGENT).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            host,
            protocol,
            credentials,
        })
    }

    /// Force a protocol regardless of the repository host
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Send an authenticated GET and map error statuses
    async fn get(&self, url: &str) -> Result<reqwest::Response, RegistryError> {
        let mut request = self.client.get(url);
        if let Some(credentials) = self.credentials.as_ref().filter(|c| c.is_complete()) {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(url.to_string()));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RegistryError::Unauthorized(url.to_string()));
        }

        if !status.is_success() {
            warn!("Repository returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status {} from {}",
                status, url
            )));
        }

        Ok(response)
    }

    async fn get_packages(&self, url: &str) -> Result<PackagesResponse, RegistryError> {
        let response = self.get(url).await?;
        response.json().await.map_err(|e| {
            warn!("Failed to parse repository response from {}: {}", url, e);
            RegistryError::InvalidResponse(e.to_string())
        })
    }

    async fn resolve_direct(&self, package_name: &str) -> Result<PackageDescriptor, RegistryError> {
        let url = format!("{}/p/{}.json", self.base_url, package_name);
        debug!("Fetching package metadata: {}", url);

        let mut response = self.get_packages(&url).await?;

        response
            .packages
            .remove(package_name)
            .map(|releases| PackageDescriptor::new(package_name, releases))
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))
    }

    async fn resolve_indexed(&self, package_name: &str) -> Result<PackageDescriptor, RegistryError> {
        let url = format!("{}/packages.json", self.base_url);
        debug!("Fetching repository index: {}", url);

        let response = self.get(&url).await?;
        let index: RootIndex = response.json().await.map_err(|e| {
            warn!("Failed to parse repository index {}: {}", url, e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        for include in index.includes.keys() {
            let include_url = format!("{}/{}", self.base_url, include.trim_start_matches('/'));
            debug!("Searching {} for {}", include_url, package_name);

            let mut packages = self.get_packages(&include_url).await?;
            if let Some(releases) = packages.packages.remove(package_name) {
                return Ok(PackageDescriptor::new(package_name, releases));
            }
        }

        Err(RegistryError::NotFound(package_name.to_string()))
    }
}

#[async_trait::async_trait]
impl Repository for RepositoryClient {
    fn host(&self) -> Option<String> {
        self.host.clone()
    }

    fn set_credentials(&mut self, credentials: Option<Credentials>) {
        self.credentials = credentials;
    }

    async fn resolve(&self, package_name: &str) -> Result<PackageDescriptor, RegistryError> {
        match self.protocol {
            Protocol::Direct => self.resolve_direct(package_name).await,
            Protocol::Indexed => self.resolve_indexed(package_name).await,
        }
    }

    async fn download_archive(&self, url: &str) -> Result<PathBuf, RegistryError> {
        debug!("Downloading archive: {}", url);
        let mut response = self.get(url).await?;

        let mut file = tempfile::Builder::new()
            .prefix("updater-")
            .suffix(".zip")
            .tempfile()
            .map_err(|source| RegistryError::Download {
                path: std::env::temp_dir(),
                source,
            })?;

        // The temp file is removed on drop unless it is kept below.
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)
                .map_err(|source| RegistryError::Download {
                    path: file.path().to_path_buf(),
                    source,
                })?;
        }
        file.flush().map_err(|source| RegistryError::Download {
            path: file.path().to_path_buf(),
            source,
        })?;

        let path = file.into_temp_path().keep().map_err(|e| RegistryError::Download {
            path: std::env::temp_dir(),
            source: e.error,
        })?;

        debug!("Saved archive to {:?}", path);
        Ok(path)
    }
}
