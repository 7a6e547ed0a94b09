//! HTTP basic credentials from Composer `auth.json` files
//!
//! ```json
//! { "http-basic": { "repo.example.com": { "username": "...", "password": "..." } } }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::repository::error::CredentialError;

const HTTP_BASIC_KEY: &str = "http-basic";

/// Username and password for a repository host
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields must be set for the credentials to be sent
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct AuthFile {
    #[serde(rename = "http-basic", default)]
    http_basic: HashMap<String, Credentials>,
}

/// Credentials merged from every candidate `auth.json`, keyed by host
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    hosts: HashMap<String, Credentials>,
    write_path: PathBuf,
}

impl CredentialStore {
    /// Load credentials from `files` in order; later files override earlier ones
    /// for the same host. Missing files are skipped. Newly captured credentials
    /// are written to `write_path`.
    pub fn load(files: &[PathBuf], write_path: impl Into<PathBuf>) -> Result<Self, CredentialError> {
        let mut hosts = HashMap::new();

        for path in files {
            if !path.exists() {
                continue;
            }
            let auth = read_auth_file(path)?;
            debug!(
                "Loaded {} credential host(s) from {:?}",
                auth.http_basic.len(),
                path
            );
            hosts.extend(auth.http_basic);
        }

        Ok(Self {
            hosts,
            write_path: write_path.into(),
        })
    }

    /// Credentials for a host, if any were configured
    pub fn get(&self, host: &str) -> Option<&Credentials> {
        self.hosts.get(host)
    }

    /// Remember credentials for a host and persist them to the local credential file.
    ///
    /// Existing content of the file, including unrelated keys, is preserved.
    pub fn store(&mut self, host: &str, credentials: Credentials) -> Result<(), CredentialError> {
        let path = &self.write_path;

        let existing = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| CredentialError::Read {
                path: path.clone(),
                source,
            })?;
            Some(
                serde_json::from_str::<serde_json::Value>(&content).map_err(|source| {
                    CredentialError::Parse {
                        path: path.clone(),
                        source,
                    }
                })?,
            )
        } else {
            None
        };

        let mut document = match existing {
            Some(value @ serde_json::Value::Object(_)) => value,
            _ => serde_json::json!({}),
        };
        if let serde_json::Value::Object(root) = &mut document {
            let http_basic = root
                .entry(HTTP_BASIC_KEY)
                .or_insert_with(|| serde_json::json!({}));
            if !http_basic.is_object() {
                *http_basic = serde_json::json!({});
            }
            if let Some(hosts) = http_basic.as_object_mut() {
                hosts.insert(
                    host.to_string(),
                    serde_json::json!({
                        "username": credentials.username,
                        "password": credentials.password,
                    }),
                );
            }
        }

        let content = serde_json::to_string_pretty(&document).map_err(|e| {
            CredentialError::Write {
                path: path.clone(),
                source: std::io::Error::other(e),
            }
        })?;
        std::fs::write(path, content).map_err(|source| CredentialError::Write {
            path: path.clone(),
            source,
        })?;

        info!("Saved credentials for {} to {:?}", host, path);
        self.hosts.insert(host.to_string(), credentials);
        Ok(())
    }
}

fn read_auth_file(path: &Path) -> Result<AuthFile, CredentialError> {
    let content = std::fs::read_to_string(path).map_err(|source| CredentialError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CredentialError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
