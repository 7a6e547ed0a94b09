//! `updater.json`: repository, package identity and lifecycle scripts
//!
//! ```json
//! {
//!     "url": "https://repo.example.com",
//!     "package": "acme/app",
//!     "version": "1.0.0",
//!     "scripts": {
//!         "before": ["php bin/maintenance on"],
//!         "after": ["composer install --no-dev", "php bin/maintenance off"]
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::repository::types::is_valid_package_name;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Error decoding JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// When a lifecycle script runs relative to extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    Before,
    After,
}

impl HookPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPhase::Before => "before",
            HookPhase::After => "after",
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shell commands per phase, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scripts {
    before: Vec<String>,
    after: Vec<String>,
}

impl Scripts {
    pub fn get(&self, phase: HookPhase) -> &[String] {
        match phase {
            HookPhase::Before => &self.before,
            HookPhase::After => &self.after,
        }
    }

    fn get_mut(&mut self, phase: HookPhase) -> &mut Vec<String> {
        match phase {
            HookPhase::Before => &mut self.before,
            HookPhase::After => &mut self.after,
        }
    }
}

/// A phase may list one command or several
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Commands {
    One(String),
    Many(Vec<String>),
}

impl From<Commands> for Vec<String> {
    fn from(commands: Commands) -> Self {
        match commands {
            Commands::One(command) => vec![command],
            Commands::Many(commands) => commands,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScripts {
    Phases(HashMap<String, Commands>),
    /// An empty map written by PHP; entries carry no phase and are skipped
    List(Vec<IgnoredAny>),
}

/// Unvalidated shape of `updater.json`; unknown keys are ignored
#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    package: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    scripts: Option<RawScripts>,
}

/// Validated `updater.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawManifest")]
pub struct ManifestConfig {
    url: String,
    package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    scripts: Scripts,
}

impl TryFrom<RawManifest> for ManifestConfig {
    type Error = ManifestError;

    fn try_from(raw: RawManifest) -> Result<Self, Self::Error> {
        let url = raw.url.ok_or(ManifestError::MissingField("url"))?;
        let package = raw.package.ok_or(ManifestError::MissingField("package"))?;

        let mut manifest = Self::new(&url, &package)?;
        manifest.version = raw.version;

        match raw.scripts {
            Some(RawScripts::Phases(mut phases)) => {
                for phase in [HookPhase::Before, HookPhase::After] {
                    if let Some(commands) = phases.remove(phase.as_str()) {
                        *manifest.scripts.get_mut(phase) = commands.into();
                    }
                }
            }
            Some(RawScripts::List(entries)) if !entries.is_empty() => {
                warn!("Ignoring {} scripts listed without a phase", entries.len());
            }
            _ => {}
        }

        Ok(manifest)
    }
}

impl ManifestConfig {
    /// Create a manifest, validating the repository URL and package name
    pub fn new(url: &str, package: &str) -> Result<Self, ManifestError> {
        let parsed = url::Url::parse(url).map_err(|e| ManifestError::InvalidField {
            field: "url",
            reason: e.to_string(),
        })?;
        if !parsed.has_host() {
            return Err(ManifestError::InvalidField {
                field: "url",
                reason: format!("{url} has no host"),
            });
        }

        if !is_valid_package_name(package) {
            return Err(ManifestError::InvalidField {
                field: "package",
                reason: format!("{package} is not a vendor/name package name"),
            });
        }

        Ok(Self {
            url: url.to_string(),
            package: package.to_string(),
            version: None,
            scripts: Scripts::default(),
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Append a command to a phase
    pub fn with_script(mut self, phase: HookPhase, command: impl Into<String>) -> Self {
        self.scripts.get_mut(phase).push(command.into());
        self
    }

    /// Parse and validate manifest bytes
    pub fn from_slice(content: &[u8]) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_json::from_slice(content)?;
        Self::try_from(raw)
    }

    pub fn from_json(content: &str) -> Result<Self, ManifestError> {
        Self::from_slice(content.as_bytes())
    }

    /// Read and validate a manifest file
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&content)
    }

    /// Write the manifest as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        std::fs::write(path, self.to_json()?).map_err(|source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Commands to run for a phase
    pub fn scripts(&self, phase: HookPhase) -> &[String] {
        self.scripts.get(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn from_json_parses_all_fields() {
        let manifest = ManifestConfig::from_json(
            r#"{
                "url": "http://127.0.0.1:8000",
                "package": "acme/app",
                "version": "0.1.0",
                "scripts": {
                    "before": ["echo one", "echo two"],
                    "after": "echo three"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.url(), "http://127.0.0.1:8000");
        assert_eq!(manifest.package(), "acme/app");
        assert_eq!(manifest.version(), Some("0.1.0"));
        assert_eq!(manifest.scripts(HookPhase::Before), ["echo one", "echo two"]);
        assert_eq!(manifest.scripts(HookPhase::After), ["echo three"]);
    }

    #[rstest]
    #[case(r#"{"url": "http://localhost", "package": "acme/app"}"#)]
    #[case(r#"{"url": "http://localhost", "package": "acme/app", "scripts": []}"#)]
    #[case(r#"{"url": "http://localhost", "package": "acme/app", "scripts": ["echo x"]}"#)]
    #[case(r#"{"url": "http://localhost", "package": "acme/app", "scripts": {}}"#)]
    #[case(r#"{"url": "http://localhost", "package": "acme/app", "scripts": {"during": ["x"]}}"#)]
    fn from_json_without_phase_scripts_has_none(#[case] json: &str) {
        let manifest = ManifestConfig::from_json(json).unwrap();

        assert!(manifest.scripts(HookPhase::Before).is_empty());
        assert!(manifest.scripts(HookPhase::After).is_empty());
    }

    #[test]
    fn from_json_ignores_unknown_keys() {
        let manifest = ManifestConfig::from_json(
            r#"{"url": "http://localhost", "package": "acme/app", "homepage": "x", "extra": {"a": 1}}"#,
        )
        .unwrap();

        assert_eq!(manifest, ManifestConfig::new("http://localhost", "acme/app").unwrap());
    }

    #[rstest]
    #[case(r#"{"package": "acme/app"}"#, "url")]
    #[case(r#"{"url": "http://localhost"}"#, "package")]
    fn from_json_requires_fields(#[case] json: &str, #[case] field: &str) {
        let result = ManifestConfig::from_json(json);

        assert!(matches!(result, Err(ManifestError::MissingField(f)) if f == field));
    }

    #[rstest]
    #[case(r#"{"url": "not a url", "package": "acme/app"}"#, "url")]
    #[case(r#"{"url": "mailto:someone@example.com", "package": "acme/app"}"#, "url")]
    #[case(r#"{"url": "http://localhost", "package": "Acme/App"}"#, "package")]
    #[case(r#"{"url": "http://localhost", "package": "app"}"#, "package")]
    fn from_json_rejects_invalid_fields(#[case] json: &str, #[case] expected_field: &str) {
        let result = ManifestConfig::from_json(json);

        assert!(matches!(
            result,
            Err(ManifestError::InvalidField { field, .. }) if field == expected_field
        ));
    }

    #[rstest]
    #[case("{foo")]
    #[case(r#"{"url": "http://localhost", "package": "acme/app", "scripts": "echo"}"#)]
    #[case(r#"{"url": 42, "package": "acme/app"}"#)]
    fn from_json_rejects_malformed_documents(#[case] json: &str) {
        let result = ManifestConfig::from_json(json);

        assert!(matches!(result, Err(ManifestError::Parse(_))));
    }

    #[test]
    fn from_slice_rejects_invalid_utf8() {
        let result = ManifestConfig::from_slice(b"{\"url\": \"\xff\"}");

        assert!(matches!(result, Err(ManifestError::Parse(_))));
    }

    #[test]
    fn save_writes_pretty_json_that_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("updater.json");
        let manifest = ManifestConfig::new("http://127.0.0.1:8000", "foo/bar")
            .unwrap()
            .with_script(HookPhase::After, "composer install");

        manifest.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n    \"package\": \"foo/bar\""));
        assert_eq!(ManifestConfig::load(&path).unwrap(), manifest);
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = TempDir::new().unwrap();

        let result = ManifestConfig::load(&dir.path().join("updater.json"));

        assert!(matches!(result, Err(ManifestError::Read { .. })));
    }

    #[test]
    fn deserialize_validates_through_serde() {
        let result: Result<ManifestConfig, _> =
            serde_json::from_str(r#"{"url": "http://localhost", "package": "bad"}"#);

        assert!(result.is_err());
    }
}
