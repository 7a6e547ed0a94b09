//! Persisted install state (`updater.lock`)
//!
//! The state file is the only record of which release is installed.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::STATE_FILE;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid state file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Timestamps are stored as local wall-clock time, `YYYY-MM-DD HH:MM:SS`
mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let value = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&value, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallState {
    pub version: String,
    #[serde(with = "timestamp")]
    pub created: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub modified: NaiveDateTime,
}

/// Whole seconds, matching what the state file can hold
fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

impl InstallState {
    /// Fresh state for a newly initialized installation
    pub fn new(version: impl Into<String>) -> Self {
        let now = now();
        Self {
            version: version.into(),
            created: now,
            modified: now,
        }
    }

    /// Record a newly applied release
    pub fn record(&mut self, version: impl Into<String>) {
        self.version = version.into();
        self.modified = now();
    }

    pub fn path(dir: &Path) -> PathBuf {
        dir.join(STATE_FILE)
    }

    pub fn exists(dir: &Path) -> bool {
        Self::path(dir).is_file()
    }

    pub fn load(dir: &Path) -> Result<Self, StateError> {
        let path = Self::path(dir);
        let content = std::fs::read_to_string(&path).map_err(|source| StateError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| StateError::Parse { path, source })
    }

    pub fn save(&self, dir: &Path) -> Result<(), StateError> {
        let path = Self::path(dir);
        let content = serde_json::to_string_pretty(self).map_err(|e| StateError::Write {
            path: path.clone(),
            source: std::io::Error::other(e),
        })?;
        std::fs::write(&path, content).map_err(|source| StateError::Write {
            path: path.clone(),
            source,
        })?;
        debug!("Saved install state {} to {:?}", self.version, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_then_load_returns_same_state() {
        let dir = TempDir::new().unwrap();
        let state = InstallState::new("0.1.0");

        state.save(dir.path()).unwrap();

        assert!(InstallState::exists(dir.path()));
        assert_eq!(InstallState::load(dir.path()).unwrap(), state);
    }

    #[test]
    fn load_reads_plain_timestamp_strings() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("updater.lock"),
            r#"{"version": "1.2.3", "created": "2024-01-02 03:04:05", "modified": "2024-02-03 04:05:06"}"#,
        )
        .unwrap();

        let state = InstallState::load(dir.path()).unwrap();

        assert_eq!(state.version, "1.2.3");
        assert_eq!(
            state.created.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-01-02 03:04:05"
        );
        assert_eq!(
            state.modified.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-02-03 04:05:06"
        );
    }

    #[test]
    fn record_updates_version_and_keeps_created() {
        let mut state = InstallState::new("0.1.0");
        let created = state.created;

        state.record("0.2.0");

        assert_eq!(state.version, "0.2.0");
        assert_eq!(state.created, created);
        assert!(state.modified >= created);
    }

    #[test]
    fn load_fails_when_missing() {
        let dir = TempDir::new().unwrap();

        assert!(!InstallState::exists(dir.path()));
        assert!(matches!(
            InstallState::load(dir.path()),
            Err(StateError::Read { .. })
        ));
    }

    #[test]
    fn save_failure_is_a_write_error() {
        let dir = TempDir::new().unwrap();

        let result = InstallState::new("0.1.0").save(&dir.path().join("missing"));

        assert!(matches!(result, Err(StateError::Write { .. })));
    }

    #[test]
    fn load_fails_for_invalid_timestamp() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("updater.lock"),
            r#"{"version": "1.2.3", "created": "yesterday", "modified": "today"}"#,
        )
        .unwrap();

        assert!(matches!(
            InstallState::load(dir.path()),
            Err(StateError::Parse { .. })
        ));
    }
}
