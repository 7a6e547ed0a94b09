use std::path::{Path, PathBuf};

// =============================================================================
// File names inside an installation
// =============================================================================

/// Per-release descriptor shipped inside every release archive
pub const MANIFEST_FILE: &str = "updater.json";

/// Persisted install state, written next to the manifest
pub const STATE_FILE: &str = "updater.lock";

/// Composer-style credential file
pub const CREDENTIALS_FILE: &str = "auth.json";

// =============================================================================
// Repository defaults
// =============================================================================

/// Host of the public registry served through the direct protocol
pub const DEFAULT_REGISTRY_HOST: &str = "packagist.org";

/// User agent sent with every repository request
pub const USER_AGENT: &str = "updater";

/// Number of times init asks for credentials before giving up
pub const MAX_CREDENTIAL_PROMPTS: usize = 3;

/// Environment variable holding the log filter for the binary
pub const LOG_ENV: &str = "UPDATER_LOG";

/// Returns the path to the data directory for updater.
/// Uses $XDG_DATA_HOME/updater if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/updater,
/// or ./updater if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("updater.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("updater")
}

/// Candidate credential files, lowest precedence first.
///
/// The global Composer home (`$COMPOSER_HOME`, else `~/.composer`) comes first,
/// the installation's own `auth.json` last so it overrides per host.
pub fn credential_files(working_dir: &Path) -> Vec<PathBuf> {
    credential_files_with_env(
        std::env::var("COMPOSER_HOME").ok(),
        dirs::home_dir(),
        working_dir,
    )
}

/// File that prompted credentials are written to
pub fn local_credentials_path(working_dir: &Path) -> PathBuf {
    working_dir.join(CREDENTIALS_FILE)
}

fn credential_files_with_env(
    composer_home: Option<String>,
    home_dir: Option<PathBuf>,
    working_dir: &Path,
) -> Vec<PathBuf> {
    let global = composer_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".composer")))
        .map(|dir| dir.join(CREDENTIALS_FILE));

    global
        .into_iter()
        .chain(std::iter::once(local_credentials_path(working_dir)))
        .collect()
}
