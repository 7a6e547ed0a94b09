use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::version::error::VersionError;

/// Release names that take part in ordering must match this exactly.
/// Pre-release tags (`1.0.0-beta`) and branch names (`dev-main`) do not.
static STRICT_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").expect("valid version pattern"));

/// Parse a strict `MAJOR.MINOR.PATCH` release name.
///
/// Components are compared numerically, so leading zeros are accepted
/// (`01.2.3` parses as `1.2.3`) and `1.9.0 < 1.10.0`.
///
/// Examples:
/// - "1.2.3" -> Some(Version(1, 2, 3))
/// - "1.2" -> None
/// - "1.2.3-beta" -> None
/// - "dev-main" -> None
pub fn parse_strict(version: &str) -> Option<Version> {
    let captures = STRICT_VERSION_RE.captures(version)?;
    let component = |i: usize| captures.get(i)?.as_str().parse::<u64>().ok();
    Some(Version::new(component(1)?, component(2)?, component(3)?))
}

/// Parse a strict release name, failing with `InvalidVersion` when it does not conform.
pub fn require_strict(version: &str) -> Result<Version, VersionError> {
    parse_strict(version).ok_or_else(|| VersionError::InvalidVersion(version.to_string()))
}

/// Check whether a release name is a strict semantic version
pub fn is_strict(version: &str) -> bool {
    parse_strict(version).is_some()
}

/// Check whether a release name refers to a development branch (`dev-main`, `dev-master`, ...)
pub fn is_dev_branch(version: &str) -> bool {
    version.starts_with("dev-")
}
