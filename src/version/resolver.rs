//! Next-release resolution
//!
//! Installations advance one release at a time along a single release
//! history. [`next`] walks the current major line so every intermediate
//! release (and its hooks) is applied; [`next_major`] is only used by the
//! explicit upgrade operation.

use semver::Version;

use crate::version::error::VersionError;
use crate::version::semver::{parse_strict, require_strict};

/// Find the next release within the same major version as `current`.
///
/// Non-conforming release names are ignored. Returns `Ok(None)` when
/// `current` is already the newest release of its major line.
pub fn next(current: &str, candidates: &[String]) -> Result<Option<String>, VersionError> {
    let current = require_strict(current)?;
    Ok(first_after(&current, current.major, candidates))
}

/// Find the first release of the major version following `current`.
pub fn next_major(current: &str, candidates: &[String]) -> Result<Option<String>, VersionError> {
    let current = require_strict(current)?;
    let Some(target_major) = current.major.checked_add(1) else {
        return Ok(None);
    };
    Ok(first_after(&current, target_major, candidates))
}

/// Sort the strict candidates ascending and return the first one in
/// `target_major` that is greater than `current`.
fn first_after(current: &Version, target_major: u64, candidates: &[String]) -> Option<String> {
    let mut ordered: Vec<(&String, Version)> = candidates
        .iter()
        .filter_map(|name| parse_strict(name).map(|parsed| (name, parsed)))
        .collect();

    ordered.sort_by(|(_, a), (_, b)| a.cmp(b));

    ordered
        .into_iter()
        .find(|(_, v)| v.major == target_major && v > current)
        .map(|(name, _)| name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("1.2.0", &["1.2", "1.2.1", "1.0", "1.1.0"], Some("1.2.1"))]
    #[case("1.1.0", &["1.2.0", "1.1.1", "1.1.2"], Some("1.1.1"))] // lowest newer first
    #[case("1.9.0", &["1.10.0", "1.9.1"], Some("1.9.1"))]
    #[case("1.9.1", &["1.10.0", "1.9.1"], Some("1.10.0"))] // numeric, not lexicographic
    #[case("1.0.0", &["2.0.0", "2.1.0"], None)] // different major
    #[case("1.2.0", &["1.2.0", "1.1.0"], None)] // already latest
    #[case("0.1.0", &["dev-main", "0.2.0-beta", "0.2.0"], Some("0.2.0"))]
    #[case("0.1.0", &["dev-main", "dev-master"], None)]
    #[case("0.1.0", &[], None)]
    #[case("0.1.0", &["0.2.0", "0.2.0"], Some("0.2.0"))] // duplicates are harmless
    fn next_returns_expected(
        #[case] current: &str,
        #[case] candidates: &[&str],
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            next(current, &names(candidates)).unwrap(),
            expected.map(|s| s.to_string())
        );
    }

    #[rstest]
    #[case("1.0.0", &["1.0.0", "1.1.0", "2.0.0", "2.1.0"], Some("2.0.0"))]
    #[case("1.5.0", &["2.1.0", "3.0.0", "2.0.1"], Some("2.0.1"))]
    #[case("1.0.0", &["3.0.0"], None)] // never skips a major
    #[case("1.0.0", &["1.1.0"], None)]
    #[case("0.3.0", &["1.0.0-rc1", "dev-main"], None)]
    #[case("18446744073709551615.0.0", &["1.0.0", "18446744073709551615.1.0"], None)] // no major after u64::MAX
    fn next_major_returns_expected(
        #[case] current: &str,
        #[case] candidates: &[&str],
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            next_major(current, &names(candidates)).unwrap(),
            expected.map(|s| s.to_string())
        );
    }

    #[rstest]
    #[case("1.0")]
    #[case("dev-main")]
    #[case("1.0.0-alpha")]
    #[case("")]
    fn malformed_current_version_is_rejected(#[case] current: &str) {
        let candidates = names(&["1.0.0", "2.0.0"]);
        let expected = Err(VersionError::InvalidVersion(current.to_string()));

        assert_eq!(next(current, &candidates), expected);
        assert_eq!(next_major(current, &candidates), expected);
    }

    #[test]
    fn never_returns_non_conforming_names() {
        let candidates = names(&[
            "1.0.1-beta",
            "dev-feature",
            "1.0.2",
            "v1.0.3",
            "2.0.0-alpha",
            "2.0.0",
        ]);

        let same_major = next("1.0.0", &candidates).unwrap();
        let major = next_major("1.0.0", &candidates).unwrap();

        assert_eq!(same_major, Some("1.0.2".to_string()));
        assert_eq!(major, Some("2.0.0".to_string()));
    }
}
