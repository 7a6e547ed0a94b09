//! Release ordering and next-version resolution
//!
//! # Modules
//!
//! - [`semver`]: strict `MAJOR.MINOR.PATCH` parsing used for ordering
//! - [`resolver`]: next release in the same major line, or the next major
//! - [`error`]: error type for malformed versions

pub mod error;
pub mod resolver;
pub mod semver;
