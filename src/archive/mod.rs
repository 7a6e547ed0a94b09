//! Release archives and the `updater.json` they carry
//!
//! # Modules
//!
//! - [`manifest`]: validated `updater.json` model
//! - [`inspector`]: open, inspect, extract and delete downloaded archives
//! - [`error`]: error type for archive operations

pub mod error;
pub mod inspector;
pub mod manifest;

pub use error::ArchiveError;
pub use inspector::{Archive, ArchiveOptions, base_folder};
pub use manifest::{HookPhase, ManifestConfig, ManifestError};
