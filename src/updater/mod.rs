//! Installation lifecycle
//!
//! # Modules
//!
//! - [`orchestrator`]: `Updater` running init, update and upgrade
//! - [`hooks`]: runs `before`/`after` scripts
//! - [`prompt`]: operator questions (versions, credentials)
//! - [`error`]: error taxonomy shown to the operator

pub mod error;
pub mod hooks;
pub mod orchestrator;
pub mod prompt;

pub use error::UpdaterError;
pub use orchestrator::{UpdateOptions, UpdateReport, Updater, UpgradeOptions, UpgradeOutcome};
