//! Package repository access
//!
//! # Modules
//!
//! - [`registry`]: `Repository` trait used by the orchestrator
//! - [`client`]: HTTP implementation for direct and indexed repositories
//! - [`credentials`]: HTTP basic credentials from `auth.json` files
//! - [`types`]: `PackageDescriptor` and release metadata
//! - [`error`]: error types for repository and credential operations

pub mod client;
pub mod credentials;
pub mod error;
pub mod registry;
pub mod types;

pub use client::{Protocol, RepositoryClient};
pub use credentials::{CredentialStore, Credentials};
pub use registry::Repository;
pub use types::PackageDescriptor;
