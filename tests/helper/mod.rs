//! Shared fixtures for end-to-end tests

#![allow(dead_code)]

mod archive;
mod repository;

pub use archive::release_archive;
pub use repository::{PACKAGE, TestRepository, wrapper_folder, write_manifest};
