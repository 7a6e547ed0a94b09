pub mod archive;
pub mod config;
pub mod logging;
pub mod repository;
pub mod state;
pub mod updater;
pub mod version;
