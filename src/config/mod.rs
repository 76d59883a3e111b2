// src/config/mod.rs

//! Configuration loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the built-in path table (`model.rs`).
//! - Load a config file from disk, or fall back to defaults (`loader.rs`).
//! - Validate globs and value ranges (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, ImagesSection, PackageSection, PathEntry, PathEntryConfig, PathTable,
    PathsSection, RawConfigFile, RunSection, ScriptsSection, ServerSection, StylesSection,
    WatchSection,
};
