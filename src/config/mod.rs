// src/config/mod.rs

//! Configuration loading and validation.
//!
//! The config file (`Assetwatch.toml`) describes the source and output roots,
//! the debounce window, and one section per asset category. Every section is
//! optional; the defaults reproduce the conventional layout:
//!
//! ```toml
//! [project]
//! source_root = "src"
//! output_root = "dist"
//!
//! [style]
//! patterns = ["sass/**/*.scss"]
//! minify = "aggressive"
//! ```

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    AssetSection, CategoryLayout, ConfigFile, MarkupSection, ProjectSection, RawConfigFile,
    ScriptSection, StyleSection, WatchSection,
};
