// src/config/mod.rs

//! Configuration loading and validation for rundag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate references, cycles and the default target (`validate.rs`).
//! - Build an executor from a validated config (`build.rs`).

pub mod build;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::{build_executor, working_dir};
pub use loader::{config_root_dir, default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, TargetConfig};
