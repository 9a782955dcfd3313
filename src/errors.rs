// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::TargetName;

#[derive(Error, Debug)]
pub enum RundagError {
    #[error("Target already registered: {0}")]
    DuplicateTarget(TargetName),

    #[error("Target not found: {0}")]
    UnknownTarget(TargetName),

    #[error("Target '{target}' depends on unknown target '{dependency}'")]
    UnknownDependency {
        target: TargetName,
        dependency: TargetName,
    },

    #[error("Cyclic dependency detected: {0}")]
    CyclicDependency(String),

    #[error("Invalid execution plan: {0}")]
    InvalidPlan(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RundagError>;
