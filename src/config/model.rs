// src/config/model.rs

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;

/// Configuration exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [config]
/// default_target = "Test"
///
/// [env]
/// CONFIGURATION = "Debug"
///
/// [target.Restore]
/// cmd = "dotnet restore"
///
/// [target.Compile]
/// cmd = "dotnet build --no-restore"
/// after = ["Restore"]
/// ```
///
/// Targets keep document order; that order is the registration order used
/// to break ties when planning.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Environment applied to every shell command.
    #[serde(default)]
    pub env: IndexMap<String, String>,

    #[serde(default)]
    pub target: IndexMap<String, TargetConfig>,
}

/// A configuration that passed validation. Only obtainable through
/// `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub env: IndexMap<String, String>,
    pub target: IndexMap<String, TargetConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        env: IndexMap<String, String>,
        target: IndexMap<String, TargetConfig>,
    ) -> Self {
        Self {
            config,
            env,
            target,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Target run when none is given on the command line.
    #[serde(default)]
    pub default_target: Option<String>,

    /// Base directory for commands and `produces` patterns, relative to the
    /// config file. Defaults to the config file's directory.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// `[target.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Shell command. Targets without one only group their dependencies.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Targets that must succeed before this one runs.
    #[serde(default)]
    pub after: Vec<String>,

    /// Targets this one must be ordered before when both are planned.
    /// Does not pull them into a plan.
    #[serde(default)]
    pub before: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Working directory, relative to the base working directory.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Merged over the global `[env]`.
    #[serde(default)]
    pub env: IndexMap<String, String>,

    /// Glob patterns (relative to the base working directory) for the files
    /// this target produces.
    #[serde(default)]
    pub produces: Vec<String>,

    #[serde(default)]
    pub on_success: Option<String>,

    #[serde(default)]
    pub on_failure: Option<String>,
}
