// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `rundag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rundag",
    version,
    about = "Run named build targets in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Targets to run. Defaults to `[config].default_target`.
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Print the execution plan without running anything.
    #[arg(long)]
    pub plan: bool,

    /// List registered targets with their dependencies and descriptions.
    #[arg(long, conflicts_with_all = ["plan", "graph"])]
    pub list: bool,

    /// Print the whole target graph in Graphviz DOT format.
    #[arg(long, conflicts_with = "plan")]
    pub graph: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
