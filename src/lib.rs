// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod outputs;
pub mod types;

use std::io::Write;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, build_executor, config_root_dir, load_and_validate};
use crate::dag::ExecutionPlan;
use crate::engine::Executor;
use crate::errors::RundagError;

/// High-level entry point used by `main.rs`. Output goes to stdout.
///
/// Returns `Ok(false)` when the run completed but a target failed.
pub async fn run(args: CliArgs) -> Result<bool> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with_output(args, &mut out).await
}

/// Same as [`run`], writing plan, list, graph and summary output to `out`.
///
/// This wires together:
/// - config loading and validation
/// - executor construction (actions, hooks, outputs)
/// - planning for the requested targets
/// - the run itself and its summary
pub async fn run_with_output<W: Write>(args: CliArgs, out: &mut W) -> Result<bool> {
    let config_path = args.config.clone();
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let mut executor = build_executor(&cfg, &config_root_dir(&config_path))?;

    if args.list {
        print_list(&executor, out)?;
        return Ok(true);
    }
    if args.graph {
        writeln!(out, "{}", executor.graph().to_dot())?;
        return Ok(true);
    }

    let roots = requested_targets(&args, &cfg)?;
    let plan = executor.plan_many(&roots)?;
    info!(plan = %plan, "resolved execution plan");

    if args.plan {
        print_plan(&executor, &plan, out)?;
        return Ok(true);
    }

    let report = executor.run(&plan).await?;
    for failure in &report.failures {
        error!(target_name = %failure.target, "{:#}", failure.error);
    }
    writeln!(out, "{report}")?;

    debug!(success = report.success(), "run complete");
    Ok(report.success())
}

/// Targets named on the command line, or the configured default.
fn requested_targets(args: &CliArgs, cfg: &ConfigFile) -> Result<Vec<String>> {
    if !args.targets.is_empty() {
        return Ok(args.targets.clone());
    }
    match &cfg.config.default_target {
        Some(default) => Ok(vec![default.clone()]),
        None => Err(RundagError::ConfigError(
            "no target given and [config].default_target is not set".to_string(),
        )
        .into()),
    }
}

fn print_plan<W: Write>(executor: &Executor, plan: &ExecutionPlan, out: &mut W) -> Result<()> {
    writeln!(out, "execution plan ({} targets):", plan.len())?;
    for (i, name) in plan.iter().enumerate() {
        let action = executor
            .describe_action(name)
            .unwrap_or_else(|| String::from("<no command>"));
        writeln!(out, "  {}. {name}: {action}", i + 1)?;
    }
    Ok(())
}

fn print_list<W: Write>(executor: &Executor, out: &mut W) -> Result<()> {
    let graph = executor.graph();
    writeln!(out, "targets ({}):", graph.len())?;
    for def in graph.targets() {
        match &def.description {
            Some(description) => writeln!(out, "  - {}: {description}", def.name)?,
            None => writeln!(out, "  - {}", def.name)?,
        }
        if !def.deps.is_empty() {
            writeln!(out, "      after: {}", def.deps.join(", "))?;
        }
        if !def.before.is_empty() {
            writeln!(out, "      before: {}", def.before.join(", "))?;
        }
    }
    Ok(())
}
