// src/config/build.rs

//! Turn a validated [`ConfigFile`] into a ready-to-run [`Executor`].

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, TargetConfig};
use crate::config::validate::target_def;
use crate::engine::{Executor, HookTrigger, ShellHook};
use crate::errors::{Result, RundagError};
use crate::exec::{NoopAction, ShellAction};
use crate::outputs::{OutputCollector, OutputPatterns};

/// Base directory for commands and outputs: `[config].working_dir` resolved
/// against the config file's directory.
pub fn working_dir(cfg: &ConfigFile, config_dir: &Path) -> PathBuf {
    match &cfg.config.working_dir {
        Some(dir) => config_dir.join(dir),
        None => config_dir.to_path_buf(),
    }
}

/// Register every configured target, in document order, on a new executor.
///
/// Targets with a `cmd` get a [`ShellAction`]; targets without one get a
/// [`NoopAction`]. `on_success`/`on_failure` become [`ShellHook`]s.
pub fn build_executor(cfg: &ConfigFile, config_dir: &Path) -> Result<Executor> {
    let base = working_dir(cfg, config_dir);
    let mut executor = Executor::new().with_output_collector(OutputCollector::real(&base));

    for (name, target) in cfg.target.iter() {
        let def = target_def(name, target);

        match &target.cmd {
            Some(cmd) => {
                let action = shell_action(cfg, &base, name, target, cmd);
                executor.register_target(def, action)?;
            }
            None => executor.register_target(def, NoopAction)?,
        }

        if let Some(cmd) = &target.on_success {
            let action = shell_action(cfg, &base, name, target, cmd);
            executor.add_hook(name, ShellHook::new(HookTrigger::Success, action))?;
        }
        if let Some(cmd) = &target.on_failure {
            let action = shell_action(cfg, &base, name, target, cmd);
            executor.add_hook(name, ShellHook::new(HookTrigger::Failure, action))?;
        }

        if !target.produces.is_empty() {
            let patterns = OutputPatterns::new(&target.produces).map_err(|e| {
                RundagError::ConfigError(format!("target '{name}' has invalid `produces`: {e:#}"))
            })?;
            executor.set_produces(name, patterns)?;
        }

        debug!(target_name = %name, cmd = ?target.cmd, "registered target from config");
    }

    Ok(executor)
}

fn shell_action(
    cfg: &ConfigFile,
    base: &Path,
    name: &str,
    target: &TargetConfig,
    cmd: &str,
) -> ShellAction {
    let cwd = match &target.cwd {
        Some(dir) => base.join(dir),
        None => base.to_path_buf(),
    };
    ShellAction::new(cmd)
        .with_cwd(cwd)
        .with_env(cfg.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .with_env(target.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .with_label(name)
}
