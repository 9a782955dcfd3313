// src/exec/shell.rs

//! Shell command actions.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::exec::action::{Action, ActionFuture};

/// A command that ran to completion but did not exit successfully.
///
/// `code` is `None` when the process was terminated by a signal.
#[derive(Debug, Error)]
#[error("command `{cmd}` exited with {}", describe_code(.code))]
pub struct CommandFailed {
    pub cmd: String,
    pub code: Option<i32>,
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => String::from("no status (terminated by signal)"),
    }
}

/// Runs a command line through the platform shell.
#[derive(Debug, Clone)]
pub struct ShellAction {
    cmd: String,
    cwd: Option<PathBuf>,
    env: IndexMap<String, String>,
    label: String,
}

impl ShellAction {
    pub fn new(cmd: impl Into<String>) -> Self {
        let cmd = cmd.into();
        Self {
            label: cmd.clone(),
            cmd,
            cwd: None,
            env: IndexMap::new(),
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Add environment variables; later calls override earlier ones.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    /// Name used in log lines (usually the owning target).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    fn command(&self) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn execute(&self) -> Result<()> {
        info!(label = %self.label, cmd = %self.cmd, cwd = ?self.cwd, "starting command");

        let mut child = self
            .command()
            .spawn()
            .with_context(|| format!("spawning `{}`", self.cmd))?;

        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(forward_lines(out, self.label.clone(), "stdout")));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(forward_lines(err, self.label.clone(), "stderr")));

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for `{}`", self.cmd))?;

        // Drain both pipes so all output is logged before the next target starts.
        for reader in [stdout, stderr].into_iter().flatten() {
            if let Err(e) = reader.await {
                debug!(label = %self.label, error = %e, "output reader task ended abnormally");
            }
        }

        info!(
            label = %self.label,
            exit_code = ?status.code(),
            success = status.success(),
            "command exited"
        );

        if status.success() {
            Ok(())
        } else {
            Err(CommandFailed {
                cmd: self.cmd.clone(),
                code: status.code(),
            }
            .into())
        }
    }
}

/// Log child output line by line until EOF.
///
/// Lines are read as raw bytes, so non-UTF-8 output is logged lossily rather
/// than ending the reader. The pipe stays drained to EOF either way; closing
/// it early would kill the child with SIGPIPE on its next write.
async fn forward_lines<R>(reader: R, label: String, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => return,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                info!(label = %label, stream, "{}", line.trim_end_matches(['\r', '\n']));
            }
            Err(e) => {
                debug!(label = %label, stream, error = %e, "failed to read command output; discarding the rest");
                if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                    debug!(label = %label, stream, error = %e, "failed to drain command output");
                }
                return;
            }
        }
    }
}

impl Action for ShellAction {
    fn run(&mut self) -> ActionFuture<'_> {
        Box::pin(self.execute())
    }

    fn describe(&self) -> String {
        self.cmd.clone()
    }
}
