// src/engine/mod.rs

//! Target execution engine.
//!
//! This module ties together:
//! - the pure per-run state machine in [`core`], which walks a plan and
//!   decides, target by target, whether to execute or skip
//! - the async [`Executor`] in [`runtime`], which owns the registry, awaits
//!   actions one at a time and fires outcome hooks
//! - outcome hooks ([`hooks`]) and the aggregate [`RunReport`] ([`report`])

use std::path::PathBuf;
use std::time::Duration;

use crate::types::{TargetName, TargetState};

/// Final outcome of one planned target, as seen by hooks and the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    pub name: TargetName,
    /// Always terminal: `Succeeded`, `Failed` or `Skipped`.
    pub state: TargetState,
    /// Wall-clock time spent in the action; `None` for skipped targets.
    pub duration: Option<Duration>,
    /// Rendered action error for failed targets.
    pub error: Option<String>,
    /// The dependency that caused a skip.
    pub blocked_by: Option<TargetName>,
    /// Files matched by the target's `produces` patterns after it succeeded.
    pub outputs: Vec<PathBuf>,
}

impl TargetOutcome {
    pub(crate) fn skipped(name: TargetName, blocked_by: TargetName) -> Self {
        Self {
            name,
            state: TargetState::Skipped,
            duration: None,
            error: None,
            blocked_by: Some(blocked_by),
            outputs: Vec::new(),
        }
    }

    pub(crate) fn finished(name: TargetName, state: TargetState, duration: Duration) -> Self {
        Self {
            name,
            state,
            duration: Some(duration),
            error: None,
            blocked_by: None,
            outputs: Vec::new(),
        }
    }
}

/// An action failure, with the original error kept for the caller.
#[derive(Debug)]
pub struct TargetFailure {
    pub target: TargetName,
    pub error: anyhow::Error,
}

/// A hook that returned an error. Never affects the target or the run.
#[derive(Debug)]
pub struct HookFailure {
    pub target: TargetName,
    pub error: anyhow::Error,
}

pub mod core;
pub mod hooks;
pub mod report;
pub mod runtime;

pub use self::core::{CoreRun, CoreStep};
pub use hooks::{FnHook, HookTrigger, OutcomeHook, ShellHook};
pub use report::RunReport;
pub use runtime::Executor;
