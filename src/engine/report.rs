// src/engine/report.rs

//! Aggregate result of one run.

use std::fmt;
use std::time::Duration;

use crate::engine::{HookFailure, TargetFailure, TargetOutcome};
use crate::types::{TargetName, TargetState};

#[derive(Debug, Default)]
pub struct RunReport {
    /// One entry per planned target, in plan order.
    pub outcomes: Vec<TargetOutcome>,
    /// Captured action errors, in the order targets failed.
    pub failures: Vec<TargetFailure>,
    pub hook_failures: Vec<HookFailure>,
}

impl RunReport {
    /// `true` when no target failed. Skips only ever follow a failure, and
    /// hook failures do not count.
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn succeeded(&self) -> Vec<TargetName> {
        self.names_in(TargetState::Succeeded)
    }

    pub fn failed(&self) -> Vec<TargetName> {
        self.names_in(TargetState::Failed)
    }

    pub fn skipped(&self) -> Vec<TargetName> {
        self.names_in(TargetState::Skipped)
    }

    pub fn outcome(&self, name: &str) -> Option<&TargetOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    pub fn state_of(&self, name: &str) -> Option<TargetState> {
        self.outcome(name).map(|o| o.state)
    }

    pub fn total_duration(&self) -> Duration {
        self.outcomes.iter().filter_map(|o| o.duration).sum()
    }

    fn names_in(&self, state: TargetState) -> Vec<TargetName> {
        self.outcomes
            .iter()
            .filter(|o| o.state == state)
            .map(|o| o.name.clone())
            .collect()
    }
}

fn format_duration(d: Option<Duration>) -> String {
    match d {
        Some(d) => {
            let secs = d.as_secs();
            format!("{}:{:02}.{:03}", secs / 60, secs % 60, d.subsec_millis())
        }
        None => String::from("-"),
    }
}

fn status_title(state: TargetState) -> &'static str {
    match state {
        TargetState::Pending => "Pending",
        TargetState::Running => "Running",
        TargetState::Succeeded => "Succeeded",
        TargetState::Failed => "Failed",
        TargetState::Skipped => "Skipped",
    }
}

/// End-of-run summary table.
impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .outcomes
            .iter()
            .map(|o| o.name.len())
            .chain(std::iter::once("Target".len()))
            .max()
            .unwrap_or(0)
            + 2;
        let rule = "-".repeat(width + 24);

        writeln!(f, "{rule}")?;
        writeln!(f, "{:<width$}{:<12}{:>12}", "Target", "Status", "Duration")?;
        writeln!(f, "{rule}")?;
        for o in &self.outcomes {
            writeln!(
                f,
                "{:<width$}{:<12}{:>12}",
                o.name,
                status_title(o.state),
                format_duration(o.duration)
            )?;
        }
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "{:<width$}{:<12}{:>12}",
            "Total",
            "",
            format_duration(Some(self.total_duration()))
        )?;
        writeln!(f, "{rule}")?;

        if self.success() {
            write!(f, "Build succeeded")
        } else {
            write!(f, "Build failed: {}", self.failed().join(", "))
        }
    }
}
