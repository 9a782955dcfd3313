use std::fmt;

/// Canonical target name type used throughout the crate.
pub type TargetName = String;

/// Completion state of a target within a single run.
///
/// Legal transitions:
///
/// - `Pending -> Running -> Succeeded | Failed`
/// - `Pending -> Skipped` (a dependency failed or was skipped)
///
/// `Succeeded`, `Failed` and `Skipped` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl TargetState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TargetState::Succeeded | TargetState::Failed | TargetState::Skipped
        )
    }

    pub fn can_transition_to(self, next: TargetState) -> bool {
        matches!(
            (self, next),
            (TargetState::Pending, TargetState::Running)
                | (TargetState::Pending, TargetState::Skipped)
                | (TargetState::Running, TargetState::Succeeded)
                | (TargetState::Running, TargetState::Failed)
        )
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TargetState::Pending => "pending",
            TargetState::Running => "running",
            TargetState::Succeeded => "succeeded",
            TargetState::Failed => "failed",
            TargetState::Skipped => "skipped",
        };
        f.write_str(s)
    }
}
