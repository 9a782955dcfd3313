use std::sync::{Arc, Mutex};

use rundag::exec::{Action, ActionFuture};

/// Shared log of executed target names, in execution order.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str) {
        self.entries.lock().unwrap().push(name.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// An action that records `name` and succeeds.
    pub fn ok(&self, name: &str) -> FakeAction {
        FakeAction::new(self.clone(), name, None)
    }

    /// An action that records `name` and fails with `message`.
    pub fn failing(&self, name: &str, message: &str) -> FakeAction {
        FakeAction::new(self.clone(), name, Some(message.to_string()))
    }
}

/// A fake action that:
/// - records its name in a [`RunLog`] when run
/// - succeeds, or fails with a fixed message.
#[derive(Debug)]
pub struct FakeAction {
    log: RunLog,
    name: String,
    failure: Option<String>,
}

impl FakeAction {
    fn new(log: RunLog, name: &str, failure: Option<String>) -> Self {
        Self {
            log,
            name: name.to_string(),
            failure,
        }
    }
}

impl Action for FakeAction {
    fn run(&mut self) -> ActionFuture<'_> {
        Box::pin(async move {
            self.log.record(&self.name);
            match &self.failure {
                Some(message) => Err(anyhow::anyhow!("{message}")),
                None => Ok(()),
            }
        })
    }

    fn describe(&self) -> String {
        format!("fake {}", self.name)
    }
}
