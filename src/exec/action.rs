// src/exec/action.rs

//! The work a target performs.
//!
//! The executor never looks inside an action: it awaits it and treats `Ok`
//! as success and `Err` as a failure of that one target.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

/// Boxed future returned by [`Action::run`].
pub type ActionFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Trait abstracting what a target does when it runs.
///
/// Production targets use [`crate::exec::ShellAction`]; tests and embedders
/// can pass closures through [`FnAction`].
pub trait Action: Send {
    fn run(&mut self) -> ActionFuture<'_>;

    /// Short human-readable description for plan and list output.
    fn describe(&self) -> String {
        String::from("<action>")
    }
}

/// Adapts a synchronous closure into an [`Action`].
pub struct FnAction<F> {
    f: F,
}

impl<F> FnAction<F>
where
    F: FnMut() -> Result<()> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnAction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction").finish_non_exhaustive()
    }
}

impl<F> Action for FnAction<F>
where
    F: FnMut() -> Result<()> + Send,
{
    fn run(&mut self) -> ActionFuture<'_> {
        let result = (self.f)();
        Box::pin(async move { result })
    }

    fn describe(&self) -> String {
        String::from("<closure>")
    }
}

/// Action for aggregation targets that only exist to group dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAction;

impl Action for NoopAction {
    fn run(&mut self) -> ActionFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    fn describe(&self) -> String {
        String::from("<no command>")
    }
}
