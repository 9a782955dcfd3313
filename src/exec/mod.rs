// src/exec/mod.rs

//! Action layer.
//!
//! - [`action`] defines the [`Action`] trait the executor awaits, plus the
//!   closure adapter and the no-op action for aggregation targets.
//! - [`shell`] runs command lines through the platform shell using
//!   `tokio::process::Command`, forwarding output into the log.

pub mod action;
pub mod shell;

pub use action::{Action, ActionFuture, FnAction, NoopAction};
pub use shell::{CommandFailed, ShellAction};
