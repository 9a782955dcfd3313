// src/dag/mod.rs

//! Target graph, planning and per-run state.
//!
//! - [`graph`] holds the registry of target shapes in registration order.
//! - [`plan`] turns requested roots into a stable, dependency-respecting
//!   [`ExecutionPlan`].
//! - [`state`] tracks per-run completion state of planned targets.

pub mod graph;
pub mod plan;
pub mod state;

pub use graph::{TargetDef, TargetGraph};
pub use plan::ExecutionPlan;
pub use state::StateTable;
