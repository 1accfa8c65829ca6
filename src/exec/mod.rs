// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`action`] defines the [`TaskAction`] contract: an opaque, side-effecting
//!   operation invoked with a fresh [`ExecutionContext`] per attempt.
//! - [`executor`] provides the [`Executor`] trait the scheduler dispatches
//!   through, and [`ActionExecutor`], the production implementation that
//!   enforces timeouts, contains panics and observes cancellation.
//! - [`shell`] is a ready-made action that runs a shell command via
//!   `tokio::process::Command`, used by the CLI glue.
//!
//! The executor performs no retries; retry policy is scheduler-owned so that
//! backoff and attempt counting stay centrally observable.

pub mod action;
pub mod executor;
pub mod shell;

pub use action::{action_fn, ExecutionContext, TaskAction};
pub use executor::{ActionExecutor, Executor};
pub use shell::ShellAction;

use crate::state::FailureReason;

/// Result of one attempt of a task action, as reported to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(FailureReason),
}
