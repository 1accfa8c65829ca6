// src/errors.rs

//! Crate-wide error types.
//!
//! Three layers, matching how failures propagate:
//! - [`ValidationError`]: the graph definition is wrong; raised before any
//!   task runs and fixed by correcting the definition.
//! - [`EngineError`]: internal-invariant violations inside the scheduler;
//!   these indicate a bug, not a user mistake.
//! - [`DagrunError`]: the application-level umbrella used by the CLI.
//!
//! Task-level failures are *not* errors at this level: they are contained
//! by the executor, retried per policy and surfaced through the run report.

use thiserror::Error;

use crate::graph::TaskName;
use crate::state::TaskStatus;

/// Rejections produced while building a [`Graph`](crate::graph::Graph).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("duplicate task name '{0}'")]
    DuplicateTask(TaskName),

    #[error("task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: TaskName, dependency: TaskName },

    #[error("cycle detected in task graph: {}", .0.join(" -> "))]
    CycleDetected(Vec<TaskName>),
}

/// Fatal scheduler-internal errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("illegal state transition for task '{task}': {from} -> {to}")]
    IllegalTransition {
        task: TaskName,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// Nothing is running, no retry is pending, yet tasks remain `Pending`.
    /// Unreachable for a validated acyclic graph.
    #[error("scheduler stalled with pending tasks: {0:?}")]
    Stalled(Vec<TaskName>),

    #[error("executor event channel closed while tasks were outstanding")]
    ChannelClosed,
}

#[derive(Error, Debug)]
pub enum DagrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DagrunError>;
